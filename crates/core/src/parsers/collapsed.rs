use thiserror::Error;

use crate::model::{Profile, ProfileBuilder, ValueType};

#[derive(Debug, Error)]
pub enum CollapsedParseError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("line {line}: invalid sample count {count:?}")]
    InvalidCount { line: usize, count: String },
    #[error("no valid stack lines found")]
    Empty,
}

/// Parse Brendan Gregg's collapsed/folded stack format.
///
/// Each line has the format: `stack_frame;stack_frame;... count`
/// where frames are separated by `;`, listed root first, and the count is
/// the last whitespace-separated token, which must be an integer. The
/// result has a single `samples`/`count` series.
///
/// Used by: `perf script | stackcollapse-perf.pl`, dtrace, FlameGraph tools.
pub fn parse_collapsed(data: &[u8]) -> Result<Profile, CollapsedParseError> {
    let text = std::str::from_utf8(data)?;
    let mut builder = ProfileBuilder::new(vec![ValueType::new("samples", "count")]);
    let mut lines = 0usize;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Split into stack and count: "a;b;c 42"
        let Some(pos) = line.rfind(char::is_whitespace) else {
            continue;
        };
        let raw_count = line[pos + 1..].trim();
        let count: i64 = raw_count
            .parse()
            .map_err(|_| CollapsedParseError::InvalidCount {
                line: index + 1,
                count: raw_count.to_string(),
            })?;
        let stack_str = line[..pos].trim();
        if stack_str.is_empty() {
            continue;
        }

        let frames: Vec<&str> = stack_str
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        builder.stack(&frames, vec![count]);
        lines += 1;
    }

    if lines == 0 {
        return Err(CollapsedParseError::Empty);
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CallTree;

    #[test]
    fn parse_basic_collapsed() {
        let input = b"main;foo;bar 10\nmain;foo;baz 20\nmain;qux 5\n";
        let profile = parse_collapsed(input).unwrap();
        assert_eq!(profile.sample_types, vec![ValueType::new("samples", "count")]);
        assert_eq!(profile.samples.len(), 3);
        assert_eq!(
            profile.stack_names(&profile.samples[0]),
            vec!["main", "foo", "bar"]
        );

        let tree = CallTree::from_profile(&profile, 0);
        assert_eq!(tree.total(), 35);
        assert_eq!(tree.find_path(&["main", "foo"]).unwrap().value, 30);
    }

    #[test]
    fn skips_comments_and_empty_lines() {
        let input = b"# comment\n\nmain;foo 5\n";
        let profile = parse_collapsed(input).unwrap();
        assert_eq!(profile.samples.len(), 1);
        assert_eq!(profile.stack_names(&profile.samples[0]), vec!["main", "foo"]);
    }

    #[test]
    fn frames_may_contain_spaces() {
        let input = b"main;std::vec::Vec<T>::push (inlined) 4\n";
        let profile = parse_collapsed(input).unwrap();
        assert_eq!(
            profile.stack_names(&profile.samples[0]),
            vec!["main", "std::vec::Vec<T>::push (inlined)"]
        );
        assert_eq!(profile.samples[0].values, vec![4]);
    }

    #[test]
    fn malformed_counts_are_rejected() {
        let input = b"main;foo 3\nmain;foo 12abc\n";
        assert!(matches!(
            parse_collapsed(input),
            Err(CollapsedParseError::InvalidCount { line: 2, ref count }) if count == "12abc"
        ));

        let overflow = b"main 99999999999999999999\n";
        assert!(matches!(
            parse_collapsed(overflow),
            Err(CollapsedParseError::InvalidCount { line: 1, .. })
        ));
    }

    #[test]
    fn empty_input_errors() {
        let result = parse_collapsed(b"");
        assert!(result.is_err());
    }
}
