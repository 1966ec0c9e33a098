pub mod collapsed;
pub mod pprof;

use crate::model::Profile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("collapsed: {0}")]
    Collapsed(#[from] collapsed::CollapsedParseError),
    #[error("pprof: {0}")]
    Pprof(#[from] pprof::PprofParseError),
    #[error("unable to detect format")]
    UnknownFormat,
}

/// Auto-detect the profile format and parse it.
///
/// Detection strategy:
/// 1. JSON objects carrying a `stringTable` or `sampleType` are pprof.
/// 2. Anything else is tried as collapsed stacks.
pub fn parse_auto(data: &[u8]) -> Result<Profile, ParseError> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        if let Some(obj) = value.as_object()
            && (obj.contains_key("stringTable") || obj.contains_key("sampleType"))
        {
            return Ok(pprof::parse_pprof(data)?);
        }
        return Err(ParseError::UnknownFormat);
    }

    // Collapsed stacks accept almost any text, so they go last.
    match collapsed::parse_collapsed(data) {
        Ok(profile) => Ok(profile),
        // looked like folded stacks but a count was bad
        Err(e @ collapsed::CollapsedParseError::InvalidCount { .. }) => Err(e.into()),
        Err(_) => Err(ParseError::UnknownFormat),
    }
}
