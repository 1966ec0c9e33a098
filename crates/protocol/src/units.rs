use serde::{Deserialize, Serialize};

/// What the numerical values of a series represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueUnit {
    /// Wall-clock or CPU time in nanoseconds.
    Nanoseconds,
    /// Time in microseconds.
    Microseconds,
    /// Time in milliseconds.
    Milliseconds,
    /// Sample or event count.
    Samples,
    /// Memory in bytes.
    Bytes,
    /// Anything else.
    Weight,
}

impl ValueUnit {
    /// Map a pprof unit name onto a known unit.
    pub fn from_unit_name(unit: &str) -> Self {
        match unit {
            "nanoseconds" | "ns" => Self::Nanoseconds,
            "microseconds" | "us" => Self::Microseconds,
            "milliseconds" | "ms" => Self::Milliseconds,
            "count" | "samples" => Self::Samples,
            "bytes" => Self::Bytes,
            _ => Self::Weight,
        }
    }

    /// Format a value in this unit for display.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Self::Microseconds => {
                if value >= 1_000_000.0 {
                    format!("{:.2}s", value / 1_000_000.0)
                } else if value >= 1_000.0 {
                    format!("{:.1}ms", value / 1_000.0)
                } else {
                    format!("{:.0}µs", value)
                }
            }
            Self::Milliseconds => {
                if value >= 1_000.0 {
                    format!("{:.2}s", value / 1_000.0)
                } else {
                    format!("{:.1}ms", value)
                }
            }
            Self::Nanoseconds => {
                if value >= 1_000_000_000.0 {
                    format!("{:.2}s", value / 1_000_000_000.0)
                } else if value >= 1_000_000.0 {
                    format!("{:.1}ms", value / 1_000_000.0)
                } else if value >= 1_000.0 {
                    format!("{:.0}µs", value / 1_000.0)
                } else {
                    format!("{:.0}ns", value)
                }
            }
            Self::Samples => format!("{} samples", value as i64),
            Self::Bytes => {
                if value >= 1_073_741_824.0 {
                    format!("{:.1} GiB", value / 1_073_741_824.0)
                } else if value >= 1_048_576.0 {
                    format!("{:.1} MiB", value / 1_048_576.0)
                } else if value >= 1_024.0 {
                    format!("{:.1} KiB", value / 1_024.0)
                } else {
                    format!("{} B", value as i64)
                }
            }
            Self::Weight => format!("{:.0}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_pprof_unit_names() {
        assert_eq!(ValueUnit::from_unit_name("nanoseconds"), ValueUnit::Nanoseconds);
        assert_eq!(ValueUnit::from_unit_name("count"), ValueUnit::Samples);
        assert_eq!(ValueUnit::from_unit_name("bytes"), ValueUnit::Bytes);
        assert_eq!(ValueUnit::from_unit_name("widgets"), ValueUnit::Weight);
    }

    #[test]
    fn formats_values() {
        assert_eq!(ValueUnit::Nanoseconds.format_value(2_500_000_000.0), "2.50s");
        assert_eq!(ValueUnit::Nanoseconds.format_value(1_500_000.0), "1.5ms");
        assert_eq!(ValueUnit::Samples.format_value(13.0), "13 samples");
        assert_eq!(ValueUnit::Bytes.format_value(2048.0), "2.0 KiB");
        assert_eq!(ValueUnit::Weight.format_value(7.0), "7");
    }
}
