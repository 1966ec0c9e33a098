use std::path::Path;

use chrono::{DateTime, Utc};

use crate::model::Profile;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Human-readable description of the profile and the selected series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Legend {
    pub file: String,
    pub sample_type: String,
    pub unit: String,
    pub time: String,
    pub duration: String,
}

impl Legend {
    pub fn from_profile(profile: &Profile, series: usize) -> Self {
        let (sample_type, unit) = profile
            .sample_types
            .get(series)
            .map(|t| (t.ty.clone(), t.unit.clone()))
            .unwrap_or_else(|| ("unknown".to_string(), "unknown".to_string()));
        Self {
            file: file_name(profile),
            sample_type,
            unit: display_unit(&unit).to_string(),
            time: format_time(profile.time_nanos),
            duration: format_duration(profile.duration_nanos),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("File: {}", self.file),
            format!("Type: {}", self.sample_type),
            format!("Unit: {}", self.unit),
            format!("Time: {}", self.time),
            format!("Duration: {}", self.duration),
        ]
    }
}

/// Base name of the main mapping's file, or `"unknown"`.
pub fn file_name(profile: &Profile) -> String {
    profile
        .main_file()
        .and_then(|f| Path::new(f).file_name())
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Unit label shown to readers; nanosecond series are displayed in seconds.
pub fn display_unit(unit: &str) -> &str {
    if unit == "nanoseconds" { "seconds" } else { unit }
}

/// `Jan 2, 2006 at 3:04pm (UTC)` style timestamp.
pub fn format_time(time_nanos: i64) -> String {
    let time = DateTime::<Utc>::from_timestamp_nanos(time_nanos);
    time.format("%b %-d, %Y at %-I:%M%P (UTC)").to_string()
}

/// Whole nanoseconds up to one second, fractional seconds above.
pub fn format_duration(duration_nanos: i64) -> String {
    if duration_nanos > NANOS_PER_SECOND {
        format!("{:.6} s", duration_nanos as f64 / NANOS_PER_SECOND as f64)
    } else {
        format!("{duration_nanos} ns")
    }
}
