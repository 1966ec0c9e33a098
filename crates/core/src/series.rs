use tracing::debug;

use crate::config::FlameConfig;
use crate::model::Profile;

/// Pick the series to visualize.
///
/// A non-empty requested name decides on its own: it selects its series
/// when it resolves and the first declared series when it does not. Only
/// without a request is the configured default tried, again falling back
/// to the first series. Unknown names never cause an error.
pub fn select_series(profile: &Profile, requested: Option<&str>, config: &FlameConfig) -> usize {
    let (source, name) = match requested.filter(|n| !n.is_empty()) {
        Some(name) => ("request", name),
        None => match config.sample_index.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => ("config", name),
            None => return 0,
        },
    };
    profile.sample_index_by_name(name).unwrap_or_else(|| {
        debug!(name, source, "unknown sample type, using first series");
        0
    })
}
