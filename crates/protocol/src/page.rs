use serde::{Deserialize, Serialize};

/// Descriptive fields rendered around the flame graph.
///
/// None of these are computed from the call tree; they are assembled from
/// the decoded profile and forwarded to the page unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Page title, usually the profiled binary's file name.
    pub title: String,
    /// Path the page is served under; series links are built from it.
    pub base_url: String,
    /// Human-readable legend lines ("File: ...", "Type: ...", ...).
    pub legend: Vec<String>,
    /// Raw unit of the selected series (e.g. "nanoseconds").
    pub unit: String,
    /// Name of the selected series.
    pub sample_type: String,
    /// Names of every series in the profile, in declaration order.
    pub sample_types: Vec<String>,
    /// Non-fatal problems collected while building the page.
    #[serde(default)]
    pub errors: Vec<String>,
}
