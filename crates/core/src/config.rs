use serde::{Deserialize, Serialize};

/// Rendering settings handed to [`crate::render_flamegraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlameConfig {
    /// Series used when a request names none (or names an unknown one).
    pub sample_index: Option<String>,
    /// Path the page is served under.
    pub base_url: String,
    /// Overrides the title derived from the profile's main mapping.
    pub title: Option<String>,
    /// Width of the static SVG rendering in pixels.
    pub width: f64,
    /// Height of one frame row in pixels.
    pub cell_height: f64,
    pub dark: bool,
}

impl Default for FlameConfig {
    fn default() -> Self {
        Self {
            sample_index: None,
            base_url: "/flamegraph".to_string(),
            title: None,
            width: 1200.0,
            cell_height: 18.0,
            dark: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: FlameConfig = serde_json::from_str(r#"{"sample_index":"alloc"}"#).unwrap();
        assert_eq!(config.sample_index.as_deref(), Some("alloc"));
        assert_eq!(config.base_url, "/flamegraph");
        assert_eq!(config.cell_height, 18.0);
    }
}
