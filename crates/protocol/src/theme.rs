use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    FlameHot,
    FlameWarm,
    FlameCold,
    FlameNeutral,

    TextPrimary,
    TextSecondary,

    Background,
    Border,
}

impl ThemeToken {
    /// Flame palette entry for a given call depth.
    pub fn flame_for_depth(depth: usize) -> Self {
        match depth % 4 {
            0 => Self::FlameHot,
            1 => Self::FlameWarm,
            2 => Self::FlameCold,
            _ => Self::FlameNeutral,
        }
    }
}
