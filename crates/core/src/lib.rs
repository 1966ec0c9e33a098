//! Flame graph rendering for sampled profiles.
//!
//! ```text
//!   pprof JSON ─┐                      ┌─▶ JSON payload ─┐
//!   collapsed  ─┴─▶ Profile ─▶ CallTree ┤                 ├─▶ FlamePage (HTML)
//!                                       └─▶ layout ─▶ SVG ┘
//! ```

pub mod config;
pub mod legend;
pub mod model;
pub mod page;
pub mod parsers;
pub mod serialize;
pub mod series;
pub mod svg;
pub mod views;

pub use config::FlameConfig;
pub use model::{CallTree, Profile};
pub use page::{FlamePage, RenderError, render_flamegraph};
pub use serialize::SerializationError;
