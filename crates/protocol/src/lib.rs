pub mod commands;
pub mod flame;
pub mod page;
pub mod theme;
pub mod types;
pub mod units;

pub use commands::{RenderCommand, TextAlign};
pub use flame::FlameNode;
pub use page::PageMeta;
pub use theme::ThemeToken;
pub use types::{Point, Rect, Viewport};
pub use units::ValueUnit;
