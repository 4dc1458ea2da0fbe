//! Layout compositor - turns material panels into raster images

mod blend;
mod error;
pub mod layout;
mod panel;
mod render;
mod text;
mod tile;

// Re-export public API
pub use error::ComposeError;
pub use layout::{measure, Metrics, PanelLayout};
pub use panel::{Panel, PanelHeader, Tile, TileGroup};
pub use render::{compose_all, concat_horizontal, Compose, Compositor, BACKGROUND, PANEL_GAP};
pub use text::TextRenderer;
pub use tile::{rank_color, rounded_mask};
