//! Panel description handed to the compositor

use std::path::PathBuf;

use crate::models::Rank;

use super::layout::PanelLayout;

/// One character or weapon tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub label: String,
    pub rank: Rank,
    pub icon: Option<PathBuf>,
}

/// Tiles sharing one material, drawn under a header with the material icon.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGroup {
    pub title: String,
    /// Background tint of the header icon
    pub rank: Rank,
    pub icon: Option<PathBuf>,
    pub tiles: Vec<Tile>,
}

/// Top band of a panel: a banner image when available, else a text title.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelHeader {
    pub title: String,
    pub banner: Option<PathBuf>,
}

/// Everything needed to draw one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub header: PanelHeader,
    pub layout: PanelLayout,
    pub groups: Vec<TileGroup>,
}

impl Panel {
    pub fn tile_count(&self) -> usize {
        self.groups.iter().map(|g| g.tiles.len()).sum()
    }
}
