//! Panel geometry
//!
//! ```text
//! +--------------------------------------------+
//! |               title band (148)              |
//! | [icon] group title            header (90)   |
//! | [tile] [tile] [tile] ...       row (190)    |
//! |  name   name   name                         |
//! |                               gap (20)      |
//! | ...                                         |
//! |                               bottom (40)   |
//! +--------------------------------------------+
//! ```

use super::panel::Panel;
use super::text::TextRenderer;

pub const MARGIN: u32 = 25;
/// Horizontal space reserved for the group icon before its title
pub const ICON_RESERVE: u32 = 110;
pub const TILE: u32 = 128;
pub const GUTTER: u32 = 17;
pub const TITLE_BAND: u32 = 148;
pub const GROUP_HEADER: u32 = 90;
pub const ROW_HEIGHT: u32 = 190;
pub const GROUP_GAP: u32 = 20;
pub const BOTTOM_PAD: u32 = 40;

/// Offset of the label band below a tile's top edge, and its height
pub const LABEL_TOP: u32 = 130;
pub const LABEL_BAND: u32 = 40;

pub const GROUP_ICON: u32 = 70;
pub const TITLE_PX: f32 = 50.0;
pub const GROUP_TITLE_PX: f32 = 36.0;

/// Label size: short names get the larger font.
pub fn label_px(label: &str) -> f32 {
    if label.chars().count() <= 4 {
        30.0
    } else {
        24.0
    }
}

/// Tiles per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelLayout {
    Daily,
    Weekly,
}

impl PanelLayout {
    pub fn capacity(self) -> usize {
        match self {
            PanelLayout::Daily => 7,
            PanelLayout::Weekly => 6,
        }
    }

    pub fn rows(self, tiles: usize) -> u32 {
        tiles.div_ceil(self.capacity()) as u32
    }
}

/// Canvas size of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub width: u32,
    pub height: u32,
}

/// Measure a panel. `banner_width` is the width of the header banner when
/// one is drawn; the title text is not measured in that case.
pub fn measure(panel: &Panel, text: &TextRenderer, banner_width: Option<u32>) -> Metrics {
    let capacity = panel.layout.capacity();

    let title = match banner_width {
        Some(_) => 0,
        None => text.width(TITLE_PX, &panel.header.title),
    };
    let widest_label = panel
        .groups
        .iter()
        .map(|g| text.width(GROUP_TITLE_PX, &g.title) + ICON_RESERVE)
        .max()
        .unwrap_or(0);
    let widest_row = panel
        .groups
        .iter()
        .map(|g| g.tiles.len().min(capacity) as u32)
        .max()
        .unwrap_or(0);
    let row_width = (widest_row * (TILE + GUTTER)).saturating_sub(GUTTER);

    let content = title.max(widest_label).max(row_width);
    let width = (2 * MARGIN + content).max(banner_width.unwrap_or(0));

    let groups: u32 = panel
        .groups
        .iter()
        .map(|g| GROUP_HEADER + panel.layout.rows(g.tiles.len()) * ROW_HEIGHT + GROUP_GAP)
        .sum();
    let height = TITLE_BAND + groups + BOTTOM_PAD;

    Metrics { width, height }
}

/// Top-left corner of tile `index` relative to the first row of its group.
pub fn tile_origin(layout: PanelLayout, index: usize) -> (u32, u32) {
    let capacity = layout.capacity();
    let col = (index % capacity) as u32;
    let row = (index / capacity) as u32;
    (MARGIN + col * (TILE + GUTTER), row * ROW_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::panel::{PanelHeader, Tile, TileGroup};
    use crate::models::Rank;

    fn panel(layout: PanelLayout, sizes: &[usize]) -> Panel {
        Panel {
            header: PanelHeader { title: "今日天赋培养材料".to_string(), banner: None },
            layout,
            groups: sizes
                .iter()
                .map(|n| TileGroup {
                    title: "「自由」的哲学".to_string(),
                    rank: Rank::Four,
                    icon: None,
                    tiles: (0..*n)
                        .map(|i| Tile { label: format!("角色{}", i), rank: Rank::Five, icon: None })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_full_daily_row_width() {
        let metrics = measure(&panel(PanelLayout::Daily, &[9]), &TextRenderer::without_font(), None);
        // 7 tiles per row: 7 * 145 - 17 + 50
        assert_eq!(metrics.width, 1048);
        // Two rows
        assert_eq!(metrics.height, 148 + 90 + 2 * 190 + 20 + 40);
    }

    #[test]
    fn test_weekly_capacity() {
        let metrics = measure(&panel(PanelLayout::Weekly, &[7, 1]), &TextRenderer::without_font(), None);
        assert_eq!(metrics.width, 2 * 25 + 6 * 145 - 17);
        assert_eq!(metrics.height, 148 + (90 + 2 * 190 + 20) + (90 + 190 + 20) + 40);
    }

    #[test]
    fn test_title_can_set_width() {
        let mut p = panel(PanelLayout::Weekly, &[1]);
        p.header.title = "非常非常非常非常长的标题文字".to_string();
        let metrics = measure(&p, &TextRenderer::without_font(), None);
        // 14 full-width chars at 50px
        assert_eq!(metrics.width, 2 * 25 + 14 * 50);
    }

    #[test]
    fn test_group_label_can_set_width() {
        let p = panel(PanelLayout::Weekly, &[1]);
        let metrics = measure(&p, &TextRenderer::without_font(), Some(100));
        // 「自由」的哲学: 7 chars at 36px plus the icon reserve
        assert_eq!(metrics.width, 2 * 25 + 7 * 36 + 110);
    }

    #[test]
    fn test_banner_is_minimum_width() {
        let p = panel(PanelLayout::Daily, &[1]);
        let metrics = measure(&p, &TextRenderer::without_font(), Some(1048));
        assert_eq!(metrics.width, 1048);
    }

    #[test]
    fn test_tile_origin_wraps() {
        assert_eq!(tile_origin(PanelLayout::Daily, 0), (25, 0));
        assert_eq!(tile_origin(PanelLayout::Daily, 7), (25, 190));
        assert_eq!(tile_origin(PanelLayout::Weekly, 6), (25, 190));
        assert_eq!(tile_origin(PanelLayout::Daily, 2), (25 + 2 * 145, 0));
    }

    #[test]
    fn test_label_px() {
        assert_eq!(label_px("神里绫华"), 30.0);
        assert_eq!(label_px("枫原万叶·x"), 24.0);
    }
}
