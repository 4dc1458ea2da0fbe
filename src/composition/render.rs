//! Panel rendering and horizontal joining

use image::{imageops, GrayImage, Rgba, RgbaImage};
use rayon::prelude::*;
use std::path::Path;

use super::blend::blit;
use super::error::ComposeError;
use super::layout::{
    label_px, measure, tile_origin, GROUP_GAP, GROUP_HEADER, GROUP_ICON, GROUP_TITLE_PX,
    ICON_RESERVE, LABEL_BAND, LABEL_TOP, MARGIN, ROW_HEIGHT, TILE, TITLE_BAND, TITLE_PX,
};
use super::panel::Panel;
use super::text::TextRenderer;
use super::tile::{rank_color, render_tile, rounded_mask, GROUP_ICON_RADIUS, TILE_RADIUS, TILE_SOURCE};

/// Canvas background.
pub const BACKGROUND: Rgba<u8> = Rgba([0xFB, 0xFB, 0xFB, 0xFF]);
/// Gap between joined panels.
pub const PANEL_GAP: u32 = 25;
/// Largest canvas side the compositor will allocate.
pub const MAX_SIDE: u32 = 16_384;

const TITLE_COLOR: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);
const LABEL_COLOR: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 0xFF]);

/// Turns a panel into pixels.
pub trait Compose: Send + Sync {
    fn compose(&self, panel: &Panel) -> Result<RgbaImage, ComposeError>;
}

/// The production compositor.
pub struct Compositor {
    text: TextRenderer,
    tile_mask: GrayImage,
    group_mask: GrayImage,
}

impl Compositor {
    pub fn new(text: TextRenderer) -> Self {
        Self {
            text,
            tile_mask: rounded_mask(TILE_SOURCE, TILE_RADIUS),
            group_mask: rounded_mask(TILE_SOURCE, GROUP_ICON_RADIUS),
        }
    }

    /// Compositor using the font file at `font_path`, if loadable.
    pub fn with_font_file(font_path: &Path) -> Self {
        Self::new(TextRenderer::load(font_path))
    }

    fn draw_header(&self, canvas: &mut RgbaImage, panel: &Panel, banner: Option<&RgbaImage>) {
        match banner {
            Some(banner) => {
                let height = banner.height().min(TITLE_BAND);
                let band = imageops::crop_imm(banner, 0, 0, banner.width(), height).to_image();
                blit(canvas, &band, 0, 0);
            }
            None => {
                let width = canvas.width();
                self.text.draw_centered(
                    canvas,
                    TITLE_PX,
                    0,
                    0,
                    width,
                    TITLE_BAND,
                    TITLE_COLOR,
                    &panel.header.title,
                );
            }
        }
    }
}

impl Compose for Compositor {
    fn compose(&self, panel: &Panel) -> Result<RgbaImage, ComposeError> {
        let banner = panel.header.banner.as_deref().and_then(load_icon);
        let metrics = measure(panel, &self.text, banner.as_ref().map(|b| b.width()));
        if metrics.width > MAX_SIDE || metrics.height > MAX_SIDE {
            return Err(ComposeError::TooLarge {
                width: metrics.width,
                height: metrics.height,
                max: MAX_SIDE,
            });
        }

        let mut canvas = RgbaImage::from_pixel(metrics.width, metrics.height, BACKGROUND);
        self.draw_header(&mut canvas, panel, banner.as_ref());

        let mut y = TITLE_BAND;
        for group in &panel.groups {
            let icon = group.icon.as_deref().and_then(load_icon);
            let header = render_tile(icon.as_ref(), rank_color(group.rank), &self.group_mask, GROUP_ICON);
            blit(&mut canvas, &header, MARGIN, y);
            let title_y = y as i32 + (GROUP_ICON as i32 - self.text.line_height(GROUP_TITLE_PX) as i32) / 2;
            self.text.draw(&mut canvas, GROUP_TITLE_PX, ICON_RESERVE as i32, title_y, LABEL_COLOR, &group.title);
            y += GROUP_HEADER;

            for (index, tile) in group.tiles.iter().enumerate() {
                let (tx, dy) = tile_origin(panel.layout, index);
                let ty = y + dy;
                let icon = tile.icon.as_deref().and_then(load_icon);
                let image = render_tile(icon.as_ref(), rank_color(tile.rank), &self.tile_mask, TILE);
                blit(&mut canvas, &image, tx, ty);
                self.text.draw_centered(
                    &mut canvas,
                    label_px(&tile.label),
                    tx as i32,
                    (ty + LABEL_TOP) as i32,
                    TILE,
                    LABEL_BAND,
                    LABEL_COLOR,
                    &tile.label,
                );
            }
            y += panel.layout.rows(group.tiles.len()) * ROW_HEIGHT + GROUP_GAP;
        }

        tracing::debug!(
            title = %panel.header.title,
            width = metrics.width,
            height = metrics.height,
            tiles = panel.tile_count(),
            "Panel composed"
        );
        Ok(canvas)
    }
}

/// Load an icon; unreadable files are treated as missing.
fn load_icon(path: &Path) -> Option<RgbaImage> {
    match image::open(path) {
        Ok(image) => Some(image.to_rgba8()),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Icon unavailable, drawing background only");
            None
        }
    }
}

/// Compose every panel in parallel, preserving order.
pub fn compose_all(compositor: &dyn Compose, panels: &[Panel]) -> Result<Vec<RgbaImage>, ComposeError> {
    panels.par_iter().map(|panel| compositor.compose(panel)).collect()
}

/// Join images left to right with [`PANEL_GAP`] between them. A single image
/// is returned unchanged.
pub fn concat_horizontal(images: &[RgbaImage]) -> Result<RgbaImage, ComposeError> {
    match images {
        [] => Err(ComposeError::NoPanels),
        [single] => Ok(single.clone()),
        _ => {
            let width = images.iter().map(|i| i.width()).sum::<u32>() + PANEL_GAP * (images.len() as u32 - 1);
            let height = images.iter().map(|i| i.height()).max().unwrap_or(0);
            if width > MAX_SIDE || height > MAX_SIDE {
                return Err(ComposeError::TooLarge { width, height, max: MAX_SIDE });
            }

            let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
            let mut x = 0;
            for image in images {
                blit(&mut canvas, image, x, 0);
                x += image.width() + PANEL_GAP;
            }
            Ok(canvas)
        }
    }
}
