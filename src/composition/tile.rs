//! Rounded, rank-tinted icon tiles

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::models::Rank;

use super::blend::{apply_mask, blit};

/// Side of the working canvas a tile is drawn on before downscaling.
pub const TILE_SOURCE: u32 = 140;
pub const TILE_RADIUS: u32 = 15;
pub const GROUP_ICON_RADIUS: u32 = 30;
/// Subsamples per axis when computing corner coverage.
pub const SUPERSAMPLE: u32 = 5;

/// Background tint per rank.
pub fn rank_color(rank: Rank) -> Rgba<u8> {
    match rank {
        Rank::Three => Rgba([0x51, 0x80, 0xCC, 0xFF]),
        Rank::Four => Rgba([0x9C, 0x75, 0xB7, 0xFF]),
        Rank::Five => Rgba([0xC4, 0x81, 0x3E, 0xFF]),
    }
}

/// Coverage mask of a `size` x `size` square with rounded corners.
///
/// Each pixel is sampled `SUPERSAMPLE` x `SUPERSAMPLE` times so the corner
/// arcs come out antialiased.
pub fn rounded_mask(size: u32, radius: u32) -> GrayImage {
    let radius = radius.min(size / 2) as f32;
    let size_f = size as f32;
    let samples = (SUPERSAMPLE * SUPERSAMPLE) as f32;

    let inside = |x: f32, y: f32| -> bool {
        // Distance into the nearest corner square, zero outside corners
        let cx = if x < radius {
            radius - x
        } else if x > size_f - radius {
            x - (size_f - radius)
        } else {
            0.0
        };
        let cy = if y < radius {
            radius - y
        } else if y > size_f - radius {
            y - (size_f - radius)
        } else {
            0.0
        };
        cx * cx + cy * cy <= radius * radius
    };

    GrayImage::from_fn(size, size, |px, py| {
        let mut hits = 0u32;
        for sy in 0..SUPERSAMPLE {
            for sx in 0..SUPERSAMPLE {
                let x = px as f32 + (sx as f32 + 0.5) / SUPERSAMPLE as f32;
                let y = py as f32 + (sy as f32 + 0.5) / SUPERSAMPLE as f32;
                if inside(x, y) {
                    hits += 1;
                }
            }
        }
        Luma([((hits as f32 / samples) * 255.0).round() as u8])
    })
}

/// Draw one tile: tint, icon on top, rounded corners, then scale to `size`.
///
/// `mask` must be `TILE_SOURCE` square.
pub fn render_tile(icon: Option<&RgbaImage>, tint: Rgba<u8>, mask: &GrayImage, size: u32) -> RgbaImage {
    let mut tile = RgbaImage::from_pixel(TILE_SOURCE, TILE_SOURCE, tint);
    if let Some(icon) = icon {
        if icon.dimensions() == (TILE_SOURCE, TILE_SOURCE) {
            blit(&mut tile, icon, 0, 0);
        } else {
            let scaled = imageops::resize(icon, TILE_SOURCE, TILE_SOURCE, FilterType::Lanczos3);
            blit(&mut tile, &scaled, 0, 0);
        }
    }
    apply_mask(&mut tile, mask);

    if size == TILE_SOURCE {
        tile
    } else {
        imageops::resize(&tile, size, size, FilterType::Lanczos3)
    }
}
