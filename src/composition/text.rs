//! Label rendering with rusttype
//!
//! Without a font every draw call is a no-op and widths are estimated, so
//! layout stays stable whether or not the font download succeeded.

use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::blend::source_over;

/// Optional font plus measuring and drawing helpers.
///
/// A renderer made with [`TextRenderer::load`] remembers the font path. While
/// the font is missing, every measurement retries the file, so a font that
/// lands on disk later (the startup draw-asset download) is picked up by the
/// next render.
pub struct TextRenderer {
    path: Option<PathBuf>,
    font: OnceLock<Font<'static>>,
}

impl TextRenderer {
    /// Renderer backed by the TrueType font at `path`. A missing or invalid
    /// file yields no text until the file becomes readable.
    pub fn load(path: &Path) -> Self {
        let font = OnceLock::new();
        match read_font(path) {
            Ok(loaded) => {
                let _ = font.set(loaded);
            }
            Err(reason) => {
                tracing::warn!(path = %path.display(), reason = %reason, "Font unavailable, text is skipped");
            }
        }
        Self { path: Some(path.to_path_buf()), font }
    }

    pub fn without_font() -> Self {
        Self { path: None, font: OnceLock::new() }
    }

    pub fn has_font(&self) -> bool {
        self.font().is_some()
    }

    fn font(&self) -> Option<&Font<'static>> {
        if let Some(font) = self.font.get() {
            return Some(font);
        }
        let path = self.path.as_deref()?;
        let font = read_font(path).ok()?;
        tracing::debug!(path = %path.display(), "Font loaded");
        Some(self.font.get_or_init(|| font))
    }

    /// Advance width of `text` at `px`.
    pub fn width(&self, px: f32, text: &str) -> u32 {
        let Some(font) = self.font() else {
            return estimate_width(px, text);
        };
        if text.is_empty() {
            return 0;
        }
        let scale = Scale::uniform(px);
        let v_metrics = font.v_metrics(scale);
        font.layout(text, scale, point(0.0, v_metrics.ascent))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .map_or(0, |w| w.ceil().max(0.0) as u32)
    }

    /// Height of one line at `px`.
    pub fn line_height(&self, px: f32) -> u32 {
        match self.font() {
            Some(font) => {
                let v = font.v_metrics(Scale::uniform(px));
                (v.ascent - v.descent).ceil().max(1.0) as u32
            }
            None => px.ceil() as u32,
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, canvas: &mut RgbaImage, px: f32, x: i32, y: i32, color: Rgba<u8>, text: &str) {
        let Some(font) = self.font() else {
            return;
        };
        let scale = Scale::uniform(px);
        let v_metrics = font.v_metrics(scale);
        let origin = point(x as f32, y as f32 + v_metrics.ascent);

        for glyph in font.layout(text, scale, origin) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                let cx = gx as i32 + bb.min.x;
                let cy = gy as i32 + bb.min.y;
                if cx < 0 || cy < 0 || cx as u32 >= canvas.width() || cy as u32 >= canvas.height() {
                    return;
                }
                if v <= 0.0 {
                    return;
                }
                let dst = *canvas.get_pixel(cx as u32, cy as u32);
                let out = source_over(&color, &dst, v.min(1.0) * color[3] as f32 / 255.0);
                canvas.put_pixel(cx as u32, cy as u32, out);
            });
        }
    }

    /// Draw `text` horizontally centered in `[x, x + width)` and vertically
    /// centered in `[y, y + height)`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_centered(
        &self,
        canvas: &mut RgbaImage,
        px: f32,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: Rgba<u8>,
        text: &str,
    ) {
        let dx = (width as i32 - self.width(px, text) as i32) / 2;
        let dy = (height as i32 - self.line_height(px) as i32) / 2;
        self.draw(canvas, px, x + dx, y + dy, color, text);
    }
}

fn read_font(path: &Path) -> Result<Font<'static>, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    Font::try_from_vec(bytes).ok_or_else(|| "invalid font data".to_string())
}

/// Full-width glyphs take `px`, ASCII takes half.
fn estimate_width(px: f32, text: &str) -> u32 {
    let units: f32 = text.chars().map(|c| if c.is_ascii() { 0.5 } else { 1.0 }).sum();
    (units * px).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_width() {
        let text = TextRenderer::without_font();
        assert!(!text.has_font());
        assert_eq!(text.width(30.0, "神里绫华"), 120);
        assert_eq!(text.width(24.0, "ab"), 24);
        assert_eq!(text.width(30.0, ""), 0);
        assert_eq!(text.line_height(36.0), 36);
    }

    #[test]
    fn test_missing_font_file() {
        let text = TextRenderer::load(Path::new("/nonexistent/HYWH-65W.ttf"));
        assert!(!text.has_font());
    }

    #[test]
    fn test_font_written_after_load_is_picked_up() {
        let Some(system) = ["/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf", "/usr/share/fonts/TTF/DejaVuSans.ttf"]
            .into_iter()
            .map(Path::new)
            .find(|path| path.is_file())
        else {
            eprintln!("no system TrueType font available, skipping");
            return;
        };
        let temp = tempfile::TempDir::new().expect("should create temp dir");
        let path = temp.path().join("HYWH-65W.ttf");

        let text = TextRenderer::load(&path);
        assert!(!text.has_font());
        std::fs::write(&path, b"not a font").unwrap();
        assert!(!text.has_font());

        std::fs::copy(system, &path).unwrap();
        assert!(text.has_font());
        let mut canvas = RgbaImage::from_pixel(200, 60, Rgba([255, 255, 255, 255]));
        text.draw(&mut canvas, 30.0, 0, 0, Rgba([0, 0, 0, 255]), "Jean");
        assert!(canvas.pixels().any(|p| *p != Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_draw_without_font_is_noop() {
        let text = TextRenderer::without_font();
        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 255]));
        text.draw(&mut canvas, 30.0, 0, 0, Rgba([0, 0, 0, 255]), "琴");
        assert!(canvas.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }
}
