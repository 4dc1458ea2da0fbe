//! Alpha compositing primitives

use image::{GrayImage, Rgba, RgbaImage};

/// Blit a layer onto the canvas at the given position with "source over"
/// alpha compositing. Pixels falling outside the canvas are dropped.
pub(crate) fn blit(canvas: &mut RgbaImage, layer: &RgbaImage, x: u32, y: u32) {
    let canvas_width = canvas.width();
    let canvas_height = canvas.height();

    for (ly, row) in layer.rows().enumerate() {
        let dest_y = y + ly as u32;
        if dest_y >= canvas_height {
            break;
        }

        for (lx, pixel) in row.enumerate() {
            let dest_x = x + lx as u32;
            if dest_x >= canvas_width {
                break;
            }
            // Fully transparent source, skip
            if pixel[3] == 0 {
                continue;
            }

            let dst = canvas.get_pixel(dest_x, dest_y);
            let blended = source_over(pixel, dst, pixel[3] as f32 / 255.0);
            canvas.put_pixel(dest_x, dest_y, blended);
        }
    }
}

/// Composite `src` over `dst` with the given source alpha.
pub(crate) fn source_over(src: &Rgba<u8>, dst: &Rgba<u8>, src_alpha: f32) -> Rgba<u8> {
    let dst_alpha = dst[3] as f32 / 255.0;

    // out_alpha = src_alpha + dst_alpha * (1 - src_alpha)
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    // out_color = (src * src_alpha + dst * dst_alpha * (1 - src_alpha)) / out_alpha
    let composite = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let result = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        (result.clamp(0.0, 1.0) * 255.0).round() as u8
    };

    Rgba([
        composite(src[0], dst[0]),
        composite(src[1], dst[1]),
        composite(src[2], dst[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Multiply the alpha channel of `image` by a same-sized coverage mask.
pub(crate) fn apply_mask(image: &mut RgbaImage, mask: &GrayImage) {
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let coverage = mask.get_pixel(x, y)[0] as u32;
        pixel[3] = ((pixel[3] as u32 * coverage + 127) / 255) as u8;
    }
}
