//! Pixel primitives: sub-rectangle copy, downscale, rectangle drawing.

use crate::image::{RgbaImage, RgbaView, BYTES_PER_PIXEL};
use crate::util::MapLocateResult;

/// Copies a sub-rectangle of `src` into a new contiguous image.
pub fn copy_sub_image(
    src: RgbaView<'_>,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> MapLocateResult<RgbaImage> {
    let roi = src.roi(x, y, width, height)?;
    let mut out = RgbaImage::default();
    out.copy_from(roi)?;
    Ok(out)
}

/// Copies a sub-rectangle of `src` into `dst`, reusing `dst`'s allocation.
pub fn copy_sub_image_into(
    src: RgbaView<'_>,
    dst: &mut RgbaImage,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> MapLocateResult<()> {
    let roi = src.roi(x, y, width, height)?;
    dst.copy_from(roi)
}

/// Downscales `src` by an integer factor using nearest-neighbor sampling.
pub fn downscale_nearest(src: RgbaView<'_>, scale: usize) -> MapLocateResult<RgbaImage> {
    let scale = scale.max(1);
    let new_w = (src.width() / scale).max(1);
    let new_h = (src.height() / scale).max(1);
    let mut dst = RgbaImage::new(new_w, new_h)?;
    let dst_row_bytes = new_w * BYTES_PER_PIXEL;
    for y in 0..new_h {
        let src_row = src.row(y * scale).expect("row within bounds");
        let dst_row = &mut dst.as_mut_slice()[y * dst_row_bytes..(y + 1) * dst_row_bytes];
        for x in 0..new_w {
            let s = x * scale * BYTES_PER_PIXEL;
            let d = x * BYTES_PER_PIXEL;
            dst_row[d..d + BYTES_PER_PIXEL].copy_from_slice(&src_row[s..s + BYTES_PER_PIXEL]);
        }
    }
    Ok(dst)
}

/// Draws a rectangle outline of the given thickness, clipped to the image.
///
/// Coordinates are signed so callers can pass boxes that extend past the
/// image edges.
pub fn draw_rect_outline(
    dst: &mut RgbaImage,
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    thickness: usize,
    color: [u8; 4],
) {
    let t = thickness as i64;
    // Top, bottom, left, right bars.
    fill_rect(dst, x0, y0, x1, y0 + t, color);
    fill_rect(dst, x0, y1 - t, x1, y1, color);
    fill_rect(dst, x0, y0, x0 + t, y1, color);
    fill_rect(dst, x1 - t, y0, x1, y1, color);
}

fn fill_rect(dst: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 4]) {
    let w = dst.width() as i64;
    let h = dst.height() as i64;
    let x0 = x0.clamp(0, w);
    let y0 = y0.clamp(0, h);
    let x1 = x1.clamp(0, w);
    let y1 = y1.clamp(0, h);
    for y in y0..y1 {
        for x in x0..x1 {
            dst.put_pixel(x as usize, y as usize, color);
        }
    }
}
