//! Pixel classification filters shared by zone loading and probe building.

use crate::image::{RgbaImage, BYTES_PER_PIXEL};

/// Luma threshold below which base-map pixels are treated as void.
pub const VOID_LUMA_THRESHOLD: u32 = 30;

/// Channel-difference threshold for the chromatic icon test.
const ICON_DIFF_THRESHOLD: i32 = 40;

/// Integer luma approximation `(3R + 6G + B) / 10`.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u32 {
    (3 * r as u32 + 6 * g as u32 + b as u32) / 10
}

/// Sets dark pixels of a base map to transparent black so they are ignored
/// during matching. Tier overlays already encode don't-care regions in their
/// alpha channel and are loaded as-is.
pub fn apply_void_filter(img: &mut RgbaImage, threshold: u32) {
    for px in img.as_mut_slice().chunks_exact_mut(BYTES_PER_PIXEL) {
        if luma(px[0], px[1], px[2]) < threshold {
            px.fill(0);
        }
    }
}

/// True for saturated yellow or blue overlay pixels (quest/waypoint pins).
///
/// These icons float above the map art and would otherwise contribute
/// spurious high-weight probe samples.
#[inline]
pub fn is_icon_pixel(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);

    // Yellow: high R, high G, low B.
    if r > 100 && g > 100 && r.min(g) - b > ICON_DIFF_THRESHOLD {
        return true;
    }
    // Blue: high B, low R and G.
    if b > 100 && b - r.max(g) > ICON_DIFF_THRESHOLD {
        return true;
    }
    false
}
