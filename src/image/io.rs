//! Convenience helpers for loading and saving images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::RgbaImage;
use crate::util::{MapLocateError, MapLocateResult};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Converts a decoded dynamic image into a packed RGBA buffer.
pub fn rgba_from_dynamic_image(img: &image::DynamicImage) -> MapLocateResult<RgbaImage> {
    let rgba = img.to_rgba8();
    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    RgbaImage::from_vec(rgba.into_raw(), width, height)
}

/// Loads an image from disk (PNG/JPG/WEBP) and converts it to packed RGBA.
pub fn load_rgba_image<P: AsRef<Path>>(path: P) -> MapLocateResult<RgbaImage> {
    let img = image::open(path).map_err(|err| MapLocateError::ImageIo {
        reason: err.to_string(),
    })?;
    rgba_from_dynamic_image(&img)
}

/// Encodes an owned RGBA image as PNG at `path`.
pub fn save_png<P: AsRef<Path>>(path: P, img: &RgbaImage) -> MapLocateResult<()> {
    image::save_buffer(
        path,
        img.as_slice(),
        img.width() as u32,
        img.height() as u32,
        image::ExtendedColorType::Rgba8,
    )
    .map_err(|err| MapLocateError::ImageIo {
        reason: err.to_string(),
    })
}

/// Saves a timestamped debug PNG under `output_dir` and returns its path.
///
/// Development-time tooling only; never called from the locate hot path.
pub fn save_debug_image<P: AsRef<Path>>(
    output_dir: P,
    name: &str,
    img: &RgbaImage,
) -> MapLocateResult<PathBuf> {
    let dir = output_dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|err| MapLocateError::ImageIo {
        reason: err.to_string(),
    })?;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let path = dir.join(format!("{name}_{millis}.png"));
    save_png(&path, img)?;
    Ok(path)
}
