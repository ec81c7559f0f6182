//! Error types for maplocate.

use thiserror::Error;

/// Result alias for maplocate operations.
pub type MapLocateResult<T> = std::result::Result<T, MapLocateError>;

/// Errors that can occur when constructing or running the locator.
///
/// Per-frame misses are not errors: `MapLocator::locate` reports them as
/// `Ok(None)` and advances the lost-tracking counter instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MapLocateError {
    /// The image dimensions are zero or overflow the address space.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The row stride is too small for the image width.
    #[error("stride {stride} bytes is too small for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer is shorter than the view requires.
    #[error("buffer too small: needed {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A requested sub-rectangle lies outside the image.
    #[error("roi {width}x{height} at ({x}, {y}) outside image {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// No map zones were supplied to the constructor.
    #[error("no map zones loaded")]
    NoZones,
    /// A zone file could not be opened or decoded.
    #[error("failed to load zone {zone}: {reason}")]
    ZoneLoad { zone: String, reason: String },
    /// Generic image encode/decode failure.
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
    /// The zone directory could not be scanned.
    #[error("failed to scan zone directory: {reason}")]
    ZoneScan { reason: String },
}
