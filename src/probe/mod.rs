//! Sparse template probes built from masked minimaps.
//!
//! A probe is the filtered, flattened representation of one minimap frame:
//! every pixel that survives the annulus mask, the alpha channel, and the
//! chromatic icon test becomes one `ProbePoint`. The scan order is row-major
//! with x inner, so striding over `points` by a fixed `probe_step` is a
//! reproducible subsampling.

use crate::image::RgbaView;
use crate::mask::filter::{is_icon_pixel, luma};
use crate::mask::AlphaMask;

/// One template sample, relative to the probe's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbePoint {
    pub x: i16,
    pub y: i16,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Reusable sparse probe; rebuilt in place once per frame.
///
/// `edge_strengths` runs parallel to `points` and holds the luma gradient
/// magnitude at each sample, consumed by the edge-weighted matcher.
#[derive(Default)]
pub struct TemplateProbe {
    points: Vec<ProbePoint>,
    edge_strengths: Vec<u8>,
    width: usize,
    height: usize,
    luma_buf: Vec<u8>,
}

impl TemplateProbe {
    /// Creates an empty probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a probe from explicit points, for custom matching pipelines.
    ///
    /// Edge strengths default to zero, so weighted matching degenerates to
    /// plain matching for such probes.
    pub fn from_points(points: Vec<ProbePoint>, width: usize, height: usize) -> Self {
        let edge_strengths = vec![0; points.len()];
        Self {
            points,
            edge_strengths,
            width,
            height,
            luma_buf: Vec::new(),
        }
    }

    /// Rebuilds the probe from a masked minimap frame.
    ///
    /// Points are appended in row-major order (x inner) for every pixel that
    /// is inside the annulus, not transparent, and not a chromatic overlay
    /// icon. Capacity is retained across frames; only the length resets.
    ///
    /// Panics if the mask dimensions do not match the minimap; the locator
    /// regenerates the mask before calling, so a mismatch is a programming
    /// error.
    pub fn rebuild(&mut self, minimap: RgbaView<'_>, mask: &AlphaMask) {
        let w = minimap.width();
        let h = minimap.height();
        assert!(
            mask.width() == w && mask.height() == h,
            "annulus mask {}x{} does not match minimap {}x{}",
            mask.width(),
            mask.height(),
            w,
            h
        );

        self.points.clear();
        self.edge_strengths.clear();
        self.width = w;
        self.height = h;
        self.fill_luma_plane(minimap);

        for y in 0..h {
            let row = minimap.row(y).expect("row within bounds");
            for x in 0..w {
                let px = &row[x * 4..x * 4 + 4];
                if px[3] == 0 {
                    continue;
                }
                if !mask.is_valid(x, y) {
                    continue;
                }
                if is_icon_pixel(px[0], px[1], px[2]) {
                    continue;
                }
                let edge = self.edge_at(x, y);
                self.points.push(ProbePoint {
                    x: x as i16,
                    y: y as i16,
                    r: px[0],
                    g: px[1],
                    b: px[2],
                });
                self.edge_strengths.push(edge);
            }
        }
    }

    /// Luma gradient magnitude at `(x, y)` from central differences, clamped
    /// to the image border and to 255.
    fn edge_at(&self, x: usize, y: usize) -> u8 {
        let w = self.width;
        let l = |x: usize, y: usize| self.luma_buf[y * w + x] as i32;
        let gx = l((x + 1).min(w - 1), y) - l(x.saturating_sub(1), y);
        let gy = l(x, (y + 1).min(self.height - 1)) - l(x, y.saturating_sub(1));
        ((gx.abs() + gy.abs()) / 2).min(255) as u8
    }

    fn fill_luma_plane(&mut self, minimap: RgbaView<'_>) {
        let w = minimap.width();
        let h = minimap.height();
        self.luma_buf.clear();
        self.luma_buf.reserve(w * h);
        for y in 0..h {
            let row = minimap.row(y).expect("row within bounds");
            for x in 0..w {
                let px = &row[x * 4..x * 4 + 4];
                self.luma_buf.push(luma(px[0], px[1], px[2]) as u8);
            }
        }
    }

    /// Returns the probe points in scan order.
    pub fn points(&self) -> &[ProbePoint] {
        &self.points
    }

    /// Returns the per-point edge strengths, parallel to `points`.
    pub fn edge_strengths(&self) -> &[u8] {
        &self.edge_strengths
    }

    /// Width of the source minimap in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the source minimap in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of probe points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the probe holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
