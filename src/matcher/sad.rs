//! Scalar SAD-with-chroma-penalty scan kernel.

use crate::image::{RgbaView, BYTES_PER_PIXEL};
use crate::probe::TemplateProbe;

use super::{CHROMA_DIFF_THRESHOLD, CHROMA_PENALTY_WEIGHT, MIN_VALID_PERCENT};

/// One sampled probe point, flattened for the candidate loop.
///
/// `rel` is the byte offset of the point relative to a candidate's top-left
/// pixel in the haystack buffer. `max_cx`/`max_cy` are the largest candidate
/// coordinates for which this point still lands inside the haystack; a point
/// can be out of bounds for every candidate (negative limit) when a custom
/// probe claims smaller dimensions than its points cover.
struct FlatPoint {
    rel: usize,
    max_cx: i64,
    max_cy: i64,
    r: i64,
    g: i64,
    b: i64,
    rg: i64,
    bg: i64,
    weight_q8: i64,
}

/// Probe points subsampled by `probe_step` and precomputed against a
/// specific haystack stride. Rebuilt once per scan, never per candidate.
pub(crate) struct FlatProbe {
    points: Vec<FlatPoint>,
}

impl FlatProbe {
    pub(crate) fn build(
        haystack: RgbaView<'_>,
        probe: &TemplateProbe,
        probe_step: usize,
        gamma_q8: i64,
    ) -> Self {
        let stride = haystack.stride();
        let hay_w = haystack.width() as i64;
        let hay_h = haystack.height() as i64;
        let edges = probe.edge_strengths();

        let mut points = Vec::with_capacity(probe.len() / probe_step + 1);
        for idx in (0..probe.len()).step_by(probe_step) {
            let p = probe.points()[idx];
            let (px, py) = (p.x.max(0) as i64, p.y.max(0) as i64);
            let edge = edges.get(idx).copied().unwrap_or(0) as i64;
            let oob_always = p.x < 0 || p.y < 0;
            points.push(FlatPoint {
                rel: py as usize * stride + px as usize * BYTES_PER_PIXEL,
                max_cx: if oob_always { -1 } else { hay_w - 1 - px },
                max_cy: if oob_always { -1 } else { hay_h - 1 - py },
                r: p.r as i64,
                g: p.g as i64,
                b: p.b as i64,
                rg: p.r as i64 - p.g as i64,
                bg: p.b as i64 - p.g as i64,
                weight_q8: 256 + gamma_q8 * edge / 255,
            });
        }
        Self { points }
    }

    pub(crate) fn sampled_count(&self) -> usize {
        self.points.len()
    }
}

/// Winning cell of a scan: raw weighted sum plus the weight it was
/// accumulated over, so the caller can normalize to a mean diff.
#[derive(Clone, Copy)]
pub(crate) struct BestCell {
    pub(crate) x: usize,
    pub(crate) y: usize,
    pub(crate) sum: i64,
    pub(crate) weight: i64,
}

/// Scans stepped rows `[row_start, row_end)` (row index `i` maps to
/// `y = i * step`) over candidate columns `0..=max_x` in steps of `step`.
///
/// Keeps the best candidate under strict-less comparison, so ties resolve to
/// the first candidate in scan order. The running sum is abandoned as soon
/// as it exceeds the current best (branch and bound).
pub(crate) fn scan_rows(
    haystack: RgbaView<'_>,
    flat: &FlatProbe,
    step: usize,
    row_start: usize,
    row_end: usize,
    max_x: usize,
) -> Option<BestCell> {
    let data = haystack.as_slice();
    let stride = haystack.stride();
    let sampled = flat.sampled_count();
    if sampled == 0 {
        return None;
    }
    let max_oob = sampled * (100 - MIN_VALID_PERCENT) / 100;

    let mut best: Option<BestCell> = None;
    let mut best_sum = i64::MAX;

    for row in row_start..row_end {
        let y = row * step;
        let row_base = y * stride;
        for x in (0..=max_x).step_by(step) {
            let base = row_base + x * BYTES_PER_PIXEL;
            let cx = x as i64;
            let cy = y as i64;

            let mut sum = 0i64;
            let mut weight = 0i64;
            let mut oob = 0usize;
            let mut aborted = false;

            for p in &flat.points {
                if cx > p.max_cx || cy > p.max_cy {
                    oob += 1;
                    continue;
                }
                let off = base + p.rel;
                let ir = data[off] as i64;
                let ig = data[off + 1] as i64;
                let ib = data[off + 2] as i64;

                let mut diff = (ir - p.r).abs() + (ig - p.g).abs() + (ib - p.b).abs();
                let chroma = (p.rg - (ir - ig)).abs() + (p.bg - (ib - ig)).abs();
                if chroma > CHROMA_DIFF_THRESHOLD {
                    diff += (chroma - CHROMA_DIFF_THRESHOLD) * CHROMA_PENALTY_WEIGHT;
                }
                sum += p.weight_q8 * diff;
                weight += p.weight_q8;

                if sum > best_sum {
                    aborted = true;
                    break;
                }
            }

            if aborted || oob > max_oob || weight == 0 {
                continue;
            }
            if sum < best_sum {
                best_sum = sum;
                best = Some(BestCell { x, y, sum, weight });
            }
        }
    }

    best
}
