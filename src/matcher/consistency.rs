//! Local consistency scoring for global-search candidates.

use crate::image::RgbaView;
use crate::probe::TemplateProbe;

/// Measures how evenly the matching error is distributed at a placement.
///
/// Samples `probe.points[::stride]`; each point takes the best (smallest)
/// mean per-channel diff over a 3x3 neighborhood of its mapped haystack
/// pixel, and the returned value is the population variance of those
/// per-point diffs. A low value means the residual error is spread uniformly
/// (structural match); a high value means a few features fit while the rest
/// are random (false positive). Callers add it to the match score weighted
/// by a small alpha.
pub fn compute_local_consistency_fast(
    haystack: RgbaView<'_>,
    probe: &TemplateProbe,
    x: usize,
    y: usize,
    stride: usize,
) -> f64 {
    let stride = stride.max(1);
    let hay_w = haystack.width() as i64;
    let hay_h = haystack.height() as i64;

    let mut diffs: Vec<f64> = Vec::with_capacity(probe.len() / stride + 1);

    for idx in (0..probe.len()).step_by(stride) {
        let p = probe.points()[idx];
        let px = x as i64 + p.x as i64;
        let py = y as i64 + p.y as i64;
        if px < 0 || py < 0 || px >= hay_w || py >= hay_h {
            continue;
        }

        let mut best = i64::MAX;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = px + dx;
                let ny = py + dy;
                if nx < 0 || ny < 0 || nx >= hay_w || ny >= hay_h {
                    continue;
                }
                let [ir, ig, ib, _] = haystack
                    .pixel(nx as usize, ny as usize)
                    .expect("neighbor within bounds");
                let sad = (ir as i64 - p.r as i64).abs()
                    + (ig as i64 - p.g as i64).abs()
                    + (ib as i64 - p.b as i64).abs();
                best = best.min(sad);
            }
        }
        if best != i64::MAX {
            diffs.push(best as f64 / 3.0);
        }
    }

    if diffs.len() < 2 {
        return 0.0;
    }
    let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
    diffs.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / diffs.len() as f64
}
