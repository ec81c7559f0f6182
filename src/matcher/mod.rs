//! Probe matching kernels.
//!
//! The matcher slides a sparse probe over a haystack image and scores each
//! placement with an integer sum of absolute per-channel differences plus a
//! chromatic penalty. All candidate-loop math is integer; only the final
//! normalization to a mean diff divides in floating point.

pub(crate) mod parallel;
pub(crate) mod sad;

mod consistency;

pub use consistency::compute_local_consistency_fast;

use crate::image::RgbaView;
use crate::probe::TemplateProbe;
use crate::trace::trace_span;
use sad::{scan_rows, FlatProbe};

/// Chroma difference below this threshold carries no penalty.
pub(crate) const CHROMA_DIFF_THRESHOLD: i64 = 45;

/// Penalty weight per unit of chroma difference above the threshold.
pub(crate) const CHROMA_PENALTY_WEIGHT: i64 = 15;

/// Minimum share of sampled probe points that must land inside the haystack
/// for a candidate placement to be considered.
pub(crate) const MIN_VALID_PERCENT: usize = 85;

/// Best placement found by a probe scan.
///
/// `(x, y)` is the top-left corner of the probe inside the haystack;
/// `avg_diff` is the mean absolute per-channel difference (0 identical, 255
/// maximally different), including the chroma penalty.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeMatch {
    pub x: usize,
    pub y: usize,
    pub avg_diff: f64,
}

/// Scans `probe` across `haystack` and returns the best placement.
///
/// `step` is the physical stride over candidate top-left positions,
/// `probe_step` the subsampling stride over probe points (only indices
/// `0, probe_step, 2*probe_step, ...` are tested). Ties go to the first
/// candidate in scan order. Returns `None` for degenerate input: an empty
/// probe, a haystack smaller than the probe, or no candidate surviving the
/// bounds-validity guard.
pub fn match_probe(
    haystack: RgbaView<'_>,
    probe: &TemplateProbe,
    step: usize,
    probe_step: usize,
    parallel: bool,
) -> Option<ProbeMatch> {
    match_probe_impl(haystack, probe, step, probe_step, parallel, 0)
}

/// Edge-weighted variant of [`match_probe`].
///
/// Each probe point contributes with weight `1 + gamma * edge_strength`,
/// where the edge strength was recorded at probe build time from the minimap
/// luma gradient. Emphasizes boundaries during the global search. The
/// returned scalar is the weighted mean diff.
pub fn match_probe_weighted(
    haystack: RgbaView<'_>,
    probe: &TemplateProbe,
    step: usize,
    probe_step: usize,
    parallel: bool,
    gamma: f64,
) -> Option<ProbeMatch> {
    // Q8 fixed point keeps the candidate loop integer-only.
    let gamma_q8 = ((gamma.max(0.0)) * 256.0).round() as i64;
    match_probe_impl(haystack, probe, step, probe_step, parallel, gamma_q8)
}

fn match_probe_impl(
    haystack: RgbaView<'_>,
    probe: &TemplateProbe,
    step: usize,
    probe_step: usize,
    parallel: bool,
    gamma_q8: i64,
) -> Option<ProbeMatch> {
    let step = step.max(1);
    let probe_step = probe_step.max(1);

    if probe.is_empty()
        || probe.width() == 0
        || probe.height() == 0
        || haystack.width() < probe.width()
        || haystack.height() < probe.height()
    {
        return None;
    }

    let _span = trace_span!(
        "match_probe",
        step = step,
        probe_step = probe_step,
        parallel = parallel
    )
    .entered();

    let flat = FlatProbe::build(haystack, probe, probe_step, gamma_q8);
    let max_x = haystack.width() - probe.width();
    let max_y = haystack.height() - probe.height();
    let rows = max_y / step + 1;

    let best = if parallel {
        parallel::scan_banded(haystack, &flat, step, rows, max_x)
    } else {
        scan_rows(haystack, &flat, step, 0, rows, max_x)
    }?;

    Some(ProbeMatch {
        x: best.x,
        y: best.y,
        avg_diff: best.sum as f64 / (3.0 * best.weight as f64),
    })
}
