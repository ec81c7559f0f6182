//! Triple-validation confidence gate for global-search candidates.
//!
//! Any single acceptance criterion is defeatable: the absolute threshold by a
//! dim map resembling many zones, the gap by two near-duplicate zones, the
//! z-score by high variance of random scores. Requiring two of the three
//! makes adversarial ambiguity much rarer.

use crate::trace::trace_event;
use crate::util::stats::z_score;

/// One global-search result per zone, scored smaller-is-better.
#[derive(Clone, Debug)]
pub(crate) struct ZoneCandidate {
    pub(crate) zone_index: usize,
    pub(crate) x: usize,
    pub(crate) y: usize,
    pub(crate) combined: f64,
}

/// Thresholds for the triple-validation vote.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GateThresholds {
    /// Rank-1 combined score must be below this to count as "absolute".
    pub max_absolute: f64,
    /// Rank-2 minus rank-1 must be at least this to count as "gap".
    pub min_gap: f64,
    /// Rank-1 z-score against all candidates must exceed this to count as
    /// "statistical".
    pub min_z: f64,
    /// Fallback absolute threshold when only one candidate exists.
    pub single_max: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            max_absolute: 60.0,
            min_gap: 8.0,
            min_z: 1.5,
            single_max: 55.0,
        }
    }
}

/// Sorts candidates ascending by combined score and returns the winner, if
/// any passes the 2-of-3 vote (or the single-candidate fallback).
pub(crate) fn select_candidate(
    mut candidates: Vec<ZoneCandidate>,
    thresholds: &GateThresholds,
) -> Option<ZoneCandidate> {
    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|a, b| a.combined.total_cmp(&b.combined));

    if candidates.len() == 1 {
        let only = &candidates[0];
        if only.combined < thresholds.single_max {
            return Some(only.clone());
        }
        return None;
    }

    let rank1 = &candidates[0];
    let rank2 = &candidates[1];

    let absolute_ok = rank1.combined < thresholds.max_absolute;
    let gap_ok = rank2.combined - rank1.combined >= thresholds.min_gap;

    let scores: Vec<f64> = candidates.iter().map(|c| c.combined).collect();
    let z = z_score(rank1.combined, &scores);
    let stat_ok = z > thresholds.min_z;

    trace_event!(
        "gate_check",
        rank1 = rank1.combined,
        rank2 = rank2.combined,
        z = z,
        absolute_ok = absolute_ok,
        gap_ok = gap_ok,
        stat_ok = stat_ok
    );

    let votes = usize::from(absolute_ok) + usize::from(gap_ok) + usize::from(stat_ok);
    if votes >= 2 {
        Some(candidates.swap_remove(0))
    } else {
        None
    }
}
