//! Row-banded parallel scan.
//!
//! The stepped row range is split into 8 contiguous bands; each band is
//! scanned independently and the per-band winners are folded in band order,
//! which reproduces the serial first-encountered tie-break bit-exactly. All
//! bands are joined before returning.

use crate::image::RgbaView;

use super::sad::{scan_rows, BestCell, FlatProbe};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Number of contiguous row bands used by the parallel scan.
#[cfg(feature = "rayon")]
const NUM_BANDS: usize = 8;

#[cfg(feature = "rayon")]
pub(crate) fn scan_banded(
    haystack: RgbaView<'_>,
    flat: &FlatProbe,
    step: usize,
    rows: usize,
    max_x: usize,
) -> Option<BestCell> {
    let rows_per_band = rows.div_ceil(NUM_BANDS);

    let locals: Vec<Option<BestCell>> = (0..NUM_BANDS)
        .into_par_iter()
        .map(|band| {
            let row_start = band * rows_per_band;
            let row_end = ((band + 1) * rows_per_band).min(rows);
            if row_start >= row_end {
                return None;
            }
            scan_rows(haystack, flat, step, row_start, row_end, max_x)
        })
        .collect();

    reduce_in_order(locals)
}

/// Without the rayon feature the banded scan degrades to the serial kernel.
#[cfg(not(feature = "rayon"))]
pub(crate) fn scan_banded(
    haystack: RgbaView<'_>,
    flat: &FlatProbe,
    step: usize,
    rows: usize,
    max_x: usize,
) -> Option<BestCell> {
    scan_rows(haystack, flat, step, 0, rows, max_x)
}

#[cfg(feature = "rayon")]
fn reduce_in_order(locals: Vec<Option<BestCell>>) -> Option<BestCell> {
    let mut best: Option<BestCell> = None;
    for cell in locals.into_iter().flatten() {
        match best {
            Some(b) if cell.sum >= b.sum => {}
            _ => best = Some(cell),
        }
    }
    best
}
