//! Statistical helpers for the confidence gate.

/// Arithmetic mean; 0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for fewer than two values.
pub(crate) fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mu = mean(values);
    let var = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Z-score of `value` against `values`, signed so that a value *below* the
/// mean scores positive (smaller-is-better metrics).
///
/// Returns 0 when the population is degenerate (fewer than two values or
/// near-zero spread).
pub(crate) fn z_score(value: f64, values: &[f64]) -> f64 {
    let sigma = population_std(values);
    if sigma < 1e-12 {
        return 0.0;
    }
    (mean(values) - value) / sigma
}
