// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Shared scalar statistics used by the detection methods and the ensemble.
///
/// All helpers are closed-form over borrowed slices; they never allocate.

/// Scaled tolerance below which a variance is treated as zero.
pub fn variance_tolerance(values: &[f64]) -> f64 {
    let scale = values
        .iter()
        .fold(1.0_f64, |acc, v| acc.max(v.abs() * v.abs()));
    32.0 * f64::EPSILON * scale
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance (n-1 denominator); `None` when n < 2.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let sum_sq = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>();
    // Centered sums can go slightly negative in floating point.
    Some((sum_sq / (values.len() - 1) as f64).max(0.0))
}

/// Unbiased sample standard deviation; `None` when n < 2.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Standardized distance `(value - mean) / std`, or 0.0 when `std` is not
/// usable (zero, non-finite).
pub fn standardized(value: f64, mu: f64, std: f64) -> f64 {
    if !std.is_finite() || std <= 0.0 {
        return 0.0;
    }
    (value - mu) / std
}

/// Unbiased sample covariance of two equal-length slices; `None` when n < 2.
pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let sum = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>();
    Some(sum / (xs.len() - 1) as f64)
}
