// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{DetectionMethod, MethodEvaluation};
use oma_core::stats::mean;
use oma_core::{
    EngineContext, MatchedObservation, MethodFlag, MethodKind, OmaError, TrendFitConfig,
};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Polynomial trend fit of frequency against segment id, with a two-sided
/// Student-t confidence band.
///
/// Separates genuine slow drift (temperature, structural change) from the
/// abrupt anomalies a plain z-score cannot distinguish from trend.
#[derive(Clone, Debug)]
pub struct TrendFit {
    config: TrendFitConfig,
}

impl TrendFit {
    pub fn new(config: TrendFitConfig) -> Result<Self, OmaError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrendFitConfig {
        &self.config
    }
}

/// Solves `a * x = b` by Gaussian elimination with partial pivoting.
///
/// Fails with `InsufficientData` when a pivot falls below a scaled
/// tolerance, which is how a collinear/degenerate design surfaces.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, OmaError> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = 32.0 * f64::EPSILON * scale;

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&left, &right| a[left][col].abs().total_cmp(&a[right][col].abs()))
            .ok_or_else(|| OmaError::numerical_issue("empty linear system"))?;
        if a[pivot_row][col].abs() <= tolerance {
            return Err(OmaError::insufficient_data(
                "trend fit design matrix is singular; segment ids are degenerate for the requested degree",
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for col in (0..n).rev() {
        let mut acc = b[col];
        for k in (col + 1)..n {
            acc -= a[col][k] * solution[k];
        }
        solution[col] = acc / a[col][col];
    }
    Ok(solution)
}

/// Least-squares polynomial coefficients (constant term first) via normal
/// equations over centered abscissae.
fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Result<Vec<f64>, OmaError> {
    let order = degree + 1;
    let mut normal = vec![vec![0.0; order]; order];
    let mut rhs = vec![0.0; order];

    for (&x, &y) in xs.iter().zip(ys) {
        let mut powers = vec![1.0; 2 * degree + 1];
        for k in 1..powers.len() {
            powers[k] = powers[k - 1] * x;
        }
        for j in 0..order {
            for k in 0..order {
                normal[j][k] += powers[j + k];
            }
            rhs[j] += powers[j] * y;
        }
    }

    solve_linear_system(normal, rhs)
}

fn evaluate_polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * x + c)
}

impl DetectionMethod for TrendFit {
    fn kind(&self) -> MethodKind {
        MethodKind::TrendFit
    }

    fn evaluate(
        &self,
        group: &[MatchedObservation],
        ctx: &EngineContext<'_>,
    ) -> Result<MethodEvaluation, OmaError> {
        let degree = self.config.polynomial_degree;
        let n = group.len();
        if n <= degree + 1 {
            return Err(OmaError::insufficient_data(format!(
                "trend fit requires n > degree + 1; got n={n}, degree={degree}"
            )));
        }

        let raw_xs: Vec<f64> = group.iter().map(|obs| f64::from(obs.segment_id)).collect();
        let ys: Vec<f64> = group.iter().map(|obs| obs.frequency).collect();

        // Centering keeps the normal equations well-conditioned for large
        // segment ids.
        let x_center = mean(&raw_xs)
            .ok_or_else(|| OmaError::numerical_issue("mean of segment ids unavailable"))?;
        let xs: Vec<f64> = raw_xs.iter().map(|x| x - x_center).collect();

        let coefficients = polyfit(&xs, &ys, degree)?;

        let predictions: Vec<f64> = xs
            .iter()
            .map(|&x| evaluate_polynomial(&coefficients, x))
            .collect();
        let sse = ys
            .iter()
            .zip(&predictions)
            .map(|(y, p)| (y - p) * (y - p))
            .sum::<f64>();
        if !sse.is_finite() {
            return Err(OmaError::numerical_issue(format!(
                "non-finite residual sum of squares: {sse}"
            )));
        }

        let df = n - (degree + 1);
        let residual_std_error = (sse / df as f64).sqrt();

        let t_dist = StudentsT::new(0.0, 1.0, df as f64).map_err(|err| {
            OmaError::numerical_issue(format!("Student-t with df={df} unavailable: {err}"))
        })?;
        let quantile = t_dist.inverse_cdf(0.5 + self.config.confidence_level / 2.0);
        if !quantile.is_finite() {
            return Err(OmaError::numerical_issue(format!(
                "non-finite t quantile for confidence {}",
                self.config.confidence_level
            )));
        }
        let band = quantile * residual_std_error;

        let flags: Vec<MethodFlag> = ys
            .iter()
            .zip(&predictions)
            .map(|(&y, &prediction)| {
                let upper = prediction + band;
                let lower = prediction - band;
                let metric_value = if y > upper {
                    y - upper
                } else if y < lower {
                    y - lower
                } else {
                    0.0
                };
                MethodFlag {
                    is_outlier: metric_value != 0.0,
                    metric_value,
                }
            })
            .collect();

        let flagged = flags.iter().filter(|f| f.is_outlier).count();
        ctx.record_scalar("detect.trend_fit.flagged", flagged as f64);
        ctx.record_scalar("detect.trend_fit.band_half_width", band);

        Ok(MethodEvaluation {
            kind: self.kind(),
            flags,
            warnings: vec![],
            used_fallback: false,
        })
    }
}
