// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{DetectionMethod, MethodEvaluation};
use oma_core::stats::{mean, sample_covariance, sample_variance, standardized, variance_tolerance};
use oma_core::{
    EngineContext, JointDistanceConfig, MatchedObservation, MethodFlag, MethodKind, OmaError,
};

/// Relative tolerance for treating the 2x2 covariance determinant as zero.
const DETERMINANT_TOLERANCE: f64 = 1.0e-9;

/// Mahalanobis distance over the joint (frequency, MAC) distribution.
///
/// Catches mis-clustered estimates whose frequency looks reasonable but
/// whose shape match is poor; a point with `mac_value` below the configured
/// minimum is always suspect regardless of distance.
#[derive(Clone, Debug)]
pub struct JointDistance {
    config: JointDistanceConfig,
}

impl JointDistance {
    pub fn new(config: JointDistanceConfig) -> Result<Self, OmaError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &JointDistanceConfig {
        &self.config
    }
}

struct Covariance {
    mean_f: f64,
    mean_m: f64,
    var_f: f64,
    var_m: f64,
    cov_fm: f64,
    determinant: f64,
    /// Per-dimension standard deviations, zeroed when the variance is below
    /// the scaled tolerance so rounding noise never standardizes to ±1.
    std_f: f64,
    std_m: f64,
}

fn covariance_2d(frequencies: &[f64], macs: &[f64]) -> Result<Covariance, OmaError> {
    let mean_f =
        mean(frequencies).ok_or_else(|| OmaError::numerical_issue("frequency mean unavailable"))?;
    let mean_m = mean(macs).ok_or_else(|| OmaError::numerical_issue("MAC mean unavailable"))?;
    let var_f = sample_variance(frequencies)
        .ok_or_else(|| OmaError::numerical_issue("frequency variance unavailable"))?;
    let var_m = sample_variance(macs)
        .ok_or_else(|| OmaError::numerical_issue("MAC variance unavailable"))?;
    let cov_fm = sample_covariance(frequencies, macs)
        .ok_or_else(|| OmaError::numerical_issue("covariance unavailable"))?;

    let std_f = if var_f <= variance_tolerance(frequencies) {
        0.0
    } else {
        var_f.sqrt()
    };
    let std_m = if var_m <= variance_tolerance(macs) {
        0.0
    } else {
        var_m.sqrt()
    };

    Ok(Covariance {
        mean_f,
        mean_m,
        var_f,
        var_m,
        cov_fm,
        determinant: var_f * var_m - cov_fm * cov_fm,
        std_f,
        std_m,
    })
}

impl Covariance {
    fn is_singular(&self) -> bool {
        if self.std_f == 0.0 || self.std_m == 0.0 {
            return true;
        }
        let scale = (self.var_f * self.var_m)
            .abs()
            .max(self.cov_fm * self.cov_fm)
            .max(f64::MIN_POSITIVE);
        self.determinant.abs() <= DETERMINANT_TOLERANCE * scale
    }

    /// Mahalanobis distance via the closed-form 2x2 inverse.
    fn mahalanobis(&self, frequency: f64, mac_value: f64) -> f64 {
        let dx = frequency - self.mean_f;
        let dm = mac_value - self.mean_m;
        let quadratic =
            (dx * dx * self.var_m - 2.0 * dx * dm * self.cov_fm + dm * dm * self.var_f)
                / self.determinant;
        quadratic.max(0.0).sqrt()
    }

    /// Fallback: independent per-dimension z-scores combined as Euclidean
    /// distance in standardized space. A zero-variance dimension contributes
    /// nothing.
    fn standardized_distance(&self, frequency: f64, mac_value: f64) -> f64 {
        let z_f = standardized(frequency, self.mean_f, self.std_f);
        let z_m = standardized(mac_value, self.mean_m, self.std_m);
        z_f.hypot(z_m)
    }
}

impl DetectionMethod for JointDistance {
    fn kind(&self) -> MethodKind {
        MethodKind::JointDistance
    }

    fn evaluate(
        &self,
        group: &[MatchedObservation],
        ctx: &EngineContext<'_>,
    ) -> Result<MethodEvaluation, OmaError> {
        let frequencies: Vec<f64> = group.iter().map(|obs| obs.frequency).collect();
        let macs: Vec<f64> = group.iter().map(|obs| obs.mac_value).collect();

        if group.len() < 2 {
            let mut eval = MethodEvaluation::all_clear(self.kind(), group.len());
            eval.warnings.push(format!(
                "joint distance requires >= 2 observations; got {}",
                group.len()
            ));
            return Ok(eval);
        }

        let covariance = covariance_2d(&frequencies, &macs)?;
        let used_fallback = covariance.is_singular();

        let mut warnings = vec![];
        if used_fallback {
            warnings.push(
                "singular (frequency, MAC) covariance; using independent standardized distances"
                    .to_string(),
            );
        }

        let flags: Vec<MethodFlag> = group
            .iter()
            .map(|obs| {
                let distance = if used_fallback {
                    covariance.standardized_distance(obs.frequency, obs.mac_value)
                } else {
                    covariance.mahalanobis(obs.frequency, obs.mac_value)
                };
                MethodFlag {
                    is_outlier: distance > self.config.distance_threshold
                        || obs.mac_value < self.config.mac_threshold,
                    metric_value: distance,
                }
            })
            .collect();

        let flagged = flags.iter().filter(|f| f.is_outlier).count();
        ctx.record_scalar("detect.joint_distance.flagged", flagged as f64);
        ctx.record_scalar(
            "detect.joint_distance.fallback",
            if used_fallback { 1.0 } else { 0.0 },
        );

        Ok(MethodEvaluation {
            kind: self.kind(),
            flags,
            warnings,
            used_fallback,
        })
    }
}
