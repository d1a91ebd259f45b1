// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{DetectionMethod, MethodEvaluation};
use oma_core::stats::{mean, sample_variance, standardized, variance_tolerance};
use oma_core::{
    DeviationScoreConfig, EngineContext, MatchedObservation, MethodFlag, MethodKind, OmaError,
};

/// Z-score screen over the group's frequency distribution.
///
/// Intentionally naive: symmetric, assumes approximate normality. The trend
/// and joint methods cover its blind spots.
#[derive(Clone, Debug)]
pub struct DeviationScore {
    config: DeviationScoreConfig,
}

impl DeviationScore {
    pub fn new(config: DeviationScoreConfig) -> Result<Self, OmaError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DeviationScoreConfig {
        &self.config
    }
}

impl DetectionMethod for DeviationScore {
    fn kind(&self) -> MethodKind {
        MethodKind::DeviationScore
    }

    fn evaluate(
        &self,
        group: &[MatchedObservation],
        ctx: &EngineContext<'_>,
    ) -> Result<MethodEvaluation, OmaError> {
        let frequencies: Vec<f64> = group.iter().map(|obs| obs.frequency).collect();

        if frequencies.len() < 2 {
            let mut eval = MethodEvaluation::all_clear(self.kind(), frequencies.len());
            eval.warnings.push(format!(
                "deviation score requires >= 2 observations; got {}",
                frequencies.len()
            ));
            return Ok(eval);
        }

        let variance = sample_variance(&frequencies)
            .ok_or_else(|| OmaError::numerical_issue("sample variance unavailable"))?;
        if variance <= variance_tolerance(&frequencies) {
            let mut eval = MethodEvaluation::all_clear(self.kind(), frequencies.len());
            eval.warnings
                .push("zero frequency variance; no deviation scores computed".to_string());
            return Ok(eval);
        }

        let mu = mean(&frequencies)
            .ok_or_else(|| OmaError::numerical_issue("mean unavailable"))?;
        let std = variance.sqrt();

        let flags: Vec<MethodFlag> = frequencies
            .iter()
            .map(|&v| {
                let z = standardized(v, mu, std);
                MethodFlag {
                    is_outlier: z.abs() > self.config.threshold,
                    metric_value: z,
                }
            })
            .collect();

        let flagged = flags.iter().filter(|f| f.is_outlier).count();
        ctx.record_scalar("detect.deviation_score.flagged", flagged as f64);

        Ok(MethodEvaluation {
            kind: self.kind(),
            flags,
            warnings: vec![],
            used_fallback: false,
        })
    }
}
