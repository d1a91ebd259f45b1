// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Outlier-detection methods over one matched mode group, plus the ensemble
//! combiner that merges their votes.
//!
//! Each method is a [`DetectionMethod`]: uniform input (read-only
//! observation group + its own configuration), uniform output (per-point
//! flag and metric). Methods are stateless with respect to each other and
//! may run concurrently; adding a fourth method touches nothing in the
//! combiner.

pub mod deviation;
pub mod ensemble;
pub mod joint;
pub mod trend;

pub use deviation::DeviationScore;
pub use ensemble::{EnsembleRecord, combine};
pub use joint::JointDistance;
pub use trend::TrendFit;

use oma_core::{EngineContext, MatchedObservation, MethodFlag, MethodKind, ModeAnalysisConfig, OmaError};

/// Per-group output of one detection method.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodEvaluation {
    pub kind: MethodKind,
    /// One flag per observation, in group order.
    pub flags: Vec<MethodFlag>,
    /// Degenerate-but-recoverable conditions hit during evaluation.
    pub warnings: Vec<String>,
    /// True when the method downgraded to a recorded fallback computation.
    pub used_fallback: bool,
}

impl MethodEvaluation {
    /// Evaluation with every observation unflagged and a zero metric.
    pub fn all_clear(kind: MethodKind, len: usize) -> Self {
        Self {
            kind,
            flags: vec![
                MethodFlag {
                    is_outlier: false,
                    metric_value: 0.0,
                };
                len
            ],
            warnings: vec![],
            used_fallback: false,
        }
    }
}

/// One outlier-detection method over a matched mode group.
///
/// `InsufficientData` means the method cannot vote for this group; the
/// caller records the skip and the remaining methods still vote.
pub trait DetectionMethod: Send + Sync {
    fn kind(&self) -> MethodKind;

    fn evaluate(
        &self,
        group: &[MatchedObservation],
        ctx: &EngineContext<'_>,
    ) -> Result<MethodEvaluation, OmaError>;
}

/// The three standard methods configured for one mode analysis, in fixed
/// reporting order.
pub fn standard_methods(
    config: &ModeAnalysisConfig,
) -> Result<Vec<Box<dyn DetectionMethod>>, OmaError> {
    Ok(vec![
        Box::new(DeviationScore::new(config.deviation_score.clone())?),
        Box::new(TrendFit::new(config.trend_fit.clone())?),
        Box::new(JointDistance::new(config.joint_distance.clone())?),
    ])
}
