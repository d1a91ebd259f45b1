// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::MethodEvaluation;
use oma_core::stats::{mean, sample_std, standardized, variance_tolerance};
use oma_core::{MatchedObservation, MethodKind, OmaError, OutlierType};

/// One observation's combined verdict across every method that voted.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleRecord {
    pub segment_id: u32,
    pub sub_mode_label: String,
    pub is_outlier: bool,
    pub outlier_type: OutlierType,
    /// Standardized distance of the frequency from the group mean, in
    /// group standard-deviation units. A reporting metric, not a vote.
    pub distance_from_mean: f64,
    /// Per-method metric values, `None` when that method did not vote.
    pub z_score: Option<f64>,
    pub trend_band_distance: Option<f64>,
    pub joint_distance: Option<f64>,
}

fn metric_slot<'a>(
    record: &'a mut EnsembleRecord,
    kind: MethodKind,
) -> &'a mut Option<f64> {
    match kind {
        MethodKind::DeviationScore => &mut record.z_score,
        MethodKind::TrendFit => &mut record.trend_band_distance,
        MethodKind::JointDistance => &mut record.joint_distance,
    }
}

/// Merges the boolean flags of every method that voted into per-observation
/// ensemble records.
///
/// Order-independent by construction: the union and the flag count do not
/// depend on the order of `evaluations`.
pub fn combine(
    group: &[MatchedObservation],
    evaluations: &[MethodEvaluation],
) -> Result<Vec<EnsembleRecord>, OmaError> {
    for evaluation in evaluations {
        if evaluation.flags.len() != group.len() {
            return Err(OmaError::invalid_input(format!(
                "method {} produced {} flags for a group of {}",
                evaluation.kind.as_str(),
                evaluation.flags.len(),
                group.len()
            )));
        }
    }
    for (idx, evaluation) in evaluations.iter().enumerate() {
        if evaluations[..idx]
            .iter()
            .any(|other| other.kind == evaluation.kind)
        {
            return Err(OmaError::invalid_input(format!(
                "duplicate evaluation for method {}",
                evaluation.kind.as_str()
            )));
        }
    }

    let frequencies: Vec<f64> = group.iter().map(|obs| obs.frequency).collect();
    let group_mean = mean(&frequencies).unwrap_or(0.0);
    let group_std = sample_std(&frequencies)
        .filter(|std| std * std > variance_tolerance(&frequencies))
        .unwrap_or(0.0);

    let records = group
        .iter()
        .enumerate()
        .map(|(idx, obs)| {
            let mut record = EnsembleRecord {
                segment_id: obs.segment_id,
                sub_mode_label: obs.sub_mode_label.clone(),
                is_outlier: false,
                outlier_type: OutlierType::None,
                distance_from_mean: standardized(obs.frequency, group_mean, group_std),
                z_score: None,
                trend_band_distance: None,
                joint_distance: None,
            };

            let mut flagging_kind = None;
            let mut flag_count = 0_usize;
            for evaluation in evaluations {
                let flag = evaluation.flags[idx];
                *metric_slot(&mut record, evaluation.kind) = Some(flag.metric_value);
                if flag.is_outlier {
                    flag_count += 1;
                    flagging_kind = Some(evaluation.kind);
                }
            }

            record.is_outlier = flag_count > 0;
            record.outlier_type = match (flag_count, flagging_kind) {
                (0, _) => OutlierType::None,
                (1, Some(kind)) => OutlierType::from_single_method(kind),
                _ => OutlierType::Combined,
            };
            record
        })
        .collect();

    Ok(records)
}
