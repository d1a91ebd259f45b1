// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use oma_core::{MatchedObservation, OmaError, OutlierType};
use oma_detect::EnsembleRecord;

/// One flat report row, suitable for direct tabular serialization.
///
/// Per-method metrics are carried even when the method did not flag the
/// point; `None` means the method did not vote for this group.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRecord {
    pub segment_id: u32,
    pub sub_mode_label: String,
    pub frequency: f64,
    pub damping_ratio: f64,
    pub mac_value: f64,
    pub detection_percentage: f64,
    pub z_score: Option<f64>,
    pub trend_band_distance: Option<f64>,
    pub joint_distance: Option<f64>,
    pub is_outlier: bool,
    pub outlier_type: OutlierType,
    pub distance_from_mean: f64,
    /// True when the joint metric came from the univariate fallback.
    pub joint_fallback: bool,
}

/// Joins observations with their ensemble verdicts into report rows,
/// stably ordered by `(segment_id, sub_mode_label)`.
///
/// Performs no statistical computation; this is a pure serialization
/// boundary.
pub fn assemble(
    group: &[MatchedObservation],
    ensemble: &[EnsembleRecord],
    joint_fallback: bool,
) -> Result<Vec<ReportRecord>, OmaError> {
    if group.len() != ensemble.len() {
        return Err(OmaError::invalid_input(format!(
            "ensemble records ({}) do not match observation group ({})",
            ensemble.len(),
            group.len()
        )));
    }

    let mut records: Vec<ReportRecord> = group
        .iter()
        .zip(ensemble)
        .map(|(obs, verdict)| ReportRecord {
            segment_id: obs.segment_id,
            sub_mode_label: obs.sub_mode_label.clone(),
            frequency: obs.frequency,
            damping_ratio: obs.damping_ratio,
            mac_value: obs.mac_value,
            detection_percentage: obs.detection_percentage,
            z_score: verdict.z_score,
            trend_band_distance: verdict.trend_band_distance,
            joint_distance: verdict.joint_distance,
            is_outlier: verdict.is_outlier,
            outlier_type: verdict.outlier_type,
            distance_from_mean: verdict.distance_from_mean,
            joint_fallback,
        })
        .collect();

    records.sort_by(|left, right| {
        left.segment_id
            .cmp(&right.segment_id)
            .then_with(|| left.sub_mode_label.cmp(&right.sub_mode_label))
    });
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::assemble;
    use oma_core::{MatchedObservation, OutlierType};
    use oma_detect::EnsembleRecord;

    fn observation(segment_id: u32, label: &str) -> MatchedObservation {
        MatchedObservation {
            segment_id,
            frequency: 25.0,
            damping_ratio: 0.01,
            mode_shape: vec![1.0, 0.0],
            detection_percentage: 0.8,
            sub_mode_label: label.to_string(),
            mac_value: 0.9,
        }
    }

    fn verdict(segment_id: u32, label: &str) -> EnsembleRecord {
        EnsembleRecord {
            segment_id,
            sub_mode_label: label.to_string(),
            is_outlier: false,
            outlier_type: OutlierType::None,
            distance_from_mean: 0.0,
            z_score: Some(0.1),
            trend_band_distance: None,
            joint_distance: Some(0.5),
        }
    }

    #[test]
    fn records_are_ordered_by_segment_then_label() {
        let group = vec![
            observation(3, "6.1"),
            observation(1, "6.2"),
            observation(1, "6.1"),
            observation(2, "6.3"),
        ];
        let ensemble = vec![
            verdict(3, "6.1"),
            verdict(1, "6.2"),
            verdict(1, "6.1"),
            verdict(2, "6.3"),
        ];

        let records = assemble(&group, &ensemble, false).expect("assemble should succeed");
        let order: Vec<(u32, &str)> = records
            .iter()
            .map(|r| (r.segment_id, r.sub_mode_label.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![(1, "6.1"), (1, "6.2"), (2, "6.3"), (3, "6.1")]
        );
    }

    #[test]
    fn metrics_and_flags_are_carried_through() {
        let group = vec![observation(1, "6.1")];
        let ensemble = vec![verdict(1, "6.1")];
        let records = assemble(&group, &ensemble, true).expect("assemble should succeed");

        let record = &records[0];
        assert_eq!(record.z_score, Some(0.1));
        assert_eq!(record.trend_band_distance, None);
        assert_eq!(record.joint_distance, Some(0.5));
        assert!(record.joint_fallback);
        assert_eq!(record.outlier_type, OutlierType::None);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let group = vec![observation(1, "6.1")];
        let err = assemble(&group, &[], false).expect_err("length mismatch must fail");
        assert!(err.to_string().contains("ensemble records"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn report_record_serde_roundtrip() {
        let group = vec![observation(5, "6.2")];
        let ensemble = vec![verdict(5, "6.2")];
        let records = assemble(&group, &ensemble, false).expect("assemble should succeed");

        let encoded = serde_json::to_string(&records).expect("records should serialize");
        let decoded: Vec<super::ReportRecord> =
            serde_json::from_str(&encoded).expect("records should deserialize");
        assert_eq!(decoded, records);
    }
}
