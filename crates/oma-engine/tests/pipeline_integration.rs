// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use oma_core::{
    EngineContext, MethodKind, MethodStatus, ModeAnalysisConfig, ModeCandidate, OutlierType,
    ReferenceModeShape, ReferenceShapeSet, UnmatchReason,
};
use oma_engine::{analyze_mode, analyze_modes};

/// References 6.1/6.2/6.3 as unit axes over four sensor channels; the
/// fourth channel is covered by no reference, which lets a candidate's best
/// MAC be dialed in exactly.
fn references(mode_number: u32) -> ReferenceShapeSet {
    let axis = |label: &str, channel: usize| ReferenceModeShape {
        sub_mode_label: label.to_string(),
        shape: (0..4)
            .map(|idx| if idx == channel { 1.0 } else { 0.0 })
            .collect(),
    };
    ReferenceShapeSet::new(
        mode_number,
        vec![axis("6.1", 0), axis("6.2", 1), axis("6.3", 2)],
    )
    .expect("reference set should be valid")
}

/// Unit-norm shape whose MAC against reference 6.1 is exactly `target` and
/// below `target` against 6.2/6.3.
fn shape_with_best_mac(target: f64) -> Vec<f64> {
    let spill = (1.0 - target) / 3.0;
    vec![target.sqrt(), spill.sqrt(), spill.sqrt(), spill.sqrt()]
}

fn candidate(segment_id: u32, frequency: f64, shape: Vec<f64>) -> ModeCandidate {
    ModeCandidate::new(segment_id, frequency, 0.015, shape, 0.85)
        .expect("candidate should be valid")
}

fn scenario_config() -> ModeAnalysisConfig {
    let mut config = ModeAnalysisConfig::new(references(6));
    config.trend_fit.polynomial_degree = 1;
    config.joint_distance.mac_threshold = 0.35;
    config
}

/// Ten segments tightly at 25.0 Hz with MAC 0.4, except segment 7 at
/// 30.0 Hz with MAC 0.3: every method must flag segment 7 and only it.
fn scenario_candidates() -> Vec<ModeCandidate> {
    (1..=10_u32)
        .map(|segment| {
            if segment == 7 {
                // 0.3 on 6.1, 0.2 elsewhere, 0.3 spilled into channel 4.
                candidate(
                    segment,
                    30.0,
                    vec![0.3_f64.sqrt(), 0.2_f64.sqrt(), 0.2_f64.sqrt(), 0.3_f64.sqrt()],
                )
            } else {
                candidate(segment, 25.0, shape_with_best_mac(0.4))
            }
        })
        .collect()
}

#[test]
fn anomalous_segment_is_combined_and_all_others_are_none() {
    let report = analyze_mode(
        &scenario_config(),
        scenario_candidates(),
        &EngineContext::new(),
    )
    .expect("scenario should succeed");

    assert_eq!(report.records.len(), 10);
    for record in &report.records {
        assert_eq!(record.sub_mode_label, "6.1");
        if record.segment_id == 7 {
            assert!(record.is_outlier);
            assert_eq!(record.outlier_type, OutlierType::Combined);
        } else {
            assert!(!record.is_outlier, "segment {} wrongly flagged", record.segment_id);
            assert_eq!(record.outlier_type, OutlierType::None);
        }
    }
}

#[test]
fn every_method_votes_against_the_anomalous_segment() {
    let report = analyze_mode(
        &scenario_config(),
        scenario_candidates(),
        &EngineContext::new(),
    )
    .expect("scenario should succeed");

    let seg7 = report
        .records
        .iter()
        .find(|r| r.segment_id == 7)
        .expect("segment 7 should be in the report");

    let z = seg7.z_score.expect("deviation score should have voted");
    assert!(z > 2.0, "z-score {z} should exceed the threshold");

    let band = seg7
        .trend_band_distance
        .expect("trend fit should have voted");
    assert!(band > 0.0, "band distance {band} should be above the upper edge");

    let distance = seg7
        .joint_distance
        .expect("joint distance should have voted");
    assert!(distance > 3.0, "joint distance {distance} should exceed the threshold");
    assert!(seg7.mac_value < 0.35);

    assert!(seg7.distance_from_mean > 2.0);
}

#[test]
fn two_point_frequency_mac_pattern_uses_the_recorded_fallback() {
    let report = analyze_mode(
        &scenario_config(),
        scenario_candidates(),
        &EngineContext::new(),
    )
    .expect("scenario should succeed");

    // Inliers are identical in both dimensions, so the (frequency, MAC)
    // covariance is rank deficient.
    assert!(report.summary.joint_fallback);
    assert!(report.records.iter().all(|r| r.joint_fallback));

    let joint = report
        .summary
        .method_status
        .iter()
        .find(|m| m.kind == MethodKind::JointDistance)
        .expect("joint method should be reported");
    assert!(matches!(joint.status, MethodStatus::RanWithWarning(_)));
}

#[test]
fn summary_accounts_for_every_candidate() {
    let report = analyze_mode(
        &scenario_config(),
        scenario_candidates(),
        &EngineContext::new(),
    )
    .expect("scenario should succeed");

    assert_eq!(report.summary.mode_number, 6);
    assert_eq!(report.summary.candidates_in, 10);
    assert_eq!(report.summary.matched, 10);
    assert!(report.summary.unmatched.is_empty());
    assert!(report.summary.runtime_ms.is_some());
    assert_eq!(report.summary.method_status.len(), 3);
}

#[test]
fn best_mac_only_collapses_each_segment_to_its_strongest_candidate() {
    let mut config = scenario_config();
    config.best_mac_only = true;

    let mut candidates = scenario_candidates();
    // Segment 1 gains two extra, weaker interpretations.
    candidates.push(candidate(1, 25.05, shape_with_best_mac(0.9)));
    candidates.push(candidate(1, 24.95, shape_with_best_mac(0.6)));

    let report = analyze_mode(&config, candidates, &EngineContext::new())
        .expect("selection run should succeed");

    assert_eq!(report.records.len(), 10);
    let stats = report
        .summary
        .selector
        .as_ref()
        .expect("selector stats should be present");
    assert_eq!(stats.total_removed, 2);
    assert_eq!(stats.removed_per_segment.get(&1), Some(&2));
    assert_eq!(stats.wins_per_label.get("6.1"), Some(&10));

    let seg1 = report
        .records
        .iter()
        .find(|r| r.segment_id == 1)
        .expect("segment 1 should survive");
    assert!((seg1.mac_value - 0.9).abs() < 1e-9);
}

#[test]
fn trend_fit_skips_small_groups_while_other_methods_vote() {
    let config = ModeAnalysisConfig::new(references(6));
    // Default degree 2 needs n > 3; give it exactly 3.
    let candidates = vec![
        candidate(1, 25.0, shape_with_best_mac(0.8)),
        candidate(2, 25.1, shape_with_best_mac(0.82)),
        candidate(3, 24.9, shape_with_best_mac(0.78)),
    ];

    let report = analyze_mode(&config, candidates, &EngineContext::new())
        .expect("small group should still succeed");

    let trend = report
        .summary
        .method_status
        .iter()
        .find(|m| m.kind == MethodKind::TrendFit)
        .expect("trend method should be reported");
    assert!(matches!(trend.status, MethodStatus::Skipped(_)));

    for record in &report.records {
        assert!(record.trend_band_distance.is_none());
        assert!(record.z_score.is_some());
        assert!(record.joint_distance.is_some());
    }
}

#[test]
fn unmatched_candidates_are_excluded_with_reasons() {
    let mut config = scenario_config();
    config.mac_min_match = 0.3;

    let mut candidates = scenario_candidates();
    // Wrong channel count.
    candidates.push(candidate(11, 25.0, vec![1.0, 0.0, 0.0]));
    // All energy in the uncovered fourth channel: MAC 0 everywhere.
    candidates.push(candidate(12, 25.0, vec![0.0, 0.0, 0.0, 1.0]));

    let report = analyze_mode(&config, candidates, &EngineContext::new())
        .expect("run should succeed despite exclusions");

    assert_eq!(report.summary.candidates_in, 12);
    assert_eq!(report.summary.matched, 10);
    assert_eq!(report.summary.unmatched.len(), 2);
    assert_eq!(
        report.summary.matched + report.summary.unmatched.len(),
        report.summary.candidates_in
    );

    let reasons: Vec<&UnmatchReason> = report
        .summary
        .unmatched
        .iter()
        .map(|u| &u.reason)
        .collect();
    assert!(matches!(
        reasons[0],
        UnmatchReason::ShapeMismatch { got: 3, expected: 4 }
    ));
    assert!(matches!(
        reasons[1],
        UnmatchReason::BelowMacThreshold { .. }
    ));

    assert!(report.records.iter().all(|r| r.segment_id <= 10));
}

#[test]
fn independent_mode_groups_come_back_in_input_order() {
    let runs = vec![
        (scenario_config(), scenario_candidates()),
        (
            ModeAnalysisConfig::new(references(5)),
            vec![
                candidate(1, 12.0, shape_with_best_mac(0.8)),
                candidate(2, 12.1, shape_with_best_mac(0.81)),
                candidate(3, 11.9, shape_with_best_mac(0.79)),
                candidate(4, 12.05, shape_with_best_mac(0.8)),
            ],
        ),
    ];

    let reports =
        analyze_modes(runs, &EngineContext::new()).expect("parallel runs should succeed");

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].summary.mode_number, 6);
    assert_eq!(reports[1].summary.mode_number, 5);
    assert_eq!(reports[0].records.len(), 10);
    assert_eq!(reports[1].records.len(), 4);
}
