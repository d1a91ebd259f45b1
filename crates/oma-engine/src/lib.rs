// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Deterministic mode-analysis pipeline: reference matching, optional
//! best-candidate selection, parallel outlier-method evaluation, ensemble
//! combination, and report assembly.
//!
//! `analyze_mode` is a pure function of `(config, candidates)`; distinct
//! mode numbers are independent and `analyze_modes` evaluates them in
//! parallel with order-preserving aggregation.

pub mod report;

pub use report::{ReportRecord, assemble};

use oma_core::{
    EngineContext, MethodKind, MethodReport, MethodStatus, ModeAnalysisConfig, ModeCandidate,
    OmaError, RunSummary,
};
use oma_detect::{MethodEvaluation, combine, standard_methods};
use oma_match::{MacMatcher, MatchOutcome, select_best_per_segment};
use rayon::prelude::*;
use std::time::Instant;

/// Ordered report records plus the run-level summary for one mode number.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ModeAnalysisReport {
    pub records: Vec<ReportRecord>,
    pub summary: RunSummary,
}

fn record_method_outcome(
    summary: &mut RunSummary,
    kind: MethodKind,
    outcome: Result<MethodEvaluation, OmaError>,
    ran: &mut Vec<MethodEvaluation>,
) {
    match outcome {
        Ok(evaluation) => {
            let status = if evaluation.warnings.is_empty() {
                MethodStatus::Ran
            } else {
                MethodStatus::RanWithWarning(evaluation.warnings.join("; "))
            };
            summary
                .warnings
                .extend(evaluation.warnings.iter().map(|warning| {
                    format!("{}: {warning}", kind.as_str())
                }));
            if evaluation.used_fallback {
                summary.joint_fallback = true;
            }
            summary.method_status.push(MethodReport { kind, status });
            ran.push(evaluation);
        }
        Err(err) => {
            summary.warnings.push(format!("{} skipped: {err}", kind.as_str()));
            summary.method_status.push(MethodReport {
                kind,
                status: MethodStatus::Skipped(err.to_string()),
            });
        }
    }
}

/// Runs the full pipeline for one mode number.
///
/// Candidate-level failures and per-method skips never abort the run; the
/// worst case is a valid report with zero outlier votes. Only an invalid
/// configuration is an error.
pub fn analyze_mode(
    config: &ModeAnalysisConfig,
    candidates: Vec<ModeCandidate>,
    ctx: &EngineContext<'_>,
) -> Result<ModeAnalysisReport, OmaError> {
    config.validate()?;
    let started_at = Instant::now();

    let mut summary = RunSummary::new(config.references.mode_number);
    summary.candidates_in = candidates.len();

    let matcher = MacMatcher::new(&config.references, config.mac_min_match)?;
    let MatchOutcome { matched, unmatched } = matcher.match_candidates(candidates, ctx);
    summary.unmatched = unmatched;

    let matched = if config.best_mac_only {
        let (kept, stats) = select_best_per_segment(matched, ctx);
        summary.notes.push(format!(
            "best_mac_only: removed {} dominated candidate(s) across {} segment(s)",
            stats.total_removed,
            stats.removed_per_segment.len()
        ));
        summary.selector = Some(stats);
        kept
    } else {
        matched
    };
    summary.matched = matched.len();

    // The methods are stateless with respect to each other; each receives a
    // read-only view of the group and votes independently.
    let methods = standard_methods(config)?;
    let evaluations: Vec<(MethodKind, Result<MethodEvaluation, OmaError>)> = methods
        .par_iter()
        .map(|method| (method.kind(), method.evaluate(&matched, ctx)))
        .collect();

    let mut ran = Vec::with_capacity(evaluations.len());
    for (kind, outcome) in evaluations {
        record_method_outcome(&mut summary, kind, outcome, &mut ran);
    }

    let ensemble = combine(&matched, &ran)?;
    let records = assemble(&matched, &ensemble, summary.joint_fallback)?;

    let outliers = records.iter().filter(|record| record.is_outlier).count();
    summary.notes.push(format!(
        "matched={}, unmatched={}, outliers={}",
        summary.matched,
        summary.unmatched.len(),
        outliers
    ));

    let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    summary.runtime_ms = Some(runtime_ms);
    ctx.record_scalar("engine.outliers", outliers as f64);
    ctx.record_scalar("engine.runtime_ms", runtime_ms as f64);
    ctx.report_progress(1.0);

    Ok(ModeAnalysisReport { records, summary })
}

/// Analyzes several independent mode groups in parallel.
///
/// Reports come back in input order; the aggregation here is the only
/// shared accumulation point across mode groups.
pub fn analyze_modes(
    runs: Vec<(ModeAnalysisConfig, Vec<ModeCandidate>)>,
    ctx: &EngineContext<'_>,
) -> Result<Vec<ModeAnalysisReport>, OmaError> {
    runs.into_par_iter()
        .map(|(config, candidates)| analyze_mode(&config, candidates, ctx))
        .collect()
}
