// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::mac::mac;
use oma_core::{
    EngineContext, MatchedObservation, ModeCandidate, OmaError, ReferenceShapeSet, UnmatchReason,
    UnmatchedCandidate,
};

/// Result of running the matcher over a batch of candidates.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedObservation>,
    pub unmatched: Vec<UnmatchedCandidate>,
}

/// Assigns each candidate the sub-mode label of the reference shape with the
/// highest MAC, or records why the candidate could not be matched.
///
/// Candidate-level failures (`ShapeMismatch`, `DegenerateShape`, MAC below
/// the minimum-match threshold) exclude that candidate only; the batch
/// continues.
#[derive(Clone, Debug)]
pub struct MacMatcher<'a> {
    references: &'a ReferenceShapeSet,
    mac_min_match: f64,
}

impl<'a> MacMatcher<'a> {
    pub fn new(references: &'a ReferenceShapeSet, mac_min_match: f64) -> Result<Self, OmaError> {
        if !(0.0..=1.0).contains(&mac_min_match) {
            return Err(OmaError::invalid_input(format!(
                "mac_min_match must be in [0, 1]; got {mac_min_match}"
            )));
        }
        Ok(Self {
            references,
            mac_min_match,
        })
    }

    /// Best reference for one candidate shape: `(label, mac)` of the highest
    /// MAC, ties broken by declaration order.
    fn best_reference(&self, shape: &[f64]) -> Result<(String, f64), OmaError> {
        let mut best: Option<(&str, f64)> = None;
        for reference in &self.references.shapes {
            let value = mac(shape, &reference.shape)?;
            let better = match best {
                Some((_, current)) => value > current,
                None => true,
            };
            if better {
                best = Some((reference.sub_mode_label.as_str(), value));
            }
        }
        // The reference set is validated non-empty at construction.
        let (label, value) = best.ok_or_else(|| {
            OmaError::invalid_input("reference set must contain at least one shape")
        })?;
        Ok((label.to_string(), value))
    }

    /// Labels a batch of candidates against the reference set.
    pub fn match_candidates(
        &self,
        candidates: Vec<ModeCandidate>,
        ctx: &EngineContext<'_>,
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();

        for candidate in candidates {
            match self.best_reference(&candidate.mode_shape) {
                Ok((label, value)) if value >= self.mac_min_match => {
                    outcome
                        .matched
                        .push(MatchedObservation::from_candidate(candidate, label, value));
                }
                Ok((_, value)) => {
                    outcome.unmatched.push(UnmatchedCandidate {
                        segment_id: candidate.segment_id,
                        reason: UnmatchReason::BelowMacThreshold { best_mac: value },
                    });
                }
                Err(OmaError::ShapeMismatch { got, expected }) => {
                    outcome.unmatched.push(UnmatchedCandidate {
                        segment_id: candidate.segment_id,
                        reason: UnmatchReason::ShapeMismatch { got, expected },
                    });
                }
                Err(OmaError::DegenerateShape { .. }) => {
                    outcome.unmatched.push(UnmatchedCandidate {
                        segment_id: candidate.segment_id,
                        reason: UnmatchReason::DegenerateShape,
                    });
                }
                Err(_) => {
                    // Remaining failure modes are numeric; record as
                    // degenerate rather than aborting the batch.
                    outcome.unmatched.push(UnmatchedCandidate {
                        segment_id: candidate.segment_id,
                        reason: UnmatchReason::DegenerateShape,
                    });
                }
            }
        }

        ctx.record_scalar("match.matched", outcome.matched.len() as f64);
        ctx.record_scalar("match.unmatched", outcome.unmatched.len() as f64);
        outcome
    }
}
