// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::flags::MethodKind;
use crate::observation::UnmatchedCandidate;
use std::collections::BTreeMap;

/// Run-summary schema version for downstream consumers.
pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

/// How one detection method fared on the group.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum MethodStatus {
    Ran,
    /// The method produced flags but hit a degenerate condition (e.g. zero
    /// variance) that prevented it from flagging anything.
    RanWithWarning(String),
    /// The method could not vote for this group and was skipped.
    Skipped(String),
}

impl MethodStatus {
    /// True when the method contributed flags to the ensemble.
    pub fn voted(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Per-method status entry, kept in fixed method order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MethodReport {
    pub kind: MethodKind,
    pub status: MethodStatus,
}

/// Diagnostics from the optional best-candidate selection stage.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorStats {
    /// Candidates removed per segment; only segments with removals appear.
    pub removed_per_segment: BTreeMap<u32, usize>,
    /// How often each sub-mode label won its segment.
    pub wins_per_label: BTreeMap<String, usize>,
    pub total_removed: usize,
}

/// Structured summary of one mode-analysis run.
///
/// Every deviation from the happy-path computation is visible here: excluded
/// candidates with reasons, skipped methods, the joint-distance fallback.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub mode_number: u32,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub candidates_in: usize,
    pub matched: usize,
    pub unmatched: Vec<UnmatchedCandidate>,
    pub selector: Option<SelectorStats>,
    pub method_status: Vec<MethodReport>,
    /// True when the joint-distance method fell back to independent
    /// per-dimension z-scores because the covariance was singular.
    pub joint_fallback: bool,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
}

impl RunSummary {
    /// Empty summary for a mode number, before any pipeline stage has run.
    pub fn new(mode_number: u32) -> Self {
        Self {
            mode_number,
            schema_version: SUMMARY_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            candidates_in: 0,
            matched: 0,
            unmatched: vec![],
            selector: None,
            method_status: vec![],
            joint_fallback: false,
            notes: vec![],
            warnings: vec![],
        }
    }
}
