// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use oma_core::{EngineContext, MatchedObservation, SelectorStats};
use std::collections::BTreeMap;

/// Collapses each segment's candidates to the single highest-MAC
/// observation.
///
/// This is a pure filter: values are never modified, dominated candidates
/// are removed. Ties on MAC break toward the lexicographically smaller
/// sub-mode label so the outcome never depends on input order.
pub fn select_best_per_segment(
    observations: Vec<MatchedObservation>,
    ctx: &EngineContext<'_>,
) -> (Vec<MatchedObservation>, SelectorStats) {
    let mut by_segment: BTreeMap<u32, Vec<MatchedObservation>> = BTreeMap::new();
    for obs in observations {
        by_segment.entry(obs.segment_id).or_default().push(obs);
    }

    let mut stats = SelectorStats::default();
    let mut kept = Vec::with_capacity(by_segment.len());

    for (segment_id, mut group) in by_segment {
        group.sort_by(|left, right| {
            right
                .mac_value
                .total_cmp(&left.mac_value)
                .then_with(|| left.sub_mode_label.cmp(&right.sub_mode_label))
        });
        let removed = group.len() - 1;
        if removed > 0 {
            stats.removed_per_segment.insert(segment_id, removed);
            stats.total_removed += removed;
        }

        let winner = group.swap_remove(0);
        *stats
            .wins_per_label
            .entry(winner.sub_mode_label.clone())
            .or_insert(0) += 1;
        kept.push(winner);
    }

    ctx.record_scalar("select.removed", stats.total_removed as f64);
    ctx.record_scalar("select.kept", kept.len() as f64);
    (kept, stats)
}
