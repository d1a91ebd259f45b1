// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! MAC-based matching of candidate mode shapes against reference sub-modes,
//! plus the optional per-segment best-candidate selection stage.

pub mod mac;
pub mod matcher;
pub mod selector;

pub use mac::mac;
pub use matcher::{MacMatcher, MatchOutcome};
pub use selector::select_best_per_segment;
