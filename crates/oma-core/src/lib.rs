// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Core shared types for the oma-rs modal outlier & clustering engine:
//! error taxonomy, observation/reference data model, configuration, run
//! summary, observability hooks, and scalar statistics helpers.

pub mod config;
pub mod error;
pub mod flags;
pub mod observability;
pub mod observation;
pub mod reference;
pub mod stats;
pub mod summary;

pub use config::{
    DeviationScoreConfig, JointDistanceConfig, ModeAnalysisConfig, TrendFitConfig,
};
pub use error::OmaError;
pub use flags::{MethodFlag, MethodKind, OutlierType};
pub use observability::{EngineContext, ProgressSink, TelemetrySink};
pub use observation::{MatchedObservation, ModeCandidate, UnmatchReason, UnmatchedCandidate};
pub use reference::{ReferenceModeShape, ReferenceShapeSet, SHAPE_NORM_TOLERANCE};
pub use summary::{
    MethodReport, MethodStatus, RunSummary, SUMMARY_SCHEMA_VERSION, SelectorStats,
};
