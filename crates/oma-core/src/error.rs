// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Unified error type for the modal outlier engine.
///
/// `ShapeMismatch` and `DegenerateShape` are fatal for a single candidate
/// only; `InsufficientData` is fatal for a single method on a single group.
/// Callers record these and continue the run.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum OmaError {
    #[error("mode shape length mismatch: got {got}, expected {expected}")]
    ShapeMismatch { got: usize, expected: usize },

    #[error("degenerate mode shape: squared norm {norm_sq} is below tolerance")]
    DegenerateShape { norm_sq: f64 },

    #[error("{0}")]
    InsufficientData(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NumericalIssue(String),
}

impl OmaError {
    pub fn shape_mismatch(got: usize, expected: usize) -> Self {
        Self::ShapeMismatch { got, expected }
    }

    pub fn degenerate_shape(norm_sq: f64) -> Self {
        Self::DegenerateShape { norm_sq }
    }

    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }
}
