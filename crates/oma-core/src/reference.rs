// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::OmaError;

/// Squared-norm floor below which a shape is considered degenerate.
pub const SHAPE_NORM_TOLERANCE: f64 = 1.0e-12;

/// One canonical reference shape for a sub-mode, e.g. "6.2".
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceModeShape {
    pub sub_mode_label: String,
    pub shape: Vec<f64>,
}

/// The immutable set of reference shapes for one integer mode number.
///
/// Loaded once at engine initialization; all shapes share one fixed channel
/// order and length.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceShapeSet {
    pub mode_number: u32,
    pub shapes: Vec<ReferenceModeShape>,
}

impl ReferenceShapeSet {
    /// Constructs a validated reference set.
    pub fn new(mode_number: u32, shapes: Vec<ReferenceModeShape>) -> Result<Self, OmaError> {
        if mode_number == 0 {
            return Err(OmaError::invalid_input("mode_number must be >= 1; got 0"));
        }
        if shapes.is_empty() {
            return Err(OmaError::invalid_input(format!(
                "reference set for mode {mode_number} must contain at least one shape"
            )));
        }

        let expected_len = shapes[0].shape.len();
        if expected_len == 0 {
            return Err(OmaError::invalid_input(
                "reference shapes must have at least one channel",
            ));
        }

        for reference in &shapes {
            if reference.sub_mode_label.is_empty() {
                return Err(OmaError::invalid_input(
                    "reference sub_mode_label must not be empty",
                ));
            }
            if reference.shape.len() != expected_len {
                return Err(OmaError::shape_mismatch(reference.shape.len(), expected_len));
            }
            if let Some((idx, val)) = reference
                .shape
                .iter()
                .copied()
                .enumerate()
                .find(|(_, v)| !v.is_finite())
            {
                return Err(OmaError::invalid_input(format!(
                    "reference shape '{}' must contain only finite components: index {idx} has {val}",
                    reference.sub_mode_label
                )));
            }
            let norm_sq = reference.shape.iter().map(|v| v * v).sum::<f64>();
            if norm_sq < SHAPE_NORM_TOLERANCE {
                return Err(OmaError::degenerate_shape(norm_sq));
            }
        }

        for (idx, reference) in shapes.iter().enumerate() {
            if shapes[..idx]
                .iter()
                .any(|other| other.sub_mode_label == reference.sub_mode_label)
            {
                return Err(OmaError::invalid_input(format!(
                    "duplicate reference sub_mode_label '{}'",
                    reference.sub_mode_label
                )));
            }
        }

        Ok(Self { mode_number, shapes })
    }

    /// Channel count shared by every shape in the set.
    pub fn channel_count(&self) -> usize {
        self.shapes[0].shape.len()
    }
}
