// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use oma_core::{OmaError, SHAPE_NORM_TOLERANCE};

/// Modal Assurance Criterion between two mode-shape vectors:
/// `|aᵗb|² / ((aᵗa)(bᵗb))`, in [0, 1].
///
/// 1 means the shapes are collinear (identical up to scale and sign); 0
/// means orthogonal. Fails with `ShapeMismatch` on length disagreement and
/// `DegenerateShape` when either norm is too close to zero.
pub fn mac(a: &[f64], b: &[f64]) -> Result<f64, OmaError> {
    if a.len() != b.len() {
        return Err(OmaError::shape_mismatch(a.len(), b.len()));
    }

    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>();

    if norm_a < SHAPE_NORM_TOLERANCE {
        return Err(OmaError::degenerate_shape(norm_a));
    }
    if norm_b < SHAPE_NORM_TOLERANCE {
        return Err(OmaError::degenerate_shape(norm_b));
    }

    let value = (dot * dot) / (norm_a * norm_b);
    if !value.is_finite() {
        return Err(OmaError::numerical_issue(format!(
            "non-finite MAC: dot={dot}, norm_a={norm_a}, norm_b={norm_b}"
        )));
    }

    // Cauchy-Schwarz bounds the exact value by 1; floating point can creep
    // past it.
    Ok(value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::mac;
    use oma_core::OmaError;

    const TOLERANCE: f64 = 1.0e-12;

    #[test]
    fn identical_shapes_have_mac_one() {
        let shape = [0.3, -0.7, 1.1, 0.2];
        let value = mac(&shape, &shape).expect("MAC should be defined");
        assert!((value - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn sign_flip_is_invariant() {
        let shape = [0.3, -0.7, 1.1, 0.2];
        let flipped: Vec<f64> = shape.iter().map(|v| -v).collect();
        let value = mac(&shape, &flipped).expect("MAC should be defined");
        assert!((value - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn scaling_is_invariant() {
        let shape = [0.5, 1.0, -0.25];
        let scaled: Vec<f64> = shape.iter().map(|v| 3.5 * v).collect();
        let value = mac(&shape, &scaled).expect("MAC should be defined");
        assert!((value - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn orthogonal_shapes_have_mac_zero() {
        let value = mac(&[1.0, 0.0], &[0.0, 1.0]).expect("MAC should be defined");
        assert!(value.abs() < TOLERANCE);
    }

    #[test]
    fn mac_is_symmetric() {
        let a = [0.2, 0.9, -0.4, 0.1];
        let b = [1.0, 0.3, 0.3, -0.8];
        let ab = mac(&a, &b).expect("MAC should be defined");
        let ba = mac(&b, &a).expect("MAC should be defined");
        assert!((ab - ba).abs() < TOLERANCE);
    }

    #[test]
    fn length_mismatch_is_a_shape_error() {
        let err = mac(&[1.0, 2.0], &[1.0, 2.0, 3.0]).expect_err("length mismatch must fail");
        assert_eq!(err, OmaError::ShapeMismatch { got: 2, expected: 3 });
    }

    #[test]
    fn near_zero_norm_is_degenerate() {
        let err = mac(&[0.0, 1.0e-9], &[1.0, 0.0]).expect_err("tiny norm must fail");
        assert!(matches!(err, OmaError::DegenerateShape { .. }));
    }
}
