// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::OmaError;
use crate::reference::ReferenceShapeSet;

const DEFAULT_MAC_MIN_MATCH: f64 = 0.1;
const DEFAULT_DEVIATION_THRESHOLD: f64 = 2.0;
const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
const DEFAULT_POLYNOMIAL_DEGREE: usize = 2;
const DEFAULT_JOINT_MAC_THRESHOLD: f64 = 0.2;
const DEFAULT_JOINT_DISTANCE_THRESHOLD: f64 = 3.0;

/// Parameters for the z-score deviation method.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DeviationScoreConfig {
    pub threshold: f64,
}

impl Default for DeviationScoreConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DEVIATION_THRESHOLD,
        }
    }
}

impl DeviationScoreConfig {
    pub fn validate(&self) -> Result<(), OmaError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(OmaError::invalid_input(format!(
                "DeviationScoreConfig.threshold must be finite and > 0.0; got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Parameters for the polynomial trend-fit band method.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TrendFitConfig {
    pub confidence_level: f64,
    pub polynomial_degree: usize,
}

impl Default for TrendFitConfig {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            polynomial_degree: DEFAULT_POLYNOMIAL_DEGREE,
        }
    }
}

impl TrendFitConfig {
    pub fn validate(&self) -> Result<(), OmaError> {
        if !self.confidence_level.is_finite()
            || self.confidence_level <= 0.0
            || self.confidence_level >= 1.0
        {
            return Err(OmaError::invalid_input(format!(
                "TrendFitConfig.confidence_level must be in (0, 1); got {}",
                self.confidence_level
            )));
        }
        if self.polynomial_degree == 0 {
            return Err(OmaError::invalid_input(
                "TrendFitConfig.polynomial_degree must be >= 1; got 0",
            ));
        }
        Ok(())
    }
}

/// Parameters for the joint (frequency, MAC) distance method.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct JointDistanceConfig {
    pub mac_threshold: f64,
    pub distance_threshold: f64,
}

impl Default for JointDistanceConfig {
    fn default() -> Self {
        Self {
            mac_threshold: DEFAULT_JOINT_MAC_THRESHOLD,
            distance_threshold: DEFAULT_JOINT_DISTANCE_THRESHOLD,
        }
    }
}

impl JointDistanceConfig {
    pub fn validate(&self) -> Result<(), OmaError> {
        if !(0.0..=1.0).contains(&self.mac_threshold) {
            return Err(OmaError::invalid_input(format!(
                "JointDistanceConfig.mac_threshold must be in [0, 1]; got {}",
                self.mac_threshold
            )));
        }
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(OmaError::invalid_input(format!(
                "JointDistanceConfig.distance_threshold must be finite and > 0.0; got {}",
                self.distance_threshold
            )));
        }
        Ok(())
    }
}

/// Full configuration for one mode-number analysis run.
///
/// Passed explicitly into every stage entry point; per-mode parallel runs
/// never share ambient state.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ModeAnalysisConfig {
    pub references: ReferenceShapeSet,
    pub mac_min_match: f64,
    pub best_mac_only: bool,
    pub deviation_score: DeviationScoreConfig,
    pub trend_fit: TrendFitConfig,
    pub joint_distance: JointDistanceConfig,
}

impl ModeAnalysisConfig {
    /// Configuration with method defaults for the given reference set.
    pub fn new(references: ReferenceShapeSet) -> Self {
        Self {
            references,
            mac_min_match: DEFAULT_MAC_MIN_MATCH,
            best_mac_only: false,
            deviation_score: DeviationScoreConfig::default(),
            trend_fit: TrendFitConfig::default(),
            joint_distance: JointDistanceConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), OmaError> {
        if !(0.0..=1.0).contains(&self.mac_min_match) {
            return Err(OmaError::invalid_input(format!(
                "ModeAnalysisConfig.mac_min_match must be in [0, 1]; got {}",
                self.mac_min_match
            )));
        }
        self.deviation_score.validate()?;
        self.trend_fit.validate()?;
        self.joint_distance.validate()?;
        Ok(())
    }
}
