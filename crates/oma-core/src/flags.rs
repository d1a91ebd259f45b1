// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// The three outlier-detection methods the engine can run on a mode group.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MethodKind {
    DeviationScore,
    TrendFit,
    JointDistance,
}

impl MethodKind {
    /// Stable lowercase name used in telemetry keys and summary notes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeviationScore => "deviation_score",
            Self::TrendFit => "trend_fit",
            Self::JointDistance => "joint_distance",
        }
    }
}

/// One method's verdict on one observation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MethodFlag {
    pub is_outlier: bool,
    /// z-score, signed band distance, or Mahalanobis distance, depending on
    /// the method that produced it.
    pub metric_value: f64,
}

/// Classification of an observation after the ensemble combiner has merged
/// every method's vote.
///
/// `Combined` implies at least two methods flagged the same observation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutlierType {
    #[default]
    None,
    DeviationScore,
    TrendFit,
    JointDistance,
    Combined,
}

impl OutlierType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::DeviationScore => "deviation_score",
            Self::TrendFit => "trend_fit",
            Self::JointDistance => "joint_distance",
            Self::Combined => "combined",
        }
    }

    /// Maps a single flagging method onto its outlier type.
    pub fn from_single_method(kind: MethodKind) -> Self {
        match kind {
            MethodKind::DeviationScore => Self::DeviationScore,
            MethodKind::TrendFit => Self::TrendFit,
            MethodKind::JointDistance => Self::JointDistance,
        }
    }
}
