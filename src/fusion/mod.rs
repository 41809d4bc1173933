// src/fusion/mod.rs
//
// Dual-angle fusion: reconciles the near-angle and far-angle ShotRecord lists
// into one fused list.
//
//   near records ─┐                     ┌─ agreement ─────────────┐
//                 ├─ matcher (offset) ──┤                         ├─▶ FusionRecord
//   far records ──┘                     └─ features → archetype ──┘
//                                          → weighted vote → overrides
//
// Near is side "A": its timestamps are shifted by the clock offset onto the
// far clock before matching. Everything reported is on the far clock.

pub mod arbiter;
pub mod archetype;
pub mod features;
pub mod matcher;

pub use arbiter::{
    FusionArbiter, FusionRecord, FusionReport, FusionStats, OverrideName, ResolutionMethod,
    SideDetail,
};
pub use archetype::{ArchetypeProfile, ShotArchetype};
pub use features::{FeatureAgreement, SideSignals};
pub use matcher::{match_records, MatchResult, MatchedPair};

use crate::error::{require_non_negative, require_positive, require_range, ConfigError};
use crate::types::CameraAngle;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMode {
    /// Singletons survive only above `singleton_threshold`
    Precision,
    /// Singletons from `recall_side` always survive
    Recall,
}

impl FusionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precision => "PRECISION",
            Self::Recall => "RECALL",
        }
    }
}

/// Rule for keeping a record that found no counterpart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SingletonPolicy {
    Precision { threshold: f32 },
    Recall { favored: CameraAngle, threshold: f32 },
}

impl SingletonPolicy {
    pub fn keeps(&self, side: CameraAngle, confidence: f32) -> bool {
        match *self {
            Self::Precision { threshold } => confidence > threshold,
            Self::Recall { favored, threshold } => side == favored || confidence > threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Max |Δt| (s) between matched records after the offset is applied
    pub window_seconds: f64,

    pub mode: FusionMode,
    pub recall_side: CameraAngle,
    pub singleton_threshold: f32,
    pub singleton_penalty: f32,

    pub agreement_boost: f32,
    /// Upper bound of every fused confidence; below 1.0
    pub confidence_ceiling: f32,

    pub disagreement_damping: f32,
    /// Share of the vote margin in a disagreement's fused confidence
    pub margin_weight: f32,
    /// Applied when a bounce was flagged on either side but MADE won
    pub bounce_made_penalty: f32,

    pub bounce_weight: f32,
    pub entry_weight: f32,
    pub swoosh_weight: f32,

    /// Upward px at or below which a side counts as low-bounce
    pub swish_max_upward_px: f32,
    /// Trajectory consistency at or above which a side has a steep entry
    pub swish_min_consistency: f32,

    /// |Δconfidence| treated as a tie
    pub tie_epsilon: f32,
    /// Below this a lone MADE yields to a confident miss
    pub override_made_max_confidence: f32,
    pub override_miss_min_confidence: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            window_seconds: 2.0,
            mode: FusionMode::Precision,
            recall_side: CameraAngle::Near,
            singleton_threshold: 0.75,
            singleton_penalty: 0.90,
            agreement_boost: 1.15,
            confidence_ceiling: 0.95,
            disagreement_damping: 0.85,
            margin_weight: 0.30,
            bounce_made_penalty: 0.70,
            bounce_weight: 0.4,
            entry_weight: 0.3,
            swoosh_weight: 0.3,
            swish_max_upward_px: 20.0,
            swish_min_consistency: 0.85,
            tie_epsilon: 0.05,
            override_made_max_confidence: 0.8,
            override_miss_min_confidence: 0.9,
        }
    }
}

impl FusionConfig {
    pub fn singleton_policy(&self) -> SingletonPolicy {
        match self.mode {
            FusionMode::Precision => SingletonPolicy::Precision {
                threshold: self.singleton_threshold,
            },
            FusionMode::Recall => SingletonPolicy::Recall {
                favored: self.recall_side,
                threshold: self.singleton_threshold,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("fusion.window_seconds", self.window_seconds)?;
        require_positive("fusion.agreement_boost", self.agreement_boost as f64)?;
        if !(self.confidence_ceiling > 0.0 && self.confidence_ceiling < 1.0) {
            return Err(ConfigError::invalid(
                "fusion.confidence_ceiling",
                format!("must be in (0, 1), got {}", self.confidence_ceiling),
            ));
        }
        for (field, value) in [
            ("fusion.singleton_threshold", self.singleton_threshold),
            ("fusion.singleton_penalty", self.singleton_penalty),
            ("fusion.disagreement_damping", self.disagreement_damping),
            ("fusion.margin_weight", self.margin_weight),
            ("fusion.bounce_made_penalty", self.bounce_made_penalty),
            ("fusion.swish_min_consistency", self.swish_min_consistency),
            ("fusion.override_made_max_confidence", self.override_made_max_confidence),
            ("fusion.override_miss_min_confidence", self.override_miss_min_confidence),
        ] {
            require_range(field, value as f64, 0.0, 1.0)?;
        }
        require_non_negative("fusion.bounce_weight", self.bounce_weight as f64)?;
        require_non_negative("fusion.entry_weight", self.entry_weight as f64)?;
        require_non_negative("fusion.swoosh_weight", self.swoosh_weight as f64)?;
        require_positive(
            "fusion.feature_weights",
            (self.bounce_weight + self.entry_weight + self.swoosh_weight) as f64,
        )?;
        require_non_negative("fusion.swish_max_upward_px", self.swish_max_upward_px as f64)?;
        require_non_negative("fusion.tie_epsilon", self.tie_epsilon as f64)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_policies() {
        let precision = SingletonPolicy::Precision { threshold: 0.75 };
        assert!(precision.keeps(CameraAngle::Near, 0.8));
        assert!(!precision.keeps(CameraAngle::Far, 0.75));

        let recall = SingletonPolicy::Recall {
            favored: CameraAngle::Far,
            threshold: 0.75,
        };
        assert!(recall.keeps(CameraAngle::Far, 0.1));
        assert!(!recall.keeps(CameraAngle::Near, 0.5));
        assert!(recall.keeps(CameraAngle::Near, 0.9));
    }

    #[test]
    fn test_mode_selects_policy() {
        let config = FusionConfig {
            mode: FusionMode::Recall,
            recall_side: CameraAngle::Far,
            ..FusionConfig::default()
        };
        assert_eq!(
            config.singleton_policy(),
            SingletonPolicy::Recall {
                favored: CameraAngle::Far,
                threshold: 0.75
            }
        );
    }

    #[test]
    fn test_validation() {
        assert!(FusionConfig::default().validate().is_ok());
        let bad = FusionConfig {
            confidence_ceiling: 1.0,
            ..FusionConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = FusionConfig {
            window_seconds: -1.0,
            ..FusionConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = FusionConfig {
            bounce_weight: 0.0,
            entry_weight: 0.0,
            swoosh_weight: 0.0,
            ..FusionConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
