// src/analysis/outcome_classifier.rs
//
// Prioritized rule cascade: GeometricFeatures → MADE / MISSED.
//
// Rules are evaluated top to bottom and the first match decides outcome,
// reason and confidence. Bounce signatures sit above the permissive MADE rule
// because a rim-out trajectory also satisfies a naive top-crossing test.
// Reordering CASCADE changes behavior; the order is tested.

use super::boundary_crossing::GeometricFeatures;
use crate::error::{require_non_negative, require_positive, require_range, ConfigError};
use crate::types::ShotOutcome;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// In-zone samples required before a sequence counts as an attempt
    pub min_frames_in_zone: usize,
    pub insufficient_frames_confidence: f32,

    /// Total upward px that is a hard bounce-out regardless of crossings
    pub extreme_upward_px: f32,
    pub extreme_bounce_confidence: f32,

    /// upward / downward above this is a bounce-out
    pub rim_bounce_ratio: f32,
    pub rim_bounce_ratio_confidence: f32,

    pub made_base_confidence: f32,
    pub made_per_extra_crossing: f32,
    pub made_per_depth_point: f32,
    pub made_confidence_cap: f32,

    /// Inside/outside mean ball size above this means in front of the rim
    pub front_of_hoop_size_ratio: f32,
    pub front_of_hoop_confidence: f32,

    /// Upward px after the first bottom crossing that is an in-and-out
    pub rim_bounce_out_px: f32,
    pub rim_bounce_out_confidence: f32,

    pub grazed_confidence: f32,
    pub wrong_depth_confidence: f32,

    /// Upward px without any crossing that is a rim bounce
    pub rim_bounce_upward_px: f32,
    pub rim_bounce_no_pass_confidence: f32,

    pub default_miss_confidence: f32,
    pub default_miss_per_inside_point: f32,
    pub default_miss_floor: f32,

    /// Multiplier on the decision confidence when the hoop box was a substitute
    pub fallback_hoop_confidence_factor: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_frames_in_zone: 3,
            insufficient_frames_confidence: 0.6,
            extreme_upward_px: 150.0,
            extreme_bounce_confidence: 0.95,
            rim_bounce_ratio: 1.2,
            rim_bounce_ratio_confidence: 0.90,
            made_base_confidence: 0.75,
            made_per_extra_crossing: 0.10,
            made_per_depth_point: 0.02,
            made_confidence_cap: 0.95,
            front_of_hoop_size_ratio: 1.35,
            front_of_hoop_confidence: 0.85,
            rim_bounce_out_px: 50.0,
            rim_bounce_out_confidence: 0.90,
            grazed_confidence: 0.70,
            wrong_depth_confidence: 0.85,
            rim_bounce_upward_px: 35.0,
            rim_bounce_no_pass_confidence: 0.90,
            default_miss_confidence: 0.90,
            default_miss_per_inside_point: 0.05,
            default_miss_floor: 0.55,
            fallback_hoop_confidence_factor: 0.80,
        }
    }
}

impl ClassifierConfig {
    /// Later far-angle tuning: longer minimum attempt, quicker bounce calls.
    pub fn strict() -> Self {
        Self {
            min_frames_in_zone: 8,
            rim_bounce_ratio: 1.0,
            front_of_hoop_size_ratio: 1.25,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_frames_in_zone < 2 {
            return Err(ConfigError::invalid(
                "classifier.min_frames_in_zone",
                "a crossing needs at least two samples",
            ));
        }
        require_positive("classifier.extreme_upward_px", self.extreme_upward_px as f64)?;
        require_positive("classifier.rim_bounce_ratio", self.rim_bounce_ratio as f64)?;
        require_positive(
            "classifier.front_of_hoop_size_ratio",
            self.front_of_hoop_size_ratio as f64,
        )?;
        require_non_negative("classifier.rim_bounce_out_px", self.rim_bounce_out_px as f64)?;
        require_non_negative(
            "classifier.rim_bounce_upward_px",
            self.rim_bounce_upward_px as f64,
        )?;
        require_non_negative(
            "classifier.made_per_extra_crossing",
            self.made_per_extra_crossing as f64,
        )?;
        require_non_negative(
            "classifier.made_per_depth_point",
            self.made_per_depth_point as f64,
        )?;
        require_non_negative(
            "classifier.default_miss_per_inside_point",
            self.default_miss_per_inside_point as f64,
        )?;

        for (field, value) in [
            ("classifier.insufficient_frames_confidence", self.insufficient_frames_confidence),
            ("classifier.extreme_bounce_confidence", self.extreme_bounce_confidence),
            ("classifier.rim_bounce_ratio_confidence", self.rim_bounce_ratio_confidence),
            ("classifier.made_base_confidence", self.made_base_confidence),
            ("classifier.made_confidence_cap", self.made_confidence_cap),
            ("classifier.front_of_hoop_confidence", self.front_of_hoop_confidence),
            ("classifier.rim_bounce_out_confidence", self.rim_bounce_out_confidence),
            ("classifier.grazed_confidence", self.grazed_confidence),
            ("classifier.wrong_depth_confidence", self.wrong_depth_confidence),
            ("classifier.rim_bounce_no_pass_confidence", self.rim_bounce_no_pass_confidence),
            ("classifier.default_miss_confidence", self.default_miss_confidence),
            ("classifier.default_miss_floor", self.default_miss_floor),
        ] {
            require_range(field, value as f64, 0.0, 1.0)?;
        }
        require_positive(
            "classifier.fallback_hoop_confidence_factor",
            self.fallback_hoop_confidence_factor as f64,
        )?;
        require_range(
            "classifier.fallback_hoop_confidence_factor",
            self.fallback_hoop_confidence_factor as f64,
            0.0,
            1.0,
        )?;

        if self.made_base_confidence > self.made_confidence_cap {
            return Err(ConfigError::invalid(
                "classifier.made_base_confidence",
                "must not exceed made_confidence_cap",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleName {
    InsufficientFrames,
    ExtremeBounce,
    RimBounceRatio,
    TopEntry,
    BallInFrontOfHoop,
    RimBounceOut,
    Grazed,
    WrongDepthOrDirection,
    RimBounceNoPassThrough,
    NoValidCrossing,
}

impl RuleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientFrames => "INSUFFICIENT_FRAMES",
            Self::ExtremeBounce => "EXTREME_BOUNCE",
            Self::RimBounceRatio => "RIM_BOUNCE_RATIO",
            Self::TopEntry => "TOP_ENTRY",
            Self::BallInFrontOfHoop => "BALL_IN_FRONT_OF_HOOP",
            Self::RimBounceOut => "RIM_BOUNCE_OUT",
            Self::Grazed => "GRAZED",
            Self::WrongDepthOrDirection => "WRONG_DEPTH_OR_DIRECTION",
            Self::RimBounceNoPassThrough => "RIM_BOUNCE_NO_PASS_THROUGH",
            Self::NoValidCrossing => "NO_VALID_CROSSING",
        }
    }

    /// Rules whose match means the ball came back up off the rim.
    pub fn is_bounce(&self) -> bool {
        matches!(
            self,
            Self::ExtremeBounce
                | Self::RimBounceRatio
                | Self::RimBounceOut
                | Self::RimBounceNoPassThrough
        )
    }
}

type Predicate = fn(&GeometricFeatures, &ClassifierConfig) -> bool;
type Reason = fn(&GeometricFeatures, &ClassifierConfig) -> String;
type Confidence = fn(&GeometricFeatures, &ClassifierConfig) -> f32;

/// One entry of the cascade.
pub struct ClassificationRule {
    pub name: RuleName,
    pub outcome: ShotOutcome,
    predicate: Predicate,
    reason: Reason,
    confidence: Confidence,
}

impl ClassificationRule {
    pub fn matches(&self, f: &GeometricFeatures, c: &ClassifierConfig) -> bool {
        (self.predicate)(f, c)
    }

    pub fn evaluate(&self, f: &GeometricFeatures, c: &ClassifierConfig) -> Classification {
        Classification {
            outcome: self.outcome,
            rule: self.name,
            reason: (self.reason)(f, c),
            confidence: (self.confidence)(f, c).clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub outcome: ShotOutcome,
    pub rule: RuleName,
    pub reason: String,
    pub confidence: f32,
}

// ============================================================================
// CASCADE
// ============================================================================

pub const CASCADE: &[ClassificationRule] = &[
    ClassificationRule {
        name: RuleName::InsufficientFrames,
        outcome: ShotOutcome::Missed,
        predicate: insufficient_frames,
        reason: insufficient_frames_reason,
        confidence: |_, c| c.insufficient_frames_confidence,
    },
    ClassificationRule {
        name: RuleName::ExtremeBounce,
        outcome: ShotOutcome::Missed,
        predicate: |f, c| f.upward_total >= c.extreme_upward_px,
        reason: |f, _| format!("extreme_bounce ({:.0}px upward)", f.upward_total),
        confidence: |_, c| c.extreme_bounce_confidence,
    },
    ClassificationRule {
        name: RuleName::RimBounceRatio,
        outcome: ShotOutcome::Missed,
        predicate: |f, c| f.up_down_ratio > c.rim_bounce_ratio,
        reason: |f, _| format!("rim_bounce_ratio (up/down {:.2})", f.up_down_ratio),
        confidence: |_, c| c.rim_bounce_ratio_confidence,
    },
    ClassificationRule {
        name: RuleName::TopEntry,
        outcome: ShotOutcome::Made,
        predicate: |f, _| f.valid_top_crossings >= 1 && !f.bounced_back_out,
        reason: top_entry_reason,
        confidence: top_entry_confidence,
    },
    ClassificationRule {
        name: RuleName::BallInFrontOfHoop,
        outcome: ShotOutcome::Missed,
        predicate: ball_in_front_of_hoop,
        reason: |f, _| {
            format!(
                "ball_in_front_of_hoop (inside {:.0}px² vs outside {:.0}px²)",
                f.avg_size_inside, f.avg_size_outside
            )
        },
        confidence: |_, c| c.front_of_hoop_confidence,
    },
    ClassificationRule {
        name: RuleName::RimBounceOut,
        outcome: ShotOutcome::Missed,
        predicate: |f, c| f.has_crossing() && f.bounce_after_bottom > c.rim_bounce_out_px,
        reason: |f, _| {
            format!(
                "rim_bounce_out ({:.0}px back up after bottom crossing)",
                f.bounce_after_bottom
            )
        },
        confidence: |_, c| c.rim_bounce_out_confidence,
    },
    ClassificationRule {
        name: RuleName::Grazed,
        outcome: ShotOutcome::Missed,
        predicate: |f, _| f.total_crossings() == 1 && f.points_inside == 1,
        reason: |f, _| format!("grazed ({} point inside)", f.points_inside),
        confidence: |_, c| c.grazed_confidence,
    },
    ClassificationRule {
        name: RuleName::WrongDepthOrDirection,
        outcome: ShotOutcome::Missed,
        predicate: |f, _| f.top_crossings >= 1 && f.valid_top_crossings == 0,
        reason: |f, _| {
            format!(
                "wrong_depth_or_direction (avg ratio {:.3})",
                f.avg_size_ratio
            )
        },
        confidence: |_, c| c.wrong_depth_confidence,
    },
    ClassificationRule {
        name: RuleName::RimBounceNoPassThrough,
        outcome: ShotOutcome::Missed,
        predicate: |f, c| !f.has_crossing() && f.upward_total >= c.rim_bounce_upward_px,
        reason: |f, _| {
            format!(
                "rim_bounce_no_pass_through ({:.0}px upward)",
                f.upward_total
            )
        },
        confidence: |_, c| c.rim_bounce_no_pass_confidence,
    },
];

/// Applied when no cascade rule matches.
pub const FALLBACK_RULE: ClassificationRule = ClassificationRule {
    name: RuleName::NoValidCrossing,
    outcome: ShotOutcome::Missed,
    predicate: |_, _| true,
    reason: |f, _| {
        if f.top_crossings == 0 {
            format!("no_top_crossing ({} points inside)", f.points_inside)
        } else {
            format!("no_valid_crossing ({} points inside)", f.points_inside)
        }
    },
    confidence: default_miss_confidence,
};

fn insufficient_frames(f: &GeometricFeatures, c: &ClassifierConfig) -> bool {
    f.total_points < c.min_frames_in_zone
}

fn insufficient_frames_reason(f: &GeometricFeatures, c: &ClassifierConfig) -> String {
    format!(
        "insufficient_frames ({} < {})",
        f.total_points, c.min_frames_in_zone
    )
}

fn top_entry_reason(f: &GeometricFeatures, _: &ClassifierConfig) -> String {
    if f.valid_bottom_crossings >= 1 {
        format!(
            "complete_pass_through ({} top, {} bottom, {} at depth)",
            f.valid_top_crossings, f.valid_bottom_crossings, f.points_inside_at_depth
        )
    } else {
        format!(
            "entered_from_top ({} top, {} at depth)",
            f.valid_top_crossings, f.points_inside_at_depth
        )
    }
}

fn top_entry_confidence(f: &GeometricFeatures, c: &ClassifierConfig) -> f32 {
    let extra = f.valid_crossings().saturating_sub(1) as f32;
    let conf = c.made_base_confidence
        + c.made_per_extra_crossing * extra
        + c.made_per_depth_point * f.points_inside_at_depth as f32;
    conf.min(c.made_confidence_cap)
}

fn ball_in_front_of_hoop(f: &GeometricFeatures, c: &ClassifierConfig) -> bool {
    f.has_crossing()
        && f.avg_size_outside > 0.0
        && f.avg_size_inside > f.avg_size_outside * c.front_of_hoop_size_ratio
}

fn default_miss_confidence(f: &GeometricFeatures, c: &ClassifierConfig) -> f32 {
    let conf =
        c.default_miss_confidence - c.default_miss_per_inside_point * f.points_inside as f32;
    conf.max(c.default_miss_floor)
}

// ============================================================================
// CLASSIFIER
// ============================================================================

pub struct OutcomeClassifier {
    config: ClassifierConfig,
}

impl OutcomeClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn rules(&self) -> impl Iterator<Item = &'static ClassificationRule> {
        CASCADE.iter().chain(std::iter::once(&FALLBACK_RULE))
    }

    pub fn classify(&self, features: &GeometricFeatures) -> Classification {
        let rule = CASCADE
            .iter()
            .find(|r| r.matches(features, &self.config))
            .unwrap_or(&FALLBACK_RULE);

        let result = rule.evaluate(features, &self.config);
        debug!(
            "🏀 Rule {} → {} ({:.2}): {}",
            rule.name.as_str(),
            result.outcome.as_str(),
            result.confidence,
            result.reason
        );
        result
    }

    /// Lower a decision made against a substitute hoop box.
    pub fn discount_fallback_hoop(&self, mut classification: Classification) -> Classification {
        classification.confidence *= self.config.fallback_hoop_confidence_factor;
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::boundary_crossing::{BoundaryCrossingAnalyzer, CrossingConfig};
    use crate::analysis::fixtures::{
        hoop_box, scenario_a, scenario_b, scenario_c, sequence_from, BALL_AREA_AT_DEPTH,
    };
    use crate::shot_tracker::ShotSequence;
    use crate::types::Point;
    use proptest::prelude::*;

    fn classifier() -> OutcomeClassifier {
        OutcomeClassifier::new(ClassifierConfig::default()).unwrap()
    }

    fn features_of(seq: &ShotSequence) -> GeometricFeatures {
        BoundaryCrossingAnalyzer::new(CrossingConfig::default())
            .unwrap()
            .analyze(seq, &hoop_box())
    }

    /// Features with enough samples to clear the minimum-frames rule.
    fn base() -> GeometricFeatures {
        GeometricFeatures {
            total_points: 10,
            downward_total: 100.0,
            ..GeometricFeatures::default()
        }
    }

    #[test]
    fn test_scenario_a_straight_drop_is_made() {
        let f = features_of(&scenario_a());
        assert!(f.top_crossings >= 1 && f.bottom_crossings >= 1);
        let c = classifier().classify(&f);
        assert_eq!(c.outcome, ShotOutcome::Made);
        assert_eq!(c.rule, RuleName::TopEntry);
        assert!(c.reason.starts_with("complete_pass_through"));
        // base + one extra crossing + one point at depth
        assert!((c.confidence - 0.87).abs() < 1e-5);
    }

    #[test]
    fn test_scenario_b_bounce_out_is_missed() {
        let c = classifier().classify(&features_of(&scenario_b()));
        assert_eq!(c.outcome, ShotOutcome::Missed);
        assert_eq!(c.rule, RuleName::RimBounceOut);
        assert!(c.reason.contains("bounce"));
    }

    #[test]
    fn test_scenario_c_no_overlap_is_missed() {
        let f = features_of(&scenario_c());
        assert_eq!(f.total_crossings(), 0);
        let c = classifier().classify(&f);
        assert_eq!(c.outcome, ShotOutcome::Missed);
        assert_eq!(c.rule, RuleName::NoValidCrossing);
        assert!((c.confidence - 0.90).abs() < 1e-6);
    }

    #[test]
    fn test_single_sample_hits_minimum_frames_rule() {
        let c = classifier().classify(&features_of(&sequence_from(&[(100.0, 95.0)])));
        assert_eq!(c.rule, RuleName::InsufficientFrames);
        assert_eq!(c.outcome, ShotOutcome::Missed);
        assert!((c.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_strict_profile_needs_more_frames() {
        let strict = OutcomeClassifier::new(ClassifierConfig::strict()).unwrap();
        let c = strict.classify(&features_of(&scenario_a()));
        assert_eq!(c.rule, RuleName::InsufficientFrames);
    }

    #[test]
    fn test_extreme_bounce_beats_valid_crossing() {
        let f = GeometricFeatures {
            valid_top_crossings: 1,
            top_crossings: 1,
            upward_total: 160.0,
            downward_total: 200.0,
            up_down_ratio: 0.8,
            ..base()
        };
        let c = classifier().classify(&f);
        assert_eq!(c.rule, RuleName::ExtremeBounce);
        assert!((c.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_rim_bounce_ratio() {
        let f = GeometricFeatures {
            valid_top_crossings: 1,
            top_crossings: 1,
            upward_total: 60.0,
            downward_total: 40.0,
            up_down_ratio: 1.5,
            ..base()
        };
        assert_eq!(classifier().classify(&f).rule, RuleName::RimBounceRatio);
    }

    #[test]
    fn test_made_confidence_is_capped() {
        let f = GeometricFeatures {
            top_crossings: 3,
            bottom_crossings: 3,
            valid_top_crossings: 3,
            valid_bottom_crossings: 3,
            points_inside: 8,
            points_inside_at_depth: 8,
            ..base()
        };
        let c = classifier().classify(&f);
        assert_eq!(c.outcome, ShotOutcome::Made);
        assert!((c.confidence - 0.95).abs() < 1e-6);
        assert!(c.reason.starts_with("complete_pass_through"));
    }

    #[test]
    fn test_top_entry_without_bottom_reason() {
        let f = GeometricFeatures {
            top_crossings: 1,
            valid_top_crossings: 1,
            points_inside: 2,
            ..base()
        };
        let c = classifier().classify(&f);
        assert_eq!(c.outcome, ShotOutcome::Made);
        assert!(c.reason.starts_with("entered_from_top"));
        assert!((c.confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_bounced_back_out_blocks_made() {
        let f = GeometricFeatures {
            top_crossings: 1,
            bottom_crossings: 1,
            valid_top_crossings: 1,
            valid_bottom_crossings: 1,
            points_inside: 2,
            bounce_after_bottom: 60.0,
            bounced_back_out: true,
            upward_total: 60.0,
            up_down_ratio: 0.6,
            ..base()
        };
        assert_eq!(classifier().classify(&f).rule, RuleName::RimBounceOut);
    }

    #[test]
    fn test_ball_in_front_of_hoop() {
        let f = GeometricFeatures {
            top_crossings: 1,
            bottom_crossings: 1,
            points_inside: 3,
            avg_size_inside: 800.0,
            avg_size_outside: 400.0,
            ..base()
        };
        assert_eq!(classifier().classify(&f).rule, RuleName::BallInFrontOfHoop);
    }

    #[test]
    fn test_grazed() {
        let f = GeometricFeatures {
            bottom_crossings: 1,
            points_inside: 1,
            ..base()
        };
        let c = classifier().classify(&f);
        assert_eq!(c.rule, RuleName::Grazed);
        assert!((c.confidence - 0.70).abs() < 1e-6);
    }

    #[test]
    fn test_single_crossing_without_inside_point_is_default_miss() {
        let f = GeometricFeatures {
            bottom_crossings: 1,
            points_inside: 0,
            ..base()
        };
        let c = classifier().classify(&f);
        assert_eq!(c.rule, RuleName::NoValidCrossing);
        assert!((c.confidence - 0.90).abs() < 1e-6);
    }

    #[test]
    fn test_wrong_depth_top_crossing() {
        let f = GeometricFeatures {
            top_crossings: 1,
            bottom_crossings: 1,
            points_inside: 3,
            ..base()
        };
        assert_eq!(
            classifier().classify(&f).rule,
            RuleName::WrongDepthOrDirection
        );
    }

    #[test]
    fn test_rim_bounce_without_crossing() {
        let f = GeometricFeatures {
            upward_total: 40.0,
            up_down_ratio: 0.4,
            ..base()
        };
        let c = classifier().classify(&f);
        assert_eq!(c.rule, RuleName::RimBounceNoPassThrough);
        assert!(c.rule.is_bounce());
    }

    #[test]
    fn test_default_miss_confidence_drops_with_inside_points() {
        let near = GeometricFeatures {
            points_inside: 3,
            ..base()
        };
        let c = classifier().classify(&near);
        assert_eq!(c.rule, RuleName::NoValidCrossing);
        assert!((c.confidence - 0.75).abs() < 1e-5);

        let very_near = GeometricFeatures {
            points_inside: 20,
            ..base()
        };
        assert!((classifier().classify(&very_near).confidence - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_cascade_order_is_fixed() {
        let names: Vec<RuleName> = classifier().rules().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                RuleName::InsufficientFrames,
                RuleName::ExtremeBounce,
                RuleName::RimBounceRatio,
                RuleName::TopEntry,
                RuleName::BallInFrontOfHoop,
                RuleName::RimBounceOut,
                RuleName::Grazed,
                RuleName::WrongDepthOrDirection,
                RuleName::RimBounceNoPassThrough,
                RuleName::NoValidCrossing,
            ]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = ClassifierConfig {
            made_confidence_cap: 1.2,
            ..ClassifierConfig::default()
        };
        assert!(OutcomeClassifier::new(bad).is_err());
        let bad = ClassifierConfig {
            fallback_hoop_confidence_factor: 0.0,
            ..ClassifierConfig::default()
        };
        assert!(OutcomeClassifier::new(bad).is_err());
        let bad = ClassifierConfig {
            min_frames_in_zone: 1,
            ..ClassifierConfig::default()
        };
        assert!(OutcomeClassifier::new(bad).is_err());
    }

    fn arb_features() -> impl Strategy<Value = GeometricFeatures> {
        (
            0usize..40,
            0u32..4,
            0u32..4,
            0u32..20,
            0.0f32..300.0,
            0.0f32..1000.0,
            0.0f32..1000.0,
            0.0f32..120.0,
        )
            .prop_map(
                |(points, tops, bottoms, inside, down, size_in, size_out, bounce)| {
                    GeometricFeatures {
                        total_points: points,
                        top_crossings: tops,
                        bottom_crossings: bottoms,
                        valid_top_crossings: tops,
                        valid_bottom_crossings: bottoms,
                        points_inside: inside,
                        points_inside_at_depth: inside,
                        avg_size_inside: size_in,
                        avg_size_outside: size_out,
                        downward_total: down,
                        trajectory_consistency: if down > 0.0 { 1.0 } else { 0.0 },
                        bounce_after_bottom: bounce,
                        bounced_back_out: bottoms > 0 && bounce > 50.0,
                        ..GeometricFeatures::default()
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn prop_no_top_crossing_no_upward_is_missed(mut f in arb_features()) {
            f.top_crossings = 0;
            f.valid_top_crossings = 0;
            f.upward_total = 0.0;
            let c = classifier().classify(&f);
            prop_assert_eq!(c.outcome, ShotOutcome::Missed);
        }

        #[test]
        fn prop_classify_is_deterministic(f in arb_features()) {
            let cls = classifier();
            prop_assert_eq!(cls.classify(&f), cls.classify(&f));
        }

        #[test]
        fn prop_confidence_in_unit_interval(f in arb_features()) {
            let c = classifier().classify(&f);
            prop_assert!((0.0..=1.0).contains(&c.confidence));
        }

        #[test]
        fn prop_clean_pass_through_is_made(
            mut above in prop::collection::vec(0.0f32..79.0, 1..5),
            inside_y in 81.0f32..119.0,
            below_y in 121.0f32..200.0,
            x in 85.0f32..115.0,
        ) {
            above.sort_by(|a, b| a.total_cmp(b));
            let samples: Vec<(Point, f32)> = above
                .iter()
                .chain([inside_y, below_y].iter())
                .map(|&y| (Point::new(x, y), BALL_AREA_AT_DEPTH))
                .collect();
            let seq = ShotSequence::from_samples(hoop_box(), &samples);
            let f = features_of(&seq);
            prop_assert_eq!(f.valid_top_crossings, 1);
            prop_assert_eq!(f.valid_bottom_crossings, 1);

            let c = classifier().classify(&f);
            prop_assert_eq!(c.outcome, ShotOutcome::Made);
            prop_assert!(c.confidence >= ClassifierConfig::default().made_base_confidence);
        }
    }
}
