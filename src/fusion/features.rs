// src/fusion/features.rs
//
// Cross-angle feature agreement. Each side is reduced to a handful of boolean
// signals, then three named scores in {0, 0.5, 1} say how much the two sides
// corroborate each other:
//
//   bounce_agreement            1 both flagged a bounce, 0.5 one did, 0 neither
//   entry_crossing_consistency  one side's steep entry vs the other's valid top crossing
//   swoosh_speed_consistency    one side's fast clean pass vs the other's low bounce
//
// The two cross scores count each direction (near→far, far→near) as 0.5.

use super::FusionConfig;
use crate::analysis::outcome_classifier::RuleName;
use crate::analysis::shot_record::ShotRecord;
use crate::types::{CameraAngle, ShotOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideSignals {
    pub angle: CameraAngle,
    pub outcome: ShotOutcome,
    pub confidence: f32,
    pub rule: RuleName,
    /// Bounce cascade rule fired, or the ball came back out after passing through
    pub bounce: bool,
    /// At least one depth-correct top crossing
    pub crossing: bool,
    /// Mostly downward movement through the zone
    pub steep_entry: bool,
    /// Little or no upward movement
    pub low_bounce: bool,
    pub fast_clean_pass: bool,
    /// Ball was inside the hoop box without a valid crossing
    pub near_rim: bool,
    /// MADE decided by crossing geometry alone
    pub crossing_only_made: bool,
}

impl SideSignals {
    pub fn from_record(angle: CameraAngle, record: &ShotRecord, config: &FusionConfig) -> Self {
        let f = &record.features;
        let bounce = record.rule.is_bounce() || f.bounced_back_out;
        let crossing = f.valid_top_crossings >= 1;
        let steep_entry =
            f.downward_total > 0.0 && f.trajectory_consistency >= config.swish_min_consistency;
        let low_bounce = f.upward_total <= config.swish_max_upward_px;

        Self {
            angle,
            outcome: record.outcome,
            confidence: record.decision_confidence,
            rule: record.rule,
            bounce,
            crossing,
            steep_entry,
            low_bounce,
            fast_clean_pass: crossing && steep_entry && low_bounce,
            near_rim: !crossing && f.points_inside >= 1,
            crossing_only_made: record.outcome.is_made() && record.rule == RuleName::TopEntry,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureAgreement {
    pub bounce_agreement: f32,
    pub entry_crossing_consistency: f32,
    pub swoosh_speed_consistency: f32,
    /// Weighted combination of the three scores, in [0, 1]
    pub overall: f32,
}

fn both_ways(a_to_b: bool, b_to_a: bool) -> f32 {
    0.5 * a_to_b as u8 as f32 + 0.5 * b_to_a as u8 as f32
}

impl FeatureAgreement {
    pub fn compute(near: &SideSignals, far: &SideSignals, config: &FusionConfig) -> Self {
        let bounce_agreement = both_ways(near.bounce, far.bounce);
        let entry_crossing_consistency =
            both_ways(near.steep_entry && far.crossing, far.steep_entry && near.crossing);
        let swoosh_speed_consistency = both_ways(
            near.fast_clean_pass && far.low_bounce,
            far.fast_clean_pass && near.low_bounce,
        );

        let total_weight = config.bounce_weight + config.entry_weight + config.swoosh_weight;
        let overall = if total_weight > 0.0 {
            (config.bounce_weight * bounce_agreement
                + config.entry_weight * entry_crossing_consistency
                + config.swoosh_weight * swoosh_speed_consistency)
                / total_weight
        } else {
            0.0
        };

        Self {
            bounce_agreement,
            entry_crossing_consistency,
            swoosh_speed_consistency,
            overall,
        }
    }

    pub fn any_bounce(&self) -> bool {
        self.bounce_agreement > 0.0
    }

    /// How strongly the cross-angle features back `outcome`, in [0, 1].
    /// Bounce evidence supports MISSED and suppresses MADE.
    pub fn support_for(&self, outcome: ShotOutcome) -> f32 {
        match outcome {
            ShotOutcome::Made => {
                let pass = (self.entry_crossing_consistency + self.swoosh_speed_consistency) / 2.0;
                pass * (1.0 - self.bounce_agreement)
            }
            ShotOutcome::Missed => self.bounce_agreement,
        }
    }
}
