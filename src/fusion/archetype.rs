// src/fusion/archetype.rs
//
// Shot archetypes and the per-angle trust table used when the two angles
// disagree. The first matching row wins; Uncertain always matches.
//
//   archetype       near   far    when
//   RIM_BOUNCE_OUT  1.00   1.30   either side flagged a bounce
//   CLEAN_SWISH     1.00   1.20   a fast clean pass corroborated by low bounce
//   RIM_MAKE        1.15   1.00   entry/crossing corroborated, no clean swoosh
//   NEAR_RIM_MISS   1.10   1.00   ball sat in the hoop box without a valid crossing
//   CLEAN_MISS      1.00   1.10   no crossing and nothing near the rim
//   UNCERTAIN       1.00   1.00   anything else

use super::features::{FeatureAgreement, SideSignals};
use crate::types::CameraAngle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotArchetype {
    CleanSwish,
    RimMake,
    RimBounceOut,
    NearRimMiss,
    CleanMiss,
    Uncertain,
}

impl ShotArchetype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CleanSwish => "CLEAN_SWISH",
            Self::RimMake => "RIM_MAKE",
            Self::RimBounceOut => "RIM_BOUNCE_OUT",
            Self::NearRimMiss => "NEAR_RIM_MISS",
            Self::CleanMiss => "CLEAN_MISS",
            Self::Uncertain => "UNCERTAIN",
        }
    }
}

type ArchetypeMatch = fn(&SideSignals, &SideSignals, &FeatureAgreement) -> bool;

pub struct ArchetypeProfile {
    pub archetype: ShotArchetype,
    pub near_trust: f32,
    pub far_trust: f32,
    matches: ArchetypeMatch,
}

impl ArchetypeProfile {
    pub fn trust(&self, angle: CameraAngle) -> f32 {
        match angle {
            CameraAngle::Near => self.near_trust,
            CameraAngle::Far => self.far_trust,
        }
    }

    /// Side trusted more under this archetype, if any.
    pub fn reliable_side(&self) -> Option<CameraAngle> {
        if self.near_trust > self.far_trust {
            Some(CameraAngle::Near)
        } else if self.far_trust > self.near_trust {
            Some(CameraAngle::Far)
        } else {
            None
        }
    }
}

pub const ARCHETYPES: &[ArchetypeProfile] = &[
    ArchetypeProfile {
        archetype: ShotArchetype::RimBounceOut,
        near_trust: 1.0,
        far_trust: 1.3,
        matches: |_, _, a| a.any_bounce(),
    },
    ArchetypeProfile {
        archetype: ShotArchetype::CleanSwish,
        near_trust: 1.0,
        far_trust: 1.2,
        matches: |_, _, a| a.swoosh_speed_consistency >= 0.5,
    },
    ArchetypeProfile {
        archetype: ShotArchetype::RimMake,
        near_trust: 1.15,
        far_trust: 1.0,
        matches: |_, _, a| a.entry_crossing_consistency >= 0.5,
    },
    ArchetypeProfile {
        archetype: ShotArchetype::NearRimMiss,
        near_trust: 1.1,
        far_trust: 1.0,
        matches: |near, far, _| near.near_rim || far.near_rim,
    },
    ArchetypeProfile {
        archetype: ShotArchetype::CleanMiss,
        near_trust: 1.0,
        far_trust: 1.1,
        matches: |near, far, _| !near.crossing && !far.crossing,
    },
];

pub const UNCERTAIN: ArchetypeProfile = ArchetypeProfile {
    archetype: ShotArchetype::Uncertain,
    near_trust: 1.0,
    far_trust: 1.0,
    matches: |_, _, _| true,
};

pub fn classify_archetype(
    near: &SideSignals,
    far: &SideSignals,
    agreement: &FeatureAgreement,
) -> &'static ArchetypeProfile {
    ARCHETYPES
        .iter()
        .find(|p| (p.matches)(near, far, agreement))
        .unwrap_or(&UNCERTAIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::fixtures::{clean_miss, made, record, rim_out};
    use crate::fusion::FusionConfig;
    use crate::analysis::boundary_crossing::GeometricFeatures;
    use crate::analysis::outcome_classifier::RuleName;
    use crate::analysis::shot_record::ShotRecord;
    use crate::types::ShotOutcome;

    fn archetype_of(near: &ShotRecord, far: &ShotRecord) -> ShotArchetype {
        let config = FusionConfig::default();
        let n = SideSignals::from_record(CameraAngle::Near, near, &config);
        let f = SideSignals::from_record(CameraAngle::Far, far, &config);
        let a = FeatureAgreement::compute(&n, &f, &config);
        classify_archetype(&n, &f, &a).archetype
    }

    #[test]
    fn test_bounce_wins_over_everything() {
        assert_eq!(
            archetype_of(&made(1.0, 0.9), &rim_out(1.0, 0.9)),
            ShotArchetype::RimBounceOut
        );
    }

    #[test]
    fn test_clean_swish_and_clean_miss() {
        assert_eq!(
            archetype_of(&made(1.0, 0.9), &made(1.0, 0.9)),
            ShotArchetype::CleanSwish
        );
        assert_eq!(
            archetype_of(&clean_miss(1.0, 0.9), &clean_miss(1.0, 0.9)),
            ShotArchetype::CleanMiss
        );
    }

    #[test]
    fn test_rim_make_without_fast_pass() {
        // crossed, steep, but rattled 30px upward: no fast clean pass
        let rattled = record(
            1.0,
            ShotOutcome::Made,
            RuleName::TopEntry,
            0.8,
            GeometricFeatures {
                valid_top_crossings: 1,
                top_crossings: 1,
                downward_total: 300.0,
                upward_total: 30.0,
                trajectory_consistency: 300.0 / 330.0,
                ..GeometricFeatures::default()
            },
        );
        assert_eq!(archetype_of(&rattled, &rattled), ShotArchetype::RimMake);
    }

    #[test]
    fn test_near_rim_miss() {
        let hovering = record(
            1.0,
            ShotOutcome::Missed,
            RuleName::NoValidCrossing,
            0.8,
            GeometricFeatures {
                points_inside: 3,
                ..GeometricFeatures::default()
            },
        );
        assert_eq!(
            archetype_of(&hovering, &clean_miss(1.0, 0.9)),
            ShotArchetype::NearRimMiss
        );
    }

    #[test]
    fn test_reliable_side() {
        assert_eq!(ARCHETYPES[0].reliable_side(), Some(CameraAngle::Far));
        assert_eq!(ARCHETYPES[2].reliable_side(), Some(CameraAngle::Near));
        assert_eq!(UNCERTAIN.reliable_side(), None);
        assert_eq!(UNCERTAIN.trust(CameraAngle::Near), 1.0);
    }
}
