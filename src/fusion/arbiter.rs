// src/fusion/arbiter.rs
//
// Fusion Arbiter: one fused verdict per matched pair or kept singleton.
//
// Agreement:     fused = min(ceiling, mean(conf) × boost)
// Disagreement:  vote(side) = conf × (1 + support for side's outcome) × archetype trust
//                fused = damping × ((1 − w) × winner_conf + w × margin)
//                × bounce penalty when MADE wins over any bounce flag
// Overrides run after the vote and may flip it.
// Singletons:    kept per SingletonPolicy, conf × singleton_penalty.

use super::archetype::{classify_archetype, ShotArchetype};
use super::features::{FeatureAgreement, SideSignals};
use super::matcher::match_records;
use super::{FusionConfig, FusionMode};
use crate::analysis::outcome_classifier::RuleName;
use crate::analysis::shot_record::ShotRecord;
use crate::error::ConfigError;
use crate::types::{CameraAngle, ShotOutcome};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Both angles reported the same outcome
    Agreement,
    /// Archetype-weighted vote between disagreeing angles
    WeightedVote,
    /// A named consistency check flipped the vote
    Override,
    /// Single-angle record kept without a counterpart
    Fallback,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agreement => "AGREEMENT",
            Self::WeightedVote => "WEIGHTED_VOTE",
            Self::Override => "OVERRIDE",
            Self::Fallback => "FALLBACK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideName {
    /// MADE came only from crossing geometry while the other angle saw a bounce
    BounceContradictsCrossingMade,
    /// Low-confidence MADE against a high-confidence, well-founded miss
    LowConfidenceMadeVsConfidentMiss,
    /// Near-equal confidences, no bounce: swoosh consistency decides
    ConfidenceTieSwooshBreak,
}

impl OverrideName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BounceContradictsCrossingMade => "BOUNCE_CONTRADICTS_CROSSING_MADE",
            Self::LowConfidenceMadeVsConfidentMiss => "LOW_CONFIDENCE_MADE_VS_CONFIDENT_MISS",
            Self::ConfidenceTieSwooshBreak => "CONFIDENCE_TIE_SWOOSH_BREAK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideDetail {
    pub outcome: ShotOutcome,
    pub confidence: f32,
    pub rule: RuleName,
    pub reason: String,
    /// As reported by that angle, on its own clock
    pub original_timestamp: f64,
    pub vote_weight: Option<f32>,
}

impl SideDetail {
    fn from_record(record: &ShotRecord, vote_weight: Option<f32>) -> Self {
        Self {
            outcome: record.outcome,
            confidence: record.decision_confidence,
            rule: record.rule,
            reason: record.reason.clone(),
            original_timestamp: record.timestamp_seconds,
            vote_weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionRecord {
    /// Far-angle clock
    pub timestamp_seconds: f64,
    pub outcome: ShotOutcome,
    pub fusion_confidence: f32,
    pub resolution_method: ResolutionMethod,
    pub archetype: Option<ShotArchetype>,
    pub agreement: Option<FeatureAgreement>,
    pub override_applied: Option<OverrideName>,
    pub time_diff: Option<f64>,
    pub near: Option<SideDetail>,
    pub far: Option<SideDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionStats {
    pub total_shots: usize,
    pub made_shots: usize,
    pub missed_shots: usize,
    pub matched_pairs: usize,
    pub unmatched_near: usize,
    pub unmatched_far: usize,
    pub kept_near: usize,
    pub kept_far: usize,
    pub overrides: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionReport {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub offset_seconds: f64,
    pub window_seconds: f64,
    pub mode: FusionMode,
    pub recall_side: Option<CameraAngle>,
    pub stats: FusionStats,
    pub shots: Vec<FusionRecord>,
}

impl FusionReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("💾 Fusion report saved: {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing fusion report {}", path.display()))
    }
}

// ============================================================================
// ARBITER
// ============================================================================

pub struct FusionArbiter {
    config: FusionConfig,
}

impl FusionArbiter {
    pub fn new(config: FusionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Match, fuse and filter. `offset_seconds` is near's lead over far.
    pub fn fuse(&self, near: &[ShotRecord], far: &[ShotRecord], offset_seconds: f64) -> FusionReport {
        let near_ts: Vec<f64> = near.iter().map(|r| r.timestamp_seconds).collect();
        let far_ts: Vec<f64> = far.iter().map(|r| r.timestamp_seconds).collect();
        let matches = match_records(&near_ts, &far_ts, offset_seconds, self.config.window_seconds);

        let mut shots = Vec::with_capacity(near.len().max(far.len()));
        let mut stats = FusionStats {
            matched_pairs: matches.pairs.len(),
            unmatched_near: matches.unmatched_near.len(),
            unmatched_far: matches.unmatched_far.len(),
            ..FusionStats::default()
        };

        for pair in &matches.pairs {
            let mut fused = self.fuse_pair(&near[pair.near_index], &far[pair.far_index]);
            fused.time_diff = Some(pair.time_diff);
            if fused.override_applied.is_some() {
                stats.overrides += 1;
            }
            shots.push(fused);
        }

        for &i in &matches.unmatched_near {
            if let Some(kept) = self.keep_singleton(CameraAngle::Near, &near[i], offset_seconds) {
                stats.kept_near += 1;
                shots.push(kept);
            }
        }
        for &j in &matches.unmatched_far {
            if let Some(kept) = self.keep_singleton(CameraAngle::Far, &far[j], offset_seconds) {
                stats.kept_far += 1;
                shots.push(kept);
            }
        }

        shots.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));

        stats.total_shots = shots.len();
        stats.made_shots = shots.iter().filter(|s| s.outcome.is_made()).count();
        stats.missed_shots = stats.total_shots - stats.made_shots;

        info!(
            "🧬 Fusion: {} shots ({} made, {} missed) from {} pairs, kept {}/{} near and {}/{} far singletons, {} overrides",
            stats.total_shots,
            stats.made_shots,
            stats.missed_shots,
            stats.matched_pairs,
            stats.kept_near,
            stats.unmatched_near,
            stats.kept_far,
            stats.unmatched_far,
            stats.overrides,
        );

        FusionReport {
            session_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            offset_seconds,
            window_seconds: self.config.window_seconds,
            mode: self.config.mode,
            recall_side: match self.config.mode {
                FusionMode::Recall => Some(self.config.recall_side),
                FusionMode::Precision => None,
            },
            stats,
            shots,
        }
    }

    /// Fuse one matched pair. The returned record has no `time_diff`.
    pub fn fuse_pair(&self, near: &ShotRecord, far: &ShotRecord) -> FusionRecord {
        let cfg = &self.config;
        let n = SideSignals::from_record(CameraAngle::Near, near, cfg);
        let f = SideSignals::from_record(CameraAngle::Far, far, cfg);
        let agreement = FeatureAgreement::compute(&n, &f, cfg);
        let profile = classify_archetype(&n, &f, &agreement);

        if near.outcome == far.outcome {
            let mean = (n.confidence + f.confidence) / 2.0;
            return FusionRecord {
                timestamp_seconds: far.timestamp_seconds,
                outcome: near.outcome,
                fusion_confidence: (mean * cfg.agreement_boost).clamp(0.0, cfg.confidence_ceiling),
                resolution_method: ResolutionMethod::Agreement,
                archetype: Some(profile.archetype),
                agreement: Some(agreement),
                override_applied: None,
                time_diff: None,
                near: Some(SideDetail::from_record(near, None)),
                far: Some(SideDetail::from_record(far, None)),
            };
        }

        let vote = |s: &SideSignals| {
            s.confidence * (1.0 + agreement.support_for(s.outcome)) * profile.trust(s.angle)
        };
        let near_vote = vote(&n);
        let far_vote = vote(&f);

        // Equal votes go to MISSED
        let (winner, loser, w_win, w_lose) = if near_vote > far_vote
            || (near_vote == far_vote && n.outcome == ShotOutcome::Missed)
        {
            (&n, &f, near_vote, far_vote)
        } else {
            (&f, &n, far_vote, near_vote)
        };

        let margin = if w_win + w_lose > 0.0 {
            (w_win - w_lose) / (w_win + w_lose)
        } else {
            0.0
        };
        let mut confidence = cfg.disagreement_damping
            * ((1.0 - cfg.margin_weight) * winner.confidence + cfg.margin_weight * margin);
        if winner.outcome.is_made() && agreement.any_bounce() {
            confidence *= cfg.bounce_made_penalty;
        }

        let mut outcome = winner.outcome;
        let mut method = ResolutionMethod::WeightedVote;
        let override_applied = self.check_overrides(winner, loser, &agreement);

        if let Some((name, flipped)) = override_applied {
            if flipped != outcome {
                let backer = if n.outcome == flipped { &n } else { &f };
                outcome = flipped;
                confidence = cfg.disagreement_damping * backer.confidence;
                method = ResolutionMethod::Override;
                debug!(
                    "Override {} → {} (vote favored {} {})",
                    name.as_str(),
                    flipped.as_str(),
                    winner.angle.as_str(),
                    winner.outcome.as_str()
                );
            }
        }

        debug!(
            "⚖️  {} disagreement: near {} {:.2} (vote {:.3}) vs far {} {:.2} (vote {:.3}) → {}",
            profile.archetype.as_str(),
            n.outcome.as_str(),
            n.confidence,
            near_vote,
            f.outcome.as_str(),
            f.confidence,
            far_vote,
            outcome.as_str()
        );

        FusionRecord {
            timestamp_seconds: far.timestamp_seconds,
            outcome,
            fusion_confidence: confidence.clamp(0.0, cfg.confidence_ceiling),
            resolution_method: method,
            archetype: Some(profile.archetype),
            agreement: Some(agreement),
            override_applied: override_applied
                .filter(|_| method == ResolutionMethod::Override)
                .map(|(name, _)| name),
            time_diff: None,
            near: Some(SideDetail::from_record(near, Some(near_vote))),
            far: Some(SideDetail::from_record(far, Some(far_vote))),
        }
    }

    /// Named consistency checks, in priority order. Returns the first that
    /// fires and the outcome it demands.
    fn check_overrides(
        &self,
        winner: &SideSignals,
        loser: &SideSignals,
        agreement: &FeatureAgreement,
    ) -> Option<(OverrideName, ShotOutcome)> {
        let cfg = &self.config;
        let (made, missed) = if winner.outcome.is_made() {
            (winner, loser)
        } else {
            (loser, winner)
        };

        if made.crossing_only_made && missed.bounce {
            return Some((OverrideName::BounceContradictsCrossingMade, ShotOutcome::Missed));
        }

        if winner.outcome.is_made()
            && made.confidence < cfg.override_made_max_confidence
            && missed.confidence >= cfg.override_miss_min_confidence
            && is_confident_miss_rule(missed.rule)
        {
            return Some((
                OverrideName::LowConfidenceMadeVsConfidentMiss,
                ShotOutcome::Missed,
            ));
        }

        if (winner.confidence - loser.confidence).abs() <= cfg.tie_epsilon && !agreement.any_bounce()
        {
            if agreement.swoosh_speed_consistency >= 0.75 {
                return Some((OverrideName::ConfidenceTieSwooshBreak, ShotOutcome::Made));
            }
            if agreement.swoosh_speed_consistency <= 0.25 {
                return Some((OverrideName::ConfidenceTieSwooshBreak, ShotOutcome::Missed));
            }
        }

        None
    }

    /// Keep or drop a record with no counterpart.
    pub fn keep_singleton(
        &self,
        side: CameraAngle,
        record: &ShotRecord,
        offset_seconds: f64,
    ) -> Option<FusionRecord> {
        let policy = self.config.singleton_policy();
        if !policy.keeps(side, record.decision_confidence) {
            warn!(
                "Dropping unmatched {} shot at {:.2}s ({} {:.2})",
                side.as_str(),
                record.timestamp_seconds,
                record.outcome.as_str(),
                record.decision_confidence
            );
            return None;
        }

        let (timestamp_seconds, near, far) = match side {
            CameraAngle::Near => (
                record.timestamp_seconds - offset_seconds,
                Some(SideDetail::from_record(record, None)),
                None,
            ),
            CameraAngle::Far => (
                record.timestamp_seconds,
                None,
                Some(SideDetail::from_record(record, None)),
            ),
        };

        Some(FusionRecord {
            timestamp_seconds,
            outcome: record.outcome,
            fusion_confidence: (record.decision_confidence * self.config.singleton_penalty)
                .clamp(0.0, self.config.confidence_ceiling),
            resolution_method: ResolutionMethod::Fallback,
            archetype: None,
            agreement: None,
            override_applied: None,
            time_diff: None,
            near,
            far,
        })
    }
}

/// Miss rules backed by clear geometry, as opposed to thin-evidence misses
/// such as too few frames or a graze.
fn is_confident_miss_rule(rule: RuleName) -> bool {
    matches!(
        rule,
        RuleName::NoValidCrossing | RuleName::WrongDepthOrDirection | RuleName::RimBounceOut
    )
}
