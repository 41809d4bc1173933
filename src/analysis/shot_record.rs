// src/analysis/shot_record.rs
//
// Shot Record Builder: packages a classified sequence into an immutable
// ShotRecord, and a session's records into the ShotReport written to disk.

use super::boundary_crossing::GeometricFeatures;
use super::outcome_classifier::{Classification, RuleName};
use crate::pipeline::metrics::MetricsSummary;
use crate::shot_tracker::FinalizedSequence;
use crate::types::{BBox, ShotOutcome};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

pub const DETECTION_METHOD: &str = "boundary_crossing";

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub frame: u64,
    pub x: f32,
    pub y: f32,
    /// Ball bbox area, px²
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    /// Midpoint of the in-zone window
    pub timestamp_seconds: f64,
    pub start_frame: u64,
    pub end_frame: u64,
    pub outcome: ShotOutcome,
    pub rule: RuleName,
    pub reason: String,
    pub decision_confidence: f32,
    pub features: GeometricFeatures,
    pub hoop_bbox: BBox,
    #[serde(default)]
    pub hoop_fallback: bool,
    #[serde(default)]
    pub trajectory: Vec<TrajectorySample>,
}

impl ShotRecord {
    pub fn is_made(&self) -> bool {
        self.outcome.is_made()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotStats {
    pub total_shots: usize,
    pub made_shots: usize,
    pub missed_shots: usize,
}

impl ShotStats {
    pub fn from_records(records: &[ShotRecord]) -> Self {
        let made_shots = records.iter().filter(|r| r.is_made()).count();
        Self {
            total_shots: records.len(),
            made_shots,
            missed_shots: records.len() - made_shots,
        }
    }
}

/// Source-level facts that are not derived from the shots themselves.
#[derive(Debug, Clone, Default)]
pub struct ReportSource {
    pub source: String,
    pub fps: f64,
    pub frame_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotReport {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub fps: f64,
    pub frame_count: u64,
    pub duration_seconds: f64,
    pub detection_method: String,
    pub stats: ShotStats,
    #[serde(default)]
    pub metrics: MetricsSummary,
    pub shots: Vec<ShotRecord>,
}

impl ShotReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(
            "💾 Shot report saved: {} ({} shots, {} made)",
            path.display(),
            self.stats.total_shots,
            self.stats.made_shots
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let report: ShotReport = serde_json::from_str(&contents)
            .with_context(|| format!("parsing shot report {}", path.display()))?;
        Ok(report)
    }
}

// ============================================================================
// BUILDER
// ============================================================================

#[derive(Debug, Default)]
pub struct ShotRecordBuilder {
    records: Vec<ShotRecord>,
}

impl ShotRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Package one classified sequence. Returns the stored record.
    pub fn record(
        &mut self,
        finalized: &FinalizedSequence,
        features: GeometricFeatures,
        classification: Classification,
    ) -> &ShotRecord {
        let seq = &finalized.sequence;
        let trajectory = seq
            .frames()
            .iter()
            .zip(seq.positions())
            .zip(seq.sizes())
            .map(|((&frame, p), &size)| TrajectorySample {
                frame,
                x: p.x,
                y: p.y,
                size,
            })
            .collect();

        let index = self.records.len();
        self.records.push(ShotRecord {
            timestamp_seconds: seq.mid_timestamp(),
            start_frame: seq.start_frame,
            end_frame: seq.end_frame,
            outcome: classification.outcome,
            rule: classification.rule,
            reason: classification.reason,
            decision_confidence: classification.confidence,
            features,
            hoop_bbox: finalized.hoop_bbox,
            hoop_fallback: finalized.hoop_fallback,
            trajectory,
        });
        &self.records[index]
    }

    pub fn records(&self) -> &[ShotRecord] {
        &self.records
    }

    pub fn into_report(self, source: ReportSource, metrics: MetricsSummary) -> ShotReport {
        let duration_seconds = if source.fps > 0.0 {
            source.frame_count as f64 / source.fps
        } else {
            0.0
        };
        ShotReport {
            session_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            source: source.source,
            fps: source.fps,
            frame_count: source.frame_count,
            duration_seconds,
            detection_method: DETECTION_METHOD.to_string(),
            stats: ShotStats::from_records(&self.records),
            metrics,
            shots: self.records,
        }
    }
}
