// src/pipeline/session.rs
//
// Per-angle session: wires the zone tracker, boundary-crossing analyzer,
// outcome classifier and record builder together.
//
// Single entry point: call process_frame() for each frame in arrival order,
// then finish() at end of stream. Everything runs inline; nothing here
// blocks on I/O.

use crate::analysis::boundary_crossing::{BoundaryCrossingAnalyzer, CrossingConfig};
use crate::analysis::outcome_classifier::{ClassifierConfig, OutcomeClassifier};
use crate::analysis::shot_record::{ReportSource, ShotRecord, ShotRecordBuilder, ShotReport};
use crate::error::ConfigError;
use crate::feed::{DetectionFeed, FeedConfig};
use crate::shot_tracker::{FinalizedSequence, ShotTracker, TrackerConfig, TrajectoryPoint};
use crate::types::{Config, FrameDetection};
use super::metrics::SessionMetrics;
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Default,
    Strict,
    /// Wider hoop zone for far-angle footage
    Wide,
}

#[derive(Debug, Clone, Default)]
pub struct ShotSessionConfig {
    pub tracker: TrackerConfig,
    pub crossing: CrossingConfig,
    pub classifier: ClassifierConfig,
}

impl ShotSessionConfig {
    /// Later tuning: tighter depth band and longer minimum attempt.
    pub fn strict() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            crossing: CrossingConfig::strict(),
            classifier: ClassifierConfig::strict(),
        }
    }

    /// Sections from a loaded config; `Profile::Strict` replaces the
    /// crossing and classifier sections with their strict profiles,
    /// `Profile::Wide` replaces the tracker section.
    pub fn from_config(config: &Config, profile: Profile) -> Self {
        match profile {
            Profile::Default => Self {
                tracker: config.tracker.clone(),
                crossing: config.crossing.clone(),
                classifier: config.classifier.clone(),
            },
            Profile::Strict => Self {
                tracker: config.tracker.clone(),
                ..Self::strict()
            },
            Profile::Wide => Self {
                tracker: TrackerConfig::wide_zone(),
                crossing: config.crossing.clone(),
                classifier: config.classifier.clone(),
            },
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

pub struct ShotSession {
    tracker: ShotTracker,
    analyzer: BoundaryCrossingAnalyzer,
    classifier: OutcomeClassifier,
    builder: ShotRecordBuilder,
    metrics: SessionMetrics,
    fps: f64,
}

impl ShotSession {
    pub fn new(config: ShotSessionConfig, fps: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            tracker: ShotTracker::new(config.tracker, fps)?,
            analyzer: BoundaryCrossingAnalyzer::new(config.crossing)?,
            classifier: OutcomeClassifier::new(config.classifier)?,
            builder: ShotRecordBuilder::new(),
            metrics: SessionMetrics::new(),
            fps,
        })
    }

    /// Process one frame. Returns the shot finalized on this frame, if any.
    pub fn process_frame(&mut self, frame: &FrameDetection) -> Option<ShotRecord> {
        let m = &self.metrics;
        m.inc(&m.total_frames);
        if frame.ball.is_some() {
            m.inc(&m.frames_with_ball);
        }
        if frame.hoop.is_some() {
            m.inc(&m.frames_with_hoop);
        }

        let was_tracking = self.tracker.is_tracking();
        let finalized = self.tracker.update(frame);

        if self.tracker.last_in_zone() {
            m.inc(&m.frames_in_zone);
        }
        if !was_tracking && self.tracker.is_tracking() {
            m.inc(&m.sequences_opened);
        }

        finalized.map(|f| self.classify(f))
    }

    /// Flush the active sequence at end of stream.
    pub fn finish(&mut self) -> Option<ShotRecord> {
        self.tracker.finish().map(|f| self.classify(f))
    }

    fn classify(&mut self, finalized: FinalizedSequence) -> ShotRecord {
        let features = self
            .analyzer
            .analyze(&finalized.sequence, &finalized.hoop_bbox);
        let mut classification = self.classifier.classify(&features);
        if finalized.hoop_fallback {
            classification = self.classifier.discount_fallback_hoop(classification);
        }

        let m = &self.metrics;
        if classification.outcome.is_made() {
            m.inc(&m.made_shots);
        } else {
            m.inc(&m.missed_shots);
        }
        if finalized.hoop_fallback {
            m.inc(&m.hoop_fallbacks);
        }

        let record = self.builder.record(&finalized, features, classification);
        info!(
            "🏀 Shot at {:.2}s: {} ({:.2}) {}",
            record.timestamp_seconds,
            record.outcome.as_str(),
            record.decision_confidence,
            record.reason
        );
        record.clone()
    }

    pub fn records(&self) -> &[ShotRecord] {
        self.builder.records()
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn trajectory(&self) -> impl Iterator<Item = &TrajectoryPoint> {
        self.tracker.trajectory()
    }

    pub fn into_report(self, source: String, frame_count: u64) -> ShotReport {
        let summary = self.metrics.summary();
        self.builder.into_report(
            ReportSource {
                source,
                fps: self.fps,
                frame_count,
            },
            summary,
        )
    }

    /// Run a whole feed through a fresh session.
    pub fn run_feed(
        feed: &DetectionFeed,
        config: ShotSessionConfig,
        feed_config: &FeedConfig,
    ) -> Result<ShotReport, ConfigError> {
        feed_config.validate()?;
        let mut session = Self::new(config, feed.fps)?;
        for frame in feed.frames(feed_config) {
            session.process_frame(&frame);
        }
        session.finish();
        Ok(session.into_report(feed.source_name(), feed.frame_count()))
    }
}
