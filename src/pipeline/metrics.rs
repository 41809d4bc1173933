// src/pipeline/metrics.rs
//
// Per-session counters. Cheap to clone and share with a reporting thread;
// the snapshot is embedded in every ShotReport.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SessionMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_with_ball: Arc<AtomicU64>,
    pub frames_with_hoop: Arc<AtomicU64>,
    pub frames_in_zone: Arc<AtomicU64>,
    pub sequences_opened: Arc<AtomicU64>,
    pub made_shots: Arc<AtomicU64>,
    pub missed_shots: Arc<AtomicU64>,
    pub hoop_fallbacks: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_with_ball: Arc::new(AtomicU64::new(0)),
            frames_with_hoop: Arc::new(AtomicU64::new(0)),
            frames_in_zone: Arc::new(AtomicU64::new(0)),
            sequences_opened: Arc::new(AtomicU64::new(0)),
            made_shots: Arc::new(AtomicU64::new(0)),
            missed_shots: Arc::new(AtomicU64::new(0)),
            hoop_fallbacks: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Frames processed per wall-clock second since the session started.
    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            frames_with_ball: self.frames_with_ball.load(Ordering::Relaxed),
            frames_with_hoop: self.frames_with_hoop.load(Ordering::Relaxed),
            frames_in_zone: self.frames_in_zone.load(Ordering::Relaxed),
            sequences_opened: self.sequences_opened.load(Ordering::Relaxed),
            made_shots: self.made_shots.load(Ordering::Relaxed),
            missed_shots: self.missed_shots.load(Ordering::Relaxed),
            hoop_fallbacks: self.hoop_fallbacks.load(Ordering::Relaxed),
            processing_fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub frames_with_ball: u64,
    pub frames_with_hoop: u64,
    pub frames_in_zone: u64,
    pub sequences_opened: u64,
    pub made_shots: u64,
    pub missed_shots: u64,
    pub hoop_fallbacks: u64,
    pub processing_fps: f64,
    pub elapsed_secs: f64,
}
