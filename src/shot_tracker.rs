// src/shot_tracker.rs
//
// Zone tracker: turns the per-frame ball/hoop stream into discrete shot
// sequences.
//
//   Idle ──(ball + hoop detected, ball inside hoop zone)──▶ Tracking
//   Tracking ──(ball back in zone)──▶ Tracking, miss counter reset
//   Tracking ──(ball out of zone / undetected)──▶ Tracking, miss counter + 1
//   Tracking ──(miss counter > timeout_seconds × fps, or end of stream)──▶ Idle
//
// Every finalize emits exactly one sequence. Short sequences are NOT dropped
// here; the outcome classifier owns that decision.

use crate::error::{require_positive, ConfigError};
use crate::types::{BBox, Detection, FrameDetection, Point};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Upper bound on the overlay buffer; it is preallocated at construction.
pub const MAX_TRAJECTORY_LENGTH: usize = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Horizontal half-width (px) of the zone centered on the hoop
    pub zone_half_width: f32,
    /// Vertical half-height (px) of the zone centered on the hoop
    pub zone_half_height: f32,
    /// Seconds without a zone hit before the active sequence is finalized
    pub timeout_seconds: f64,
    /// Capacity of the rolling trajectory buffer kept for overlays
    pub trajectory_length: usize,
    /// Half-size (px) of the substitute hoop box when the observed one is unusable
    pub fallback_hoop_half_size: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            zone_half_width: 80.0,
            zone_half_height: 95.0,
            timeout_seconds: 3.0,
            trajectory_length: 30,
            fallback_hoop_half_size: 30.0,
        }
    }
}

impl TrackerConfig {
    /// Wider zone for far-angle footage where the hoop is small in frame.
    pub fn wide_zone() -> Self {
        Self {
            zone_half_width: 100.0,
            zone_half_height: 115.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("tracker.zone_half_width", self.zone_half_width as f64)?;
        require_positive("tracker.zone_half_height", self.zone_half_height as f64)?;
        require_positive("tracker.timeout_seconds", self.timeout_seconds)?;
        require_positive(
            "tracker.fallback_hoop_half_size",
            self.fallback_hoop_half_size as f64,
        )?;
        if self.trajectory_length == 0 || self.trajectory_length > MAX_TRAJECTORY_LENGTH {
            return Err(ConfigError::invalid(
                "tracker.trajectory_length",
                format!(
                    "must be between 1 and {MAX_TRAJECTORY_LENGTH}, got {}",
                    self.trajectory_length
                ),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// TYPES
// ============================================================================

/// Ball observations attributed to one shot attempt.
///
/// `positions`, `sizes` and `frames` always have equal length and are
/// index-aligned; the only way to add a sample is [`ShotSequence::push`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotSequence {
    pub start_frame: u64,
    pub start_timestamp: f64,
    pub end_frame: u64,
    pub end_timestamp: f64,
    /// Hoop snapshot at sequence start
    pub hoop_center: Point,
    pub hoop_bbox: BBox,
    positions: Vec<Point>,
    sizes: Vec<f32>,
    frames: Vec<u64>,
    frames_since_zone_hit: u64,
}

impl ShotSequence {
    pub fn start(frame: u64, timestamp: f64, ball: &Detection, hoop: &Detection) -> Self {
        let mut seq = Self {
            start_frame: frame,
            start_timestamp: timestamp,
            end_frame: frame,
            end_timestamp: timestamp,
            hoop_center: hoop.center(),
            hoop_bbox: hoop.bbox,
            positions: Vec::with_capacity(32),
            sizes: Vec::with_capacity(32),
            frames: Vec::with_capacity(32),
            frames_since_zone_hit: 0,
        };
        seq.push(frame, timestamp, ball.center(), ball.area());
        seq
    }

    /// Build a sequence from raw samples (frame index = sample index, 30 fps).
    #[cfg(test)]
    pub(crate) fn from_samples(hoop_bbox: BBox, samples: &[(Point, f32)]) -> Self {
        let mut seq = Self {
            start_frame: 0,
            start_timestamp: 0.0,
            end_frame: 0,
            end_timestamp: 0.0,
            hoop_center: hoop_bbox.center(),
            hoop_bbox,
            positions: Vec::with_capacity(samples.len()),
            sizes: Vec::with_capacity(samples.len()),
            frames: Vec::with_capacity(samples.len()),
            frames_since_zone_hit: 0,
        };
        for (i, (p, size)) in samples.iter().enumerate() {
            seq.push(i as u64, i as f64 / 30.0, *p, *size);
        }
        seq
    }

    pub fn push(&mut self, frame: u64, timestamp: f64, position: Point, size: f32) {
        self.positions.push(position);
        self.sizes.push(size.max(0.0));
        self.frames.push(frame);
        self.end_frame = frame;
        self.end_timestamp = timestamp;
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn frames(&self) -> &[u64] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn frames_since_zone_hit(&self) -> u64 {
        self.frames_since_zone_hit
    }

    /// Timestamp reported for the shot: midpoint of the in-zone window.
    pub fn mid_timestamp(&self) -> f64 {
        (self.start_timestamp + self.end_timestamp) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizeReason {
    Timeout,
    EndOfStream,
}

/// A closed sequence plus the hoop box it should be judged against.
#[derive(Debug, Clone)]
pub struct FinalizedSequence {
    pub sequence: ShotSequence,
    /// Most recently observed hoop box, or a fallback box
    pub hoop_bbox: BBox,
    pub hoop_fallback: bool,
    pub reason: FinalizeReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub frame: u64,
    pub position: Point,
    pub in_zone: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum TrackerState {
    Idle,
    Tracking(ShotSequence),
}

// ============================================================================
// TRACKER
// ============================================================================

pub struct ShotTracker {
    config: TrackerConfig,
    state: TrackerState,
    timeout_frames: u64,
    last_hoop: Option<Detection>,
    last_in_zone: bool,
    trajectory: VecDeque<TrajectoryPoint>,
}

impl ShotTracker {
    pub fn new(config: TrackerConfig, fps: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        require_positive("fps", fps)?;
        let timeout_frames = (config.timeout_seconds * fps) as u64;
        let trajectory = VecDeque::with_capacity(config.trajectory_length);
        Ok(Self {
            config,
            state: TrackerState::Idle,
            timeout_frames,
            last_hoop: None,
            last_in_zone: false,
            trajectory,
        })
    }

    /// Feed one frame. Returns a sequence when this frame triggers the timeout.
    pub fn update(&mut self, frame: &FrameDetection) -> Option<FinalizedSequence> {
        if let Some(hoop) = frame.hoop {
            self.last_hoop = Some(hoop);
        }

        let in_zone = match (frame.ball, frame.hoop) {
            (Some(ball), Some(hoop)) => self.is_in_zone(ball.center(), hoop.center()),
            _ => false,
        };
        self.last_in_zone = in_zone;

        if let Some(ball) = frame.ball {
            self.push_trajectory(TrajectoryPoint {
                frame: frame.frame,
                position: ball.center(),
                in_zone,
            });
        }

        match &mut self.state {
            TrackerState::Idle => {
                if let (true, Some(ball), Some(hoop)) = (in_zone, frame.ball, frame.hoop) {
                    debug!(
                        "🏀 Ball entered hoop zone at frame {} ({:.2}s)",
                        frame.frame, frame.timestamp_seconds
                    );
                    self.state = TrackerState::Tracking(ShotSequence::start(
                        frame.frame,
                        frame.timestamp_seconds,
                        &ball,
                        &hoop,
                    ));
                }
                None
            }
            TrackerState::Tracking(seq) => {
                match (in_zone, frame.ball) {
                    (true, Some(ball)) => {
                        seq.push(
                            frame.frame,
                            frame.timestamp_seconds,
                            ball.center(),
                            ball.area(),
                        );
                        seq.frames_since_zone_hit = 0;
                    }
                    _ => seq.frames_since_zone_hit += 1,
                }

                if seq.frames_since_zone_hit > self.timeout_frames {
                    self.finalize(FinalizeReason::Timeout)
                } else {
                    None
                }
            }
        }
    }

    /// Flush the active sequence at end of stream.
    pub fn finish(&mut self) -> Option<FinalizedSequence> {
        self.finalize(FinalizeReason::EndOfStream)
    }

    pub fn is_in_zone(&self, ball: Point, hoop: Point) -> bool {
        (ball.x - hoop.x).abs() <= self.config.zone_half_width
            && (ball.y - hoop.y).abs() <= self.config.zone_half_height
    }

    /// Was the ball inside the zone on the most recent frame?
    pub fn last_in_zone(&self) -> bool {
        self.last_in_zone
    }

    pub fn is_tracking(&self) -> bool {
        !matches!(self.state, TrackerState::Idle)
    }

    pub fn active_sequence(&self) -> Option<&ShotSequence> {
        match &self.state {
            TrackerState::Tracking(seq) => Some(seq),
            TrackerState::Idle => None,
        }
    }

    /// Rolling buffer of recent ball observations, oldest first.
    pub fn trajectory(&self) -> impl Iterator<Item = &TrajectoryPoint> {
        self.trajectory.iter()
    }

    pub fn timeout_frames(&self) -> u64 {
        self.timeout_frames
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn push_trajectory(&mut self, point: TrajectoryPoint) {
        if self.trajectory.len() >= self.config.trajectory_length {
            self.trajectory.pop_front();
        }
        self.trajectory.push_back(point);
    }

    fn finalize(&mut self, reason: FinalizeReason) -> Option<FinalizedSequence> {
        let sequence = match std::mem::replace(&mut self.state, TrackerState::Idle) {
            TrackerState::Tracking(seq) => seq,
            TrackerState::Idle => return None,
        };

        let observed = self
            .last_hoop
            .map(|h| h.bbox)
            .unwrap_or(sequence.hoop_bbox);

        let (hoop_bbox, hoop_fallback) = if observed.is_degenerate() {
            let center = self
                .last_hoop
                .map(|h| h.center())
                .filter(|c| c.x.is_finite() && c.y.is_finite())
                .unwrap_or(sequence.hoop_center);
            let half = self.config.fallback_hoop_half_size;
            warn!(
                "⚠️  Hoop box unusable at finalize (frame {}), using {:.0}px fallback around ({:.0}, {:.0})",
                sequence.end_frame,
                half * 2.0,
                center.x,
                center.y
            );
            (BBox::around(center, half, half), true)
        } else {
            (observed, false)
        };

        info!(
            "🎯 Shot sequence closed: frames {}→{} ({} in zone, {:?})",
            sequence.start_frame,
            sequence.end_frame,
            sequence.len(),
            reason
        );

        Some(FinalizedSequence {
            sequence,
            hoop_bbox,
            hoop_fallback,
            reason,
        })
    }
}
