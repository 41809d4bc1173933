// src/types.rs

use serde::{Deserialize, Serialize};

use crate::analysis::boundary_crossing::CrossingConfig;
use crate::analysis::outcome_classifier::ClassifierConfig;
use crate::feed::FeedConfig;
use crate::fusion::FusionConfig;
use crate::shot_tracker::TrackerConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub crossing: CrossingConfig,
    pub classifier: ClassifierConfig,
    pub fusion: FusionConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "shot_outcome=info".to_string(),
        }
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in image pixels. Image Y grows downward, so `y1` is the
/// top edge and `y2` the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box of half-extent `half_w` × `half_h` around `center`.
    pub fn around(center: Point, half_w: f32, half_h: f32) -> Self {
        Self {
            x1: center.x - half_w,
            y1: center.y - half_h,
            x2: center.x + half_w,
            y2: center.y + half_h,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.x1 && x <= self.x2
    }

    /// A box is usable for crossing geometry only if it has finite, positive area.
    pub fn is_degenerate(&self) -> bool {
        let finite = self.x1.is_finite()
            && self.y1.is_finite()
            && self.x2.is_finite()
            && self.y2.is_finite();
        !finite || self.area() <= 0.0
    }
}

// ============================================================================
// DETECTION FEED
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }

    pub fn center(&self) -> Point {
        self.bbox.center()
    }

    pub fn area(&self) -> f32 {
        self.bbox.area()
    }
}

/// One processed frame from the external detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetection {
    pub frame: u64,
    pub timestamp_seconds: f64,
    pub ball: Option<Detection>,
    pub hoop: Option<Detection>,
}

impl FrameDetection {
    pub fn new(frame: u64, timestamp_seconds: f64) -> Self {
        Self {
            frame,
            timestamp_seconds,
            ball: None,
            hoop: None,
        }
    }

    pub fn with_ball(mut self, ball: Detection) -> Self {
        self.ball = Some(ball);
        self
    }

    pub fn with_hoop(mut self, hoop: Detection) -> Self {
        self.hoop = Some(hoop);
        self
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotOutcome {
    Made,
    Missed,
}

impl ShotOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Made => "MADE",
            Self::Missed => "MISSED",
        }
    }

    pub fn is_made(&self) -> bool {
        matches!(self, Self::Made)
    }
}

/// The two camera angles reconciled by the fusion arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraAngle {
    Near,
    Far,
}

impl CameraAngle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Near => "NEAR",
            Self::Far => "FAR",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::Near => Self::Far,
            Self::Far => Self::Near,
        }
    }
}
