// src/lib.rs
//
// Basketball shot outcome classification.
//
//   Detection Feed → ShotTracker → BoundaryCrossingAnalyzer → OutcomeClassifier
//     → ShotRecordBuilder → per-angle ShotReport
//   near + far ShotReports → FusionArbiter → FusionReport

pub mod analysis;
pub mod config;
pub mod error;
pub mod feed;
pub mod fusion;
pub mod pipeline;
pub mod shot_tracker;
pub mod types;

pub use analysis::{
    BoundaryCrossingAnalyzer, Classification, GeometricFeatures, OutcomeClassifier, ShotRecord,
    ShotReport,
};
pub use error::ConfigError;
pub use feed::{DetectionFeed, FeedConfig};
pub use fusion::{FusionArbiter, FusionConfig, FusionMode, FusionRecord, FusionReport};
pub use pipeline::{Profile, ShotSession, ShotSessionConfig};
pub use shot_tracker::{ShotSequence, ShotTracker};
pub use types::{BBox, CameraAngle, Config, Detection, FrameDetection, Point, ShotOutcome};
