// src/feed.rs
//
// Detection Feed loader. The detector writes one JSON document per video:
//
//   { "fps": 30.0, "source": "game1_near.mp4",
//     "frames": [ { "frame": 0, "timestamp_seconds": 0.0,
//                   "ball": { "bbox": {x1,y1,x2,y2}, "confidence": 0.8 },
//                   "hoop": null }, ... ] }
//
// Per-class confidence minimums are applied here, so the core only ever sees
// detections the caller trusts.

use crate::error::{require_range, ConfigError};
use crate::types::{Detection, FrameDetection};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Suffix of reports written by `classify`; skipped during discovery.
pub const SHOT_REPORT_SUFFIX: &str = "_shots.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub ball_min_confidence: f32,
    pub hoop_min_confidence: f32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ball_min_confidence: 0.35,
            hoop_min_confidence: 0.5,
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_range("feed.ball_min_confidence", self.ball_min_confidence as f64, 0.0, 1.0)?;
        require_range("feed.hoop_min_confidence", self.hoop_min_confidence as f64, 0.0, 1.0)?;
        Ok(())
    }

    fn keep(&self, detection: Option<Detection>, min_confidence: f32) -> Option<Detection> {
        detection.filter(|d| d.confidence.is_finite() && d.confidence >= min_confidence)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedFrame {
    pub frame: u64,
    #[serde(default)]
    pub timestamp_seconds: Option<f64>,
    #[serde(default)]
    pub ball: Option<Detection>,
    #[serde(default)]
    pub hoop: Option<Detection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionFeed {
    pub fps: f64,
    #[serde(default)]
    pub source: Option<String>,
    pub frames: Vec<FeedFrame>,
}

impl DetectionFeed {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let mut feed = Self::from_json(&contents)
            .with_context(|| format!("parsing detection feed {}", path.display()))?;
        if feed.source.is_none() {
            feed.source = Some(path.display().to_string());
        }
        info!(
            "📂 Loaded feed {} ({} frames @ {:.1} fps)",
            path.display(),
            feed.frames.len(),
            feed.fps
        );
        Ok(feed)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let feed: DetectionFeed = serde_json::from_str(contents)?;
        if !(feed.fps.is_finite() && feed.fps > 0.0) {
            anyhow::bail!("feed fps must be positive, got {}", feed.fps);
        }
        Ok(feed)
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    pub fn source_name(&self) -> String {
        self.source.clone().unwrap_or_else(|| "unknown".to_string())
    }

    /// Frames in file order with confidence filtering applied and missing
    /// timestamps filled in as `frame / fps`.
    pub fn frames<'a>(
        &'a self,
        config: &'a FeedConfig,
    ) -> impl Iterator<Item = FrameDetection> + 'a {
        self.frames.iter().map(move |f| FrameDetection {
            frame: f.frame,
            timestamp_seconds: f
                .timestamp_seconds
                .unwrap_or(f.frame as f64 / self.fps),
            ball: config.keep(f.ball, config.ball_min_confidence),
            hoop: config.keep(f.hoop, config.hoop_min_confidence),
        })
    }
}

/// A single feed file, or every `*.json` feed below a directory (sorted).
pub fn find_feed_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        anyhow::bail!("input {} does not exist", input.display());
    }

    let mut feeds = Vec::new();
    for entry in WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let is_report = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(SHOT_REPORT_SUFFIX));

        if entry.file_type().is_file() && is_json && !is_report {
            feeds.push(path.to_path_buf());
        } else if is_report {
            debug!("Skipping report file {}", path.display());
        }
    }
    feeds.sort();

    info!("Found {} feed files", feeds.len());
    Ok(feeds)
}
