// src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shot_outcome::analysis::ShotReport;
use shot_outcome::feed::{find_feed_files, DetectionFeed, SHOT_REPORT_SUFFIX};
use shot_outcome::fusion::{FusionArbiter, FusionMode};
use shot_outcome::pipeline::{Profile, ShotSession, ShotSessionConfig};
use shot_outcome::types::{CameraAngle, Config};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "shot-outcome",
    version,
    about = "Classify basketball shot outcomes from per-frame ball/hoop detections"
)]
struct Cli {
    /// YAML config; every section is optional
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run detection feeds through the single-angle classifier
    Classify {
        /// Feed JSON file, or a directory searched recursively for feeds
        #[arg(long)]
        input: PathBuf,

        /// Report file for a single feed, or output directory for a batch
        #[arg(long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = ProfileArg::Default)]
        profile: ProfileArg,
    },

    /// Fuse near and far shot reports into one decision per shot
    Fuse {
        #[arg(long)]
        near: PathBuf,

        #[arg(long)]
        far: PathBuf,

        /// Seconds the near clock runs ahead of the far clock
        #[arg(long, allow_hyphen_values = true)]
        offset: f64,

        /// Matching window in seconds (overrides fusion.window_seconds)
        #[arg(long)]
        window: Option<f64>,

        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        #[arg(long, value_enum)]
        recall_side: Option<SideArg>,

        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Default,
    Strict,
    Wide,
}

impl From<ProfileArg> for Profile {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::Default => Profile::Default,
            ProfileArg::Strict => Profile::Strict,
            ProfileArg::Wide => Profile::Wide,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Precision,
    Recall,
}

impl From<ModeArg> for FusionMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Precision => FusionMode::Precision,
            ModeArg::Recall => FusionMode::Recall,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SideArg {
    Near,
    Far,
}

impl From<SideArg> for CameraAngle {
    fn from(s: SideArg) -> Self {
        match s {
            SideArg::Near => CameraAngle::Near,
            SideArg::Far => CameraAngle::Far,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Classify {
            input,
            output,
            profile,
        } => classify(&config, &input, &output, profile.into()),
        Command::Fuse {
            near,
            far,
            offset,
            window,
            mode,
            recall_side,
            output,
        } => {
            let mut config = config;
            if let Some(window) = window {
                config.fusion.window_seconds = window;
            }
            if let Some(mode) = mode {
                config.fusion.mode = mode.into();
            }
            if let Some(side) = recall_side {
                config.fusion.recall_side = side.into();
            }
            fuse(&config, &near, &far, offset, &output)
        }
    }
}

fn classify(config: &Config, input: &Path, output: &Path, profile: Profile) -> Result<()> {
    info!("🏀 Shot outcome classification starting");

    let feeds = find_feed_files(input)?;
    if feeds.is_empty() {
        bail!("no feed files found in {}", input.display());
    }
    let batch = input.is_dir();

    let mut failures = 0usize;
    for (idx, feed_path) in feeds.iter().enumerate() {
        info!(
            "Processing feed {}/{}: {}",
            idx + 1,
            feeds.len(),
            feed_path.display()
        );

        let report_path = if batch {
            output.join(report_file_name(feed_path))
        } else {
            output.to_path_buf()
        };

        match classify_feed(config, feed_path, &report_path, profile) {
            Ok(report) => {
                info!(
                    "✓ {}: {} shots ({} made, {} missed)",
                    report.source,
                    report.stats.total_shots,
                    report.stats.made_shots,
                    report.stats.missed_shots
                );
            }
            Err(e) => {
                error!("Failed to process {}: {:#}", feed_path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} feeds failed", failures, feeds.len());
    }
    Ok(())
}

fn classify_feed(
    config: &Config,
    feed_path: &Path,
    report_path: &Path,
    profile: Profile,
) -> Result<ShotReport> {
    let feed = DetectionFeed::load(feed_path)?;
    let session_config = ShotSessionConfig::from_config(config, profile);
    let report = ShotSession::run_feed(&feed, session_config, &config.feed)
        .with_context(|| format!("classifying {}", feed_path.display()))?;
    report.save(report_path)?;
    Ok(report)
}

fn report_file_name(feed_path: &Path) -> String {
    let stem = feed_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("feed");
    format!("{stem}{SHOT_REPORT_SUFFIX}")
}

fn fuse(config: &Config, near: &Path, far: &Path, offset: f64, output: &Path) -> Result<()> {
    info!("🎥 Dual-angle fusion starting");

    let near_report = ShotReport::load(near)?;
    let far_report = ShotReport::load(far)?;
    info!(
        "Near: {} shots from {}, far: {} shots from {}",
        near_report.shots.len(),
        near_report.source,
        far_report.shots.len(),
        far_report.source
    );

    let arbiter = FusionArbiter::new(config.fusion.clone())?;
    let report = arbiter.fuse(&near_report.shots, &far_report.shots, offset);
    report.save(output)?;

    info!(
        "✓ Fused {} shots ({} made, {} missed, {} overrides)",
        report.stats.total_shots,
        report.stats.made_shots,
        report.stats.missed_shots,
        report.stats.overrides
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_classify() {
        let cli = Cli::try_parse_from([
            "shot-outcome",
            "classify",
            "--input",
            "feeds",
            "--output",
            "out",
            "--profile",
            "strict",
        ])
        .unwrap();
        match cli.command {
            Command::Classify { profile, .. } => {
                assert_eq!(Profile::from(profile), Profile::Strict)
            }
            _ => panic!("expected classify"),
        }
    }

    #[test]
    fn test_cli_parses_negative_offset() {
        let cli = Cli::try_parse_from([
            "shot-outcome",
            "fuse",
            "--near",
            "a.json",
            "--far",
            "b.json",
            "--offset",
            "-1.5",
            "--mode",
            "recall",
            "--recall-side",
            "far",
            "--output",
            "fused.json",
        ])
        .unwrap();
        match cli.command {
            Command::Fuse {
                offset,
                mode,
                recall_side,
                window,
                ..
            } => {
                assert_eq!(offset, -1.5);
                assert_eq!(mode.map(FusionMode::from), Some(FusionMode::Recall));
                assert_eq!(recall_side.map(CameraAngle::from), Some(CameraAngle::Far));
                assert!(window.is_none());
            }
            _ => panic!("expected fuse"),
        }
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name(Path::new("/data/game1_near.json")),
            "game1_near_shots.json"
        );
    }

    #[test]
    fn test_classify_batch_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("feeds");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(
            input.join("game.json"),
            r#"{ "fps": 30.0, "source": "game", "frames": [ { "frame": 0 } ] }"#,
        )
        .unwrap();
        let out = dir.path().join("out");

        classify(&Config::default(), &input, &out, Profile::Default).unwrap();
        let report = ShotReport::load(&out.join("game_shots.json")).unwrap();
        assert_eq!(report.stats.total_shots, 0);
        assert_eq!(report.frame_count, 1);
    }
}
