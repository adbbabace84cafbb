//! Steady - Offline video stabilization.
//!
//! Usage:
//!   steady <INPUT> <OUTPUT> [OPTIONS]

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use steady_media::{OutputSettings, VideoCodec};
use steady_pipeline::{stabilize_video, StabilizationParams};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "steady",
    about = "Stabilize shaky video with feature tracking and trajectory smoothing",
    version,
    author
)]
struct Cli {
    /// Input video file
    input: PathBuf,

    /// Output video file
    output: PathBuf,

    /// Maximum number of features to track per frame
    #[arg(long, default_value = "1000")]
    max_corners: usize,

    /// Trajectory smoothing window in frames (larger = smoother)
    #[arg(long, default_value = "30")]
    smooth_radius: usize,

    /// Output codec: h264|h265|vp9
    #[arg(long, default_value = "h264")]
    codec: String,

    /// CRF quality value (lower = better)
    #[arg(long, default_value = "18")]
    crf: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let codec = match cli.codec.as_str() {
        "h264" => VideoCodec::H264,
        "h265" => VideoCodec::H265,
        "vp9" => VideoCodec::Vp9,
        other => bail!("unknown codec {other:?}, expected h264|h265|vp9"),
    };

    let params = StabilizationParams {
        max_corners: cli.max_corners,
        smooth_radius: cli.smooth_radius,
        output: OutputSettings {
            codec,
            crf: Some(cli.crf),
        },
    };

    info!("stabilizing {:?} -> {:?}", cli.input, cli.output);

    let report = stabilize_video(
        &cli.input,
        &cli.output,
        &params,
        Some(&|progress| {
            println!(
                "processing frame {}/{}",
                progress.current_frame + 1,
                progress.total_frames
            );
        }),
    )?;

    println!(
        "done: {} frames in, {} frames out -> {}",
        report.frames_decoded,
        report.frames_written,
        cli.output.display()
    );
    Ok(())
}
