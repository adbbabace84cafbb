//! Media file probing via `ffprobe` JSON output.

use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use steady_core::{FrameRate, Result, SteadyError};
use tracing::debug;

/// Metadata of the primary video stream, queried once at open time.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Advertised frame count. Zero when the container does not report
    /// one and it cannot be derived from the duration; decoding to
    /// end-of-stream is then authoritative.
    pub frame_count: u64,
    /// Container duration in seconds, when reported.
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe the primary video stream of a media file.
pub fn probe_video<P: AsRef<Path>>(path: P) -> Result<VideoInfo> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SteadyError::Open(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_frames",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| SteadyError::Open(format!("failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(SteadyError::Open(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| SteadyError::Open(format!("unparseable ffprobe output: {e}")))?;
    let info = parse_probe(parsed)?;
    debug!(
        width = info.width,
        height = info.height,
        frames = info.frame_count,
        "probed video stream"
    );
    Ok(info)
}

fn parse_probe(parsed: FfprobeOutput) -> Result<VideoInfo> {
    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| SteadyError::Open("no video stream found".into()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(SteadyError::Open("video stream has no dimensions".into())),
    };

    let frame_rate: FrameRate = stream
        .r_frame_rate
        .as_deref()
        .unwrap_or("30")
        .parse()
        .unwrap_or_default();

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok());

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .or_else(|| duration.map(|d| (d * frame_rate.to_fps_f64()).round() as u64))
        .unwrap_or(0);

    Ok(VideoInfo {
        width,
        height,
        frame_rate,
        frame_count,
        duration,
    })
}
