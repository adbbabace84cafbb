//! Video decoder using FFmpeg via ffmpeg-sidecar.
//!
//! Spawns FFmpeg as a subprocess emitting raw RGB24 frames on stdout, so
//! no FFmpeg development headers are needed. Rewinding restarts the
//! subprocess from the first frame, which is how the stabilizer's second
//! pass replays the input.

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::path::{Path, PathBuf};
use steady_core::{FrameBuffer, FrameRate, Result, SteadyError};
use tracing::{info, warn};

use crate::probe::{probe_video, VideoInfo};

/// A decoded video frame with its position in the stream.
pub struct VideoFrame {
    /// Frame data in packed RGB24.
    pub buffer: FrameBuffer,
    /// 0-based frame number.
    pub frame_number: u64,
}

/// Sequential video decoder with rewind support.
pub struct VideoDecoder {
    path: PathBuf,
    info: VideoInfo,
    events: ffmpeg_sidecar::iter::FfmpegIterator,
    child: ffmpeg_sidecar::child::FfmpegChild,
    current_frame: u64,
    truncated: bool,
}

impl VideoDecoder {
    /// Open a video file for decoding. Probes stream metadata once and
    /// starts the decode process.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        info!("opening video file: {}", path.display());

        let info = probe_video(&path)?;
        let (child, events) = spawn_decode(&path)?;

        Ok(Self {
            path,
            info,
            events,
            child,
            current_frame: 0,
            truncated: false,
        })
    }

    /// The file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Video dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    /// The frame rate.
    pub fn frame_rate(&self) -> FrameRate {
        self.info.frame_rate
    }

    /// Advertised total frame count (zero when unknown).
    pub fn frame_count(&self) -> u64 {
        self.info.frame_count
    }

    /// 0-based number of the next frame to be decoded.
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Whether a mid-stream decode failure cut the stream short.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Decode the next frame, or `None` at end-of-stream.
    ///
    /// A failure mid-stream is treated as an early end-of-stream: the
    /// error is logged and `None` is returned, leaving the caller with
    /// the frames decoded so far.
    pub fn decode_frame(&mut self) -> Result<Option<VideoFrame>> {
        for event in self.events.by_ref() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    let buffer = FrameBuffer::from_raw(frame.width, frame.height, frame.data)?;
                    let frame_number = self.current_frame;
                    self.current_frame += 1;
                    return Ok(Some(VideoFrame {
                        buffer,
                        frame_number,
                    }));
                }
                FfmpegEvent::Error(message) | FfmpegEvent::Log(LogLevel::Fatal, message) => {
                    warn!(
                        frame = self.current_frame,
                        "decode failed mid-stream, truncating: {message}"
                    );
                    self.truncated = true;
                    return Ok(None);
                }
                FfmpegEvent::Done => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    /// Restart decoding from the first frame.
    pub fn rewind(&mut self) -> Result<()> {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let (child, events) = spawn_decode(&self.path)?;
        self.child = child;
        self.events = events;
        self.current_frame = 0;
        self.truncated = false;
        info!("rewound decoder to frame 0");
        Ok(())
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn_decode(
    path: &Path,
) -> Result<(
    ffmpeg_sidecar::child::FfmpegChild,
    ffmpeg_sidecar::iter::FfmpegIterator,
)> {
    let mut child = FfmpegCommand::new()
        .input(path.to_string_lossy())
        .rawvideo()
        .spawn()
        .map_err(|e| SteadyError::Open(format!("failed to spawn ffmpeg: {e}")))?;
    let events = child
        .iter()
        .map_err(|e| SteadyError::Open(format!("failed to read ffmpeg output: {e}")))?;
    Ok((child, events))
}
