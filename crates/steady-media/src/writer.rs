//! Video encoding by piping raw frames into an FFmpeg child process.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use steady_core::{FrameBuffer, FrameRate, Result, SteadyError};
use tracing::info;

/// Output video codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoCodec {
    #[default]
    H264,
    H265,
    Vp9,
}

impl VideoCodec {
    /// FFmpeg encoder name.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Vp9 => "libvpx-vp9",
        }
    }

    /// File extension for this codec.
    pub fn extension(self) -> &'static str {
        match self {
            Self::H264 | Self::H265 => "mp4",
            Self::Vp9 => "webm",
        }
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    pub codec: VideoCodec,
    /// CRF value (0-51 for H.264/H.265, lower = better).
    pub crf: Option<u32>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            codec: VideoCodec::H264,
            crf: Some(18),
        }
    }
}

/// Build the FFmpeg argument list for encoding raw RGB24 frames piped on
/// stdin into the given output file.
pub fn encode_args(
    output_path: &Path,
    width: u32,
    height: u32,
    frame_rate: FrameRate,
    settings: &OutputSettings,
) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    // Input from pipe (raw frames)
    args.extend_from_slice(&[
        "-y".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pixel_format".into(),
        "rgb24".into(),
        "-video_size".into(),
        format!("{}x{}", width, height),
        "-framerate".into(),
        format!("{}/{}", frame_rate.numerator, frame_rate.denominator),
        "-i".into(),
        "pipe:0".into(),
    ]);

    // Video codec
    args.extend_from_slice(&["-c:v".into(), settings.codec.ffmpeg_encoder().into()]);
    if let Some(crf) = settings.crf {
        args.extend_from_slice(&["-crf".into(), crf.to_string()]);
    }

    // Pixel format for output
    args.extend_from_slice(&["-pix_fmt".into(), "yuv420p".into()]);

    // Output
    args.push(output_path.to_string_lossy().into_owned());

    args
}

/// Frame-by-frame video writer backed by an FFmpeg child process.
pub struct VideoWriter {
    path: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl VideoWriter {
    /// Spawn the encoder. This creates the output file.
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        frame_rate: FrameRate,
        settings: &OutputSettings,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let args = encode_args(&path, width, height, frame_rate, settings);

        info!(
            "encoding {} ({}x{} @ {})",
            path.display(),
            width,
            height,
            frame_rate
        );

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SteadyError::Encode(format!("failed to spawn ffmpeg: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SteadyError::Encode("failed to open ffmpeg stdin".into()))?;

        Ok(Self {
            path,
            child,
            stdin: Some(stdin),
            width,
            height,
            frames_written: 0,
        })
    }

    /// The output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Write one frame. Dimensions must match the writer's.
    pub fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(SteadyError::Encode(format!(
                "frame is {}x{}, writer expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SteadyError::Encode("writer already finished".into()))?;
        stdin
            .write_all(frame.data())
            .map_err(|e| SteadyError::Encode(format!("failed to write frame: {e}")))?;
        self.frames_written += 1;
        Ok(())
    }

    /// Close stdin to signal end-of-stream and wait for the encoder.
    pub fn finish(&mut self) -> Result<u64> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| SteadyError::Encode(format!("failed to wait for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(SteadyError::Encode(format!(
                "ffmpeg exited with status: {status}"
            )));
        }
        info!(
            "wrote {} frames to {}",
            self.frames_written,
            self.path.display()
        );
        Ok(self.frames_written)
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        // Finishing normally already reaped the child; otherwise make
        // sure the encoder does not outlive the writer.
        if self.stdin.is_some() {
            drop(self.stdin.take());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
