//! Frame source and sink contracts for the two-pass pipeline.
//!
//! The pipeline makes two full passes over the input (estimation, then
//! resynthesis), so the rewind capability is part of the source
//! contract instead of an implicit re-open side effect.

use steady_core::{FrameBuffer, FrameRate, Result};
use steady_media::{VideoDecoder, VideoWriter};

/// A sequential supplier of video frames that can be rewound to frame 0.
pub trait FrameSource {
    /// Frame width in pixels, constant for the stream.
    fn width(&self) -> u32;

    /// Frame height in pixels, constant for the stream.
    fn height(&self) -> u32;

    /// The stream's frame rate.
    fn frame_rate(&self) -> FrameRate;

    /// Advertised total frame count; zero when unknown. End-of-stream is
    /// authoritative, so this may overestimate.
    fn frame_count(&self) -> u64;

    /// The next frame, or `None` at end-of-stream. A mid-stream decode
    /// failure surfaces as an early `None`, not an error.
    fn read_frame(&mut self) -> Result<Option<FrameBuffer>>;

    /// Reset to the first frame for the next pass.
    fn rewind(&mut self) -> Result<()>;
}

impl FrameSource for VideoDecoder {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn frame_rate(&self) -> FrameRate {
        VideoDecoder::frame_rate(self)
    }

    fn frame_count(&self) -> u64 {
        VideoDecoder::frame_count(self)
    }

    fn read_frame(&mut self) -> Result<Option<FrameBuffer>> {
        Ok(self.decode_frame()?.map(|frame| frame.buffer))
    }

    fn rewind(&mut self) -> Result<()> {
        VideoDecoder::rewind(self)
    }
}

/// A consumer of stabilized output frames.
pub trait FrameSink {
    /// Append one frame to the output.
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()>;

    /// Flush and close the output, returning the number of frames
    /// written.
    fn finish(&mut self) -> Result<u64>;
}

impl FrameSink for VideoWriter {
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        VideoWriter::write_frame(self, frame)
    }

    fn finish(&mut self) -> Result<u64> {
        VideoWriter::finish(self)
    }
}
