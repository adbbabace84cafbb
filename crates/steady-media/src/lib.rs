//! Steady Media - FFmpeg integration for video I/O
//!
//! This crate handles:
//! - Media file probing (`ffprobe` JSON)
//! - Sequential video decoding with rewind
//! - Encoding raw frames into a video file

pub mod decoder;
pub mod probe;
pub mod writer;

pub use decoder::{VideoDecoder, VideoFrame};
pub use probe::{probe_video, VideoInfo};
pub use writer::{OutputSettings, VideoCodec, VideoWriter};
