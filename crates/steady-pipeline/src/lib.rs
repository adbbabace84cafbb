//! Steady Pipeline - Two-pass offline video stabilization.
//!
//! The pipeline estimates per-frame rigid camera motion with sparse
//! optical flow, smooths the accumulated trajectory with a moving
//! average, and replays the input to emit motion-compensated frames.

pub mod pipeline;
pub mod source;
pub mod warp;

pub use pipeline::{
    run, stabilize_video, ProgressFn, StabilizationParams, StabilizationReport, StabilizeProgress,
};
pub use source::{FrameSink, FrameSource};
pub use warp::warp_rigid;
