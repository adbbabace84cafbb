//! Steady Core - Foundation types for video stabilization
//!
//! This crate provides the fundamental types used throughout Steady:
//! - Frame buffers and frame rates
//! - The rigid motion model and its affine form
//! - Error types

pub mod error;
pub mod frame;
pub mod motion;

pub use error::{Result, SteadyError};
pub use frame::{FrameBuffer, FrameRate};
pub use motion::RigidMotion;
