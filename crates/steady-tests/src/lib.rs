//! Integration test crate for Steady.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It runs the full stabilization pipeline against synthetic in-memory
//! frame sources, so no FFmpeg installation is required.

#[cfg(test)]
mod pipeline;
