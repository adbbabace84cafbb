//! Steady Tracking - Feature tracking and motion estimation.

pub mod corners;
pub mod estimator;
pub mod point_tracker;
pub mod pyramid;
pub mod similarity;
pub mod trajectory;

pub use corners::{detect_corners, Corner};
pub use estimator::{EstimatorParams, MotionEstimator};
pub use point_tracker::{LkParams, PointTracker, TrackResult, TrackStatus};
pub use pyramid::{GrayImage, ImagePyramid};
pub use similarity::{fit_rigid, ransac_rigid, MIN_CORRESPONDENCES};
pub use trajectory::{corrective_motions, cumulative_trajectory, smooth_trajectory};
