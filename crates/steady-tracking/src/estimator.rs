//! Frame-to-frame motion estimation over a video sequence.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use steady_core::RigidMotion;

use crate::corners::detect_corners;
use crate::point_tracker::{LkParams, PointTracker, TrackStatus};
use crate::pyramid::GrayImage;
use crate::similarity::{ransac_rigid, MIN_CORRESPONDENCES};

/// Parameters for the motion estimation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorParams {
    /// Maximum tracked feature count per frame.
    pub max_corners: usize,
    /// FAST intensity threshold on [0, 1] pixel values.
    pub fast_threshold: f32,
    /// Minimum spacing between detected corners, in pixels.
    pub min_corner_distance: u32,
    /// Optical flow parameters.
    pub lk: LkParams,
    /// RANSAC sample count for the rigid fit.
    pub ransac_iterations: u32,
    /// RANSAC inlier threshold in pixels.
    pub ransac_threshold: f32,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            max_corners: 1000,
            fast_threshold: 0.06,
            min_corner_distance: 8,
            lk: LkParams::default(),
            ransac_iterations: 1000,
            ransac_threshold: 3.0,
        }
    }
}

/// Streaming estimator fed one grayscale frame at a time.
///
/// The first frame seeds the point set; every later frame produces one
/// [`RigidMotion`] entry, so after `n` frames the motion array holds
/// `n - 1` entries. Surviving tracked points carry over to the next
/// pair, and the set is re-seeded from the current frame whenever fewer
/// than `max_corners / 2` survive.
pub struct MotionEstimator {
    params: EstimatorParams,
    tracker: PointTracker,
    prev: Option<GrayImage>,
    points: Vec<Vec2>,
    motions: Vec<RigidMotion>,
}

impl MotionEstimator {
    pub fn new(params: EstimatorParams) -> Self {
        let tracker = PointTracker::new(params.lk.clone());
        Self {
            params,
            tracker,
            prev: None,
            points: Vec::new(),
            motions: Vec::new(),
        }
    }

    /// Feed the next frame of the sequence.
    pub fn process_frame(&mut self, gray: GrayImage) {
        if let Some(prev) = self.prev.take() {
            let results = self.tracker.track(&prev, &gray, &self.points);

            let mut src = Vec::with_capacity(results.len());
            let mut dst = Vec::with_capacity(results.len());
            for (point, result) in self.points.iter().zip(&results) {
                if result.status == TrackStatus::Tracked {
                    src.push(*point);
                    dst.push(result.position);
                }
            }

            let motion = if src.len() >= MIN_CORRESPONDENCES {
                ransac_rigid(
                    &src,
                    &dst,
                    self.params.ransac_iterations,
                    self.params.ransac_threshold,
                )
                .map(RigidMotion::from_affine)
                .unwrap_or(RigidMotion::ZERO)
            } else {
                RigidMotion::ZERO
            };
            self.motions.push(motion);

            // Survivors, at their new positions, seed the next pair.
            self.points = dst;
            if self.points.len() < self.params.max_corners / 2 {
                self.points = self.detect(&gray);
            }
        } else {
            self.points = self.detect(&gray);
        }
        self.prev = Some(gray);
    }

    fn detect(&self, gray: &GrayImage) -> Vec<Vec2> {
        detect_corners(
            gray,
            self.params.max_corners,
            self.params.fast_threshold,
            self.params.min_corner_distance,
        )
    }

    /// Number of points currently carried into the next frame pair.
    pub fn active_point_count(&self) -> usize {
        self.points.len()
    }

    /// Motions estimated so far, one per consecutive frame pair.
    pub fn motions(&self) -> &[RigidMotion] {
        &self.motions
    }

    /// Consume the estimator, yielding the motion array.
    pub fn into_motions(self) -> Vec<RigidMotion> {
        self.motions
    }
}
