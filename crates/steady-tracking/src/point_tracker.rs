//! Pyramidal Lucas-Kanade point tracker.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::pyramid::{GrayImage, ImagePyramid};

/// Tracking outcome for a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Tracked,
    Lost,
}

/// Result of tracking one point into the next frame.
///
/// Index `k` of the result slice corresponds to index `k` of the input
/// point set; filtering by status happens at the caller.
#[derive(Debug, Clone, Copy)]
pub struct TrackResult {
    pub position: Vec2,
    pub status: TrackStatus,
}

/// Lucas-Kanade parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LkParams {
    /// Side length of the square search window, in pixels.
    pub window_size: u32,
    /// Number of pyramid levels.
    pub pyramid_levels: u32,
    /// Iteration cap per pyramid level.
    pub max_iterations: u32,
    /// Convergence threshold on the per-iteration displacement update.
    pub epsilon: f32,
    /// Points that move farther than this between frames are lost.
    pub search_radius: f32,
}

impl Default for LkParams {
    fn default() -> Self {
        Self {
            window_size: 21,
            pyramid_levels: 3,
            max_iterations: 30,
            epsilon: 0.01,
            search_radius: 21.0,
        }
    }
}

/// Sparse optical flow tracker with pyramidal refinement.
#[derive(Debug, Clone, Default)]
pub struct PointTracker {
    pub params: LkParams,
}

impl PointTracker {
    pub fn new(params: LkParams) -> Self {
        Self { params }
    }

    /// Track each point from `prev` into `curr`.
    pub fn track(&self, prev: &GrayImage, curr: &GrayImage, points: &[Vec2]) -> Vec<TrackResult> {
        let prev_pyr = ImagePyramid::build(prev, self.params.pyramid_levels);
        let curr_pyr = ImagePyramid::build(curr, self.params.pyramid_levels);

        points
            .iter()
            .map(|&point| {
                match self.track_point_pyramidal(&prev_pyr, &curr_pyr, point) {
                    Some(new_pos) => {
                        let in_bounds = new_pos.x >= 0.0
                            && new_pos.y >= 0.0
                            && new_pos.x < curr.width as f32
                            && new_pos.y < curr.height as f32;
                        if !in_bounds || (new_pos - point).length() > self.params.search_radius {
                            TrackResult {
                                position: point,
                                status: TrackStatus::Lost,
                            }
                        } else {
                            TrackResult {
                                position: new_pos,
                                status: TrackStatus::Tracked,
                            }
                        }
                    }
                    None => TrackResult {
                        position: point,
                        status: TrackStatus::Lost,
                    },
                }
            })
            .collect()
    }

    fn track_point_pyramidal(
        &self,
        prev_pyr: &ImagePyramid,
        curr_pyr: &ImagePyramid,
        position: Vec2,
    ) -> Option<Vec2> {
        let levels = prev_pyr.levels.len();
        let mut guess = Vec2::ZERO;

        for level in (0..levels).rev() {
            let scale = 1.0 / (1u32 << level) as f32;
            let px = position.x * scale;
            let py = position.y * scale;
            let prev_img = &prev_pyr.levels[level];
            let curr_img = &curr_pyr.levels[level];
            let hw = (self.params.window_size as f32 * scale * 0.5) as i32;

            // Structure tensor over the window.
            let mut g11 = 0.0f32;
            let mut g12 = 0.0f32;
            let mut g22 = 0.0f32;

            for wy in -hw..=hw {
                for wx in -hw..=hw {
                    let ix = (prev_img.get(px as i32 + wx + 1, py as i32 + wy)
                        - prev_img.get(px as i32 + wx - 1, py as i32 + wy))
                        * 0.5;
                    let iy = (prev_img.get(px as i32 + wx, py as i32 + wy + 1)
                        - prev_img.get(px as i32 + wx, py as i32 + wy - 1))
                        * 0.5;
                    g11 += ix * ix;
                    g12 += ix * iy;
                    g22 += iy * iy;
                }
            }

            let det = g11 * g22 - g12 * g12;
            if det.abs() < 1e-6 {
                if level == 0 {
                    return None;
                }
                continue;
            }
            let inv_det = 1.0 / det;

            let mut dx = guess.x * scale;
            let mut dy = guess.y * scale;

            for _ in 0..self.params.max_iterations {
                let mut bx = 0.0f32;
                let mut by = 0.0f32;
                for wy in -hw..=hw {
                    for wx in -hw..=hw {
                        let ix = (prev_img.get(px as i32 + wx + 1, py as i32 + wy)
                            - prev_img.get(px as i32 + wx - 1, py as i32 + wy))
                            * 0.5;
                        let iy = (prev_img.get(px as i32 + wx, py as i32 + wy + 1)
                            - prev_img.get(px as i32 + wx, py as i32 + wy - 1))
                            * 0.5;
                        let it = curr_img.get((px + dx) as i32 + wx, (py + dy) as i32 + wy)
                            - prev_img.get(px as i32 + wx, py as i32 + wy);
                        bx += ix * it;
                        by += iy * it;
                    }
                }
                let ddx = inv_det * (g22 * bx - g12 * by);
                let ddy = inv_det * (-g12 * bx + g11 * by);
                dx -= ddx;
                dy -= ddy;
                if ddx * ddx + ddy * ddy < self.params.epsilon * self.params.epsilon {
                    break;
                }
            }
            guess = Vec2::new(dx / scale, dy / scale);
        }

        Some(position + guess)
    }
}
