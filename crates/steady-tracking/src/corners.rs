//! FAST corner detection for seeding the point tracker.
//!
//! Classifies a pixel as a corner when at least 9 contiguous pixels on the
//! Bresenham circle of radius 3 around it are all brighter or all darker
//! than the center by a threshold (FAST-9). Detected corners are ranked by
//! score and thinned to a minimum spacing before capping at the requested
//! count.

use glam::Vec2;

use crate::pyramid::GrayImage;

/// A detected corner with its position and strength.
#[derive(Debug, Clone, Copy)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

/// The 16-pixel Bresenham circle of radius 3, clockwise from 12 o'clock.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LENGTH: usize = 9;

/// Test a single pixel and return its corner score, or `None` if it is
/// not a corner. The score is the sum of absolute differences over the
/// circle pixels that exceed the threshold.
fn corner_score(img: &GrayImage, threshold: f32, x: u32, y: u32) -> Option<f32> {
    let center = img.get(x as i32, y as i32);
    let mut ring = [0.0f32; 16];
    for (i, (dx, dy)) in CIRCLE.iter().enumerate() {
        ring[i] = img.get(x as i32 + dx, y as i32 + dy);
    }

    // Longest contiguous run of brighter / darker pixels, wrapping around.
    let mut best_run = 0usize;
    for polarity in [1.0f32, -1.0] {
        let mut run = 0usize;
        let mut max_run = 0usize;
        for i in 0..32 {
            let v = ring[i % 16];
            if (v - center) * polarity > threshold {
                run += 1;
                max_run = max_run.max(run);
                if max_run >= 16 {
                    break;
                }
            } else {
                run = 0;
            }
        }
        best_run = best_run.max(max_run.min(16));
    }
    if best_run < ARC_LENGTH {
        return None;
    }

    let score: f32 = ring
        .iter()
        .map(|&v| {
            let d = (v - center).abs();
            if d > threshold {
                d - threshold
            } else {
                0.0
            }
        })
        .sum();
    Some(score)
}

/// Detect up to `max_corners` FAST-9 corners, strongest first, with a
/// minimum spacing of `min_distance` pixels between accepted corners.
pub fn detect_corners(
    img: &GrayImage,
    max_corners: usize,
    threshold: f32,
    min_distance: u32,
) -> Vec<Vec2> {
    if max_corners == 0 || img.width <= 6 || img.height <= 6 {
        return Vec::new();
    }

    let mut corners = Vec::new();
    for y in 3..img.height - 3 {
        for x in 3..img.width - 3 {
            if let Some(score) = corner_score(img, threshold, x, y) {
                corners.push(Corner { x, y, score });
            }
        }
    }
    corners.sort_by(|a, b| b.score.total_cmp(&a.score));

    // Greedy spacing suppression on a coarse bucket grid. A cell can
    // hold several accepted corners (in-cell diagonals may exceed the
    // minimum distance), so every candidate is checked against all
    // points in its 3x3 cell neighborhood.
    let cell = min_distance.max(1);
    let grid_w = img.width.div_ceil(cell) as usize;
    let grid_h = img.height.div_ceil(cell) as usize;
    let mut buckets: Vec<Vec<(u32, u32)>> = vec![Vec::new(); grid_w * grid_h];
    let min_dist_sq = (min_distance * min_distance) as i64;

    let mut selected = Vec::with_capacity(max_corners.min(corners.len()));
    'next: for corner in corners {
        let cx = (corner.x / cell) as i64;
        let cy = (corner.y / cell) as i64;
        for ny in (cy - 1).max(0)..=(cy + 1).min(grid_h as i64 - 1) {
            for nx in (cx - 1).max(0)..=(cx + 1).min(grid_w as i64 - 1) {
                for &(ox, oy) in &buckets[ny as usize * grid_w + nx as usize] {
                    let ddx = corner.x as i64 - ox as i64;
                    let ddy = corner.y as i64 - oy as i64;
                    if ddx * ddx + ddy * ddy < min_dist_sq {
                        continue 'next;
                    }
                }
            }
        }
        buckets[cy as usize * grid_w + cx as usize].push((corner.x, corner.y));
        selected.push(Vec2::new(corner.x as f32, corner.y as f32));
        if selected.len() >= max_corners {
            break;
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_with_square(w: u32, h: u32, x0: u32, y0: u32, size: u32) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for y in y0..(y0 + size).min(h) {
            for x in x0..(x0 + size).min(w) {
                img.set(x, y, 1.0);
            }
        }
        img
    }

    #[test]
    fn test_flat_image_has_no_corners() {
        let img = GrayImage::new(32, 32);
        assert!(detect_corners(&img, 100, 0.06, 4).is_empty());
    }

    #[test]
    fn test_square_produces_corners() {
        let img = image_with_square(64, 64, 20, 20, 16);
        let corners = detect_corners(&img, 100, 0.06, 4);
        assert!(!corners.is_empty());
        // All detections should cluster around the square's boundary.
        for c in &corners {
            assert!(c.x >= 16.0 && c.x <= 40.0, "corner x out of range: {}", c.x);
            assert!(c.y >= 16.0 && c.y <= 40.0, "corner y out of range: {}", c.y);
        }
    }

    #[test]
    fn test_max_corners_cap() {
        let mut img = GrayImage::new(128, 128);
        for by in 0..8u32 {
            for bx in 0..8u32 {
                for y in 0..6 {
                    for x in 0..6 {
                        img.set(bx * 16 + 4 + x, by * 16 + 4 + y, 1.0);
                    }
                }
            }
        }
        let corners = detect_corners(&img, 10, 0.06, 4);
        assert!(corners.len() <= 10);
        assert!(!corners.is_empty());
    }

    #[test]
    fn test_min_distance_spacing() {
        let img = image_with_square(64, 64, 20, 20, 16);
        let corners = detect_corners(&img, 100, 0.06, 8);
        for (i, a) in corners.iter().enumerate() {
            for b in corners.iter().skip(i + 1) {
                assert!((*a - *b).length() >= 8.0);
            }
        }
    }
}
