//! Robust rigid-motion estimation from point correspondences.
//!
//! Fits a 2D rotation + translation (no scale, no shear) to matched point
//! pairs with RANSAC, then refines by least squares on the inlier set.

use glam::{Affine2, Mat2, Vec2};

/// Minimum number of correspondences required before attempting a fit.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Least-squares rigid fit (Kabsch in 2D).
///
/// Returns `None` for fewer than 2 pairs, mismatched slices, or a
/// degenerate configuration (all points coincident).
pub fn fit_rigid(src: &[Vec2], dst: &[Vec2]) -> Option<Affine2> {
    if src.len() < 2 || src.len() != dst.len() {
        return None;
    }
    let n = src.len() as f32;
    let src_centroid = src.iter().copied().sum::<Vec2>() / n;
    let dst_centroid = dst.iter().copied().sum::<Vec2>() / n;

    let mut a = 0.0f32;
    let mut b = 0.0f32;
    for (&p, &q) in src.iter().zip(dst.iter()) {
        let p = p - src_centroid;
        let q = q - dst_centroid;
        a += p.x * q.x + p.y * q.y;
        b += p.x * q.y - p.y * q.x;
    }
    if a * a + b * b < 1e-12 {
        return None;
    }
    let angle = b.atan2(a);
    let rotation = Mat2::from_angle(angle);
    let translation = dst_centroid - rotation * src_centroid;
    Some(Affine2::from_mat2_translation(rotation, translation))
}

/// RANSAC rigid fit tolerant of outlier correspondences.
///
/// Minimal samples are 2-point pairs; the consensus metric is the
/// reprojection distance against `threshold`. The winning model is
/// refined by a least-squares fit over its inliers. Sampling uses a
/// fixed-seed LCG so results are reproducible run to run.
///
/// Returns `None` when fewer than [`MIN_CORRESPONDENCES`] pairs are
/// given or no model gathers at least that many inliers.
pub fn ransac_rigid(
    src: &[Vec2],
    dst: &[Vec2],
    iterations: u32,
    threshold: f32,
) -> Option<Affine2> {
    let n = src.len();
    if n < MIN_CORRESPONDENCES || n != dst.len() {
        return None;
    }

    let mut best: Option<Affine2> = None;
    let mut best_inliers = 0usize;
    let mut seed = 12345u64;
    let next_index = |seed: &mut u64| {
        *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (*seed >> 33) as usize % n
    };

    for _ in 0..iterations {
        let i = next_index(&mut seed);
        let j = next_index(&mut seed);
        if i == j {
            continue;
        }
        let Some(model) = fit_rigid(&[src[i], src[j]], &[dst[i], dst[j]]) else {
            continue;
        };
        let inliers = count_inliers(&model, src, dst, threshold);
        if inliers > best_inliers {
            best_inliers = inliers;
            best = Some(model);
        }
    }

    let model = best?;
    if best_inliers < MIN_CORRESPONDENCES {
        return None;
    }

    // Refine on the consensus set.
    let mut inlier_src = Vec::with_capacity(best_inliers);
    let mut inlier_dst = Vec::with_capacity(best_inliers);
    for (&p, &q) in src.iter().zip(dst.iter()) {
        if model.transform_point2(p).distance(q) < threshold {
            inlier_src.push(p);
            inlier_dst.push(q);
        }
    }
    fit_rigid(&inlier_src, &inlier_dst).or(Some(model))
}

fn count_inliers(model: &Affine2, src: &[Vec2], dst: &[Vec2], threshold: f32) -> usize {
    src.iter()
        .zip(dst.iter())
        .filter(|(&p, &q)| model.transform_point2(p).distance(q) < threshold)
        .count()
}
