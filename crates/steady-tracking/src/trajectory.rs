//! Trajectory accumulation, smoothing, and corrective motion.
//!
//! The camera trajectory is the running cumulative sum of per-frame
//! motions. A centered moving average smooths it, and the corrective
//! motion for each frame replaces the raw per-frame jump with the
//! smoothed one:
//!
//! `corrective[i] = motion[i] + (smoothed[i] - trajectory[i])`

use steady_core::RigidMotion;

/// Running cumulative sum of per-frame motions, component-wise.
///
/// `trajectory[i]` is the absolute camera displacement accumulated over
/// frame pairs `0..=i`.
pub fn cumulative_trajectory(motions: &[RigidMotion]) -> Vec<RigidMotion> {
    let mut trajectory = Vec::with_capacity(motions.len());
    let mut acc = RigidMotion::ZERO;
    for &motion in motions {
        acc += motion;
        trajectory.push(acc);
    }
    trajectory
}

/// Centered moving average with window length `window`.
///
/// The output has the same length as the input. At the boundaries the
/// window shrinks to what fits instead of padding with zeros, so the
/// first and last `window / 2` entries are filtered less aggressively
/// than the interior.
pub fn smooth_trajectory(trajectory: &[RigidMotion], window: usize) -> Vec<RigidMotion> {
    let n = trajectory.len();
    let radius = window / 2;
    if n == 0 || radius == 0 {
        return trajectory.to_vec();
    }

    let mut smoothed = Vec::with_capacity(n);
    for i in 0..n {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius).min(n - 1);
        let count = (hi - lo + 1) as f32;
        let mut sum = RigidMotion::ZERO;
        for &value in &trajectory[lo..=hi] {
            sum += value;
        }
        smoothed.push(RigidMotion::new(
            sum.dx / count,
            sum.dy / count,
            sum.da / count,
        ));
    }
    smoothed
}

/// Per-frame corrective motions that steer the camera along the smoothed
/// trajectory instead of the raw one.
pub fn corrective_motions(motions: &[RigidMotion], window: usize) -> Vec<RigidMotion> {
    let trajectory = cumulative_trajectory(motions);
    let smoothed = smooth_trajectory(&trajectory, window);
    motions
        .iter()
        .zip(trajectory.iter().zip(smoothed.iter()))
        .map(|(&motion, (&raw, &smooth))| motion + (smooth - raw))
        .collect()
}
