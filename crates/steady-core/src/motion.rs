//! Rigid 2D motion model for frame-to-frame camera movement.

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

/// Estimated rigid motion (translation + rotation, no scale or shear)
/// from one frame to the next.
///
/// `da` is the rotation angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RigidMotion {
    pub dx: f32,
    pub dy: f32,
    pub da: f32,
}

impl RigidMotion {
    /// No motion.
    pub const ZERO: Self = Self {
        dx: 0.0,
        dy: 0.0,
        da: 0.0,
    };

    /// Create a motion from components.
    #[inline]
    pub const fn new(dx: f32, dy: f32, da: f32) -> Self {
        Self { dx, dy, da }
    }

    /// Build the affine transform: rotation by `da` composed with
    /// translation by `(dx, dy)`.
    #[inline]
    pub fn to_affine(self) -> Affine2 {
        Affine2::from_angle_translation(self.da, Vec2::new(self.dx, self.dy))
    }

    /// Recover motion components from a similarity transform.
    ///
    /// The rotation angle comes out of `atan2` on the first column of the
    /// linear block; translation is read off directly. Any scale present
    /// in the transform is discarded.
    #[inline]
    pub fn from_affine(t: Affine2) -> Self {
        Self {
            dx: t.translation.x,
            dy: t.translation.y,
            da: t.matrix2.x_axis.y.atan2(t.matrix2.x_axis.x),
        }
    }

    /// Apply the motion to a point.
    #[inline]
    pub fn transform_point(self, p: Vec2) -> Vec2 {
        self.to_affine().transform_point2(p)
    }
}

impl Add for RigidMotion {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.dx + rhs.dx, self.dy + rhs.dy, self.da + rhs.da)
    }
}

impl AddAssign for RigidMotion {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for RigidMotion {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.dx - rhs.dx, self.dy - rhs.dy, self.da - rhs.da)
    }
}
