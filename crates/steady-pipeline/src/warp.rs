//! Affine frame warping with bilinear sampling and edge replication.

use glam::Vec2;
use steady_core::{FrameBuffer, RigidMotion};

/// Apply a rigid corrective motion to a color frame.
///
/// Each destination pixel is sampled from the source through the inverse
/// transform with bilinear interpolation. Samples falling outside the
/// source replicate the nearest border pixel, so the output has no black
/// borders.
pub fn warp_rigid(src: &FrameBuffer, motion: RigidMotion) -> FrameBuffer {
    let inverse = motion.to_affine().inverse();
    let mut dst = FrameBuffer::new(src.width(), src.height());

    for y in 0..src.height() {
        for x in 0..src.width() {
            let p = inverse.transform_point2(Vec2::new(x as f32, y as f32));
            dst.set_pixel(x, y, sample_bilinear(src, p));
        }
    }
    dst
}

fn sample_bilinear(src: &FrameBuffer, p: Vec2) -> [u8; 3] {
    let x0 = p.x.floor();
    let y0 = p.y.floor();
    let fx = p.x - x0;
    let fy = p.y - y0;
    let x0 = x0 as i64;
    let y0 = y0 as i64;

    let c00 = src.pixel_clamped(x0, y0);
    let c10 = src.pixel_clamped(x0 + 1, y0);
    let c01 = src.pixel_clamped(x0, y0 + 1);
    let c11 = src.pixel_clamped(x0 + 1, y0 + 1);

    let mut out = [0u8; 3];
    for ch in 0..3 {
        let top = c00[ch] as f32 * (1.0 - fx) + c10[ch] as f32 * fx;
        let bottom = c01[ch] as f32 * (1.0 - fx) + c11[ch] as f32 * fx;
        out[ch] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}
