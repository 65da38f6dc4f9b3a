//! 2D math helpers on top of glam
//!
//! Matrices are column-major, matching WGSL `mat4x4<f32>`.

use glam::{Mat4, Vec2, Vec4};

/// Orthographic projection for a Y-up world.
///
/// Maps `left..right` to -1..1 and `bottom..top` to -1..1. Depth is dropped
/// (z_clip = 0) since sprites are layered by draw order, not the depth buffer.
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32) -> Mat4 {
    let lr = 1.0 / (left - right);
    let bt = 1.0 / (bottom - top);
    Mat4::from_cols(
        Vec4::new(-2.0 * lr, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -2.0 * bt, 0.0, 0.0),
        Vec4::ZERO,
        Vec4::new((left + right) * lr, (top + bottom) * bt, 0.0, 1.0),
    )
}

/// Translation in the XY plane
#[inline]
pub fn translation(offset: Vec2) -> Mat4 {
    Mat4::from_translation(offset.extend(0.0))
}

/// Rotate `v` counter-clockwise by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

/// Clamp to [0, 1]
#[inline]
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Position of `x` between `edge0` and `edge1` (unclamped)
#[inline]
pub fn step(edge0: f64, edge1: f64, x: f64) -> f64 {
    (x - edge0) / (edge1 - edge0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_ortho_maps_corners() {
        let m = ortho(-180.0, 180.0, -260.0, 260.0);
        let origin = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.x.abs() < 1e-6 && origin.y.abs() < 1e-6);

        let corner = m * Vec4::new(180.0, 260.0, 0.0, 1.0);
        assert!((corner.x - 1.0).abs() < 1e-6);
        assert!((corner.y - 1.0).abs() < 1e-6);
        assert_eq!(corner.z, 0.0);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_translation_moves_points() {
        let m = translation(Vec2::new(-10.0, 5.0));
        let p = m.transform_point3(glam::Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(p.truncate(), Vec2::new(0.0, 5.0));
    }

    #[test]
    fn test_step_and_clamp() {
        assert_eq!(clamp01(step(100.0, 400.0, 250.0)), 0.5);
        assert_eq!(clamp01(step(100.0, 400.0, 900.0)), 1.0);
        assert_eq!(clamp01(step(100.0, 400.0, 0.0)), 0.0);
    }
}
