//! Small vector helpers that glam does not provide directly.

use crate::Vec3;

/// Rotate `v` about the Y axis given the cosine and sine of the angle.
///
/// Positive angles tilt +X toward +Z.
#[inline]
pub fn rotate_y(v: Vec3, c: f32, s: f32) -> Vec3 {
    Vec3::new(v.x * c - v.z * s, v.y, v.x * s + v.z * c)
}

/// Rotate `v` about the Z axis given the cosine and sine of the angle.
///
/// Positive angles turn +X toward +Y.
#[inline]
pub fn rotate_z(v: Vec3, c: f32, s: f32) -> Vec3 {
    Vec3::new(v.x * c - v.y * s, v.x * s + v.y * c, v.z)
}

/// Normalize `v`, leaving a zero vector unchanged.
#[inline]
pub fn normalize(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}
