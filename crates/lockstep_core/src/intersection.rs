use lockstep_math::Vec3;

use crate::shape::Shape;

/// Result of intersecting one ray with the scene.
///
/// Borrows the hit shape from the scene; intersections never outlive the
/// scene they were computed against.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a> {
    /// Point of intersection
    pub point: Vec3,
    /// The shape that was hit
    pub shape: &'a Shape,
    /// Distance along the (unit-direction) ray
    pub distance: f32,
}

impl<'a> Intersection<'a> {
    pub fn new(point: Vec3, shape: &'a Shape, distance: f32) -> Self {
        Self {
            point,
            shape,
            distance,
        }
    }

    /// True if both intersections refer to the same scene shape.
    pub fn same_shape(&self, other: &Intersection<'_>) -> bool {
        std::ptr::eq(self.shape, other.shape)
    }
}
