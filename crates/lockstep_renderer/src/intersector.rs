//! Closest-hit queries against a whole scene.
//!
//! A plain linear scan over every shape; there is no acceleration structure.

use lockstep_core::{Geometry, Intersection, Scene, Shape};
use lockstep_math::Ray;

/// Hits at or below this distance are treated as the ray re-hitting the
/// surface it just left.
pub const SELF_INTERSECTION_EPSILON: f32 = 1e-4;

/// Index and distance of the nearest admissible hit among `geometries`.
///
/// Keeps the strictly smallest distance above [`SELF_INTERSECTION_EPSILON`];
/// equal distances keep the first shape in iteration order.
pub fn closest_hit<'g, I>(ray: &Ray, geometries: I) -> Option<(usize, f32)>
where
    I: IntoIterator<Item = &'g Geometry>,
{
    let mut closest: Option<(usize, f32)> = None;

    for (index, geometry) in geometries.into_iter().enumerate() {
        let Some(t) = geometry.hit_distance(ray) else {
            continue;
        };
        if t <= SELF_INTERSECTION_EPSILON {
            continue;
        }
        if closest.map_or(true, |(_, best)| t < best) {
            closest = Some((index, t));
        }
    }

    closest
}

/// Cast a ray into the scene and return the closest intersection.
pub fn cast_ray<'s>(ray: &Ray, scene: &'s Scene) -> Option<Intersection<'s>> {
    cast_ray_indexed(ray, scene).map(|(_, hit)| hit)
}

/// Like [`cast_ray`], also returning the 0-based scene index of the hit shape.
pub fn cast_ray_indexed<'s>(ray: &Ray, scene: &'s Scene) -> Option<(usize, Intersection<'s>)> {
    let (index, t) = closest_hit(ray, scene.shapes().iter().map(Shape::geometry))?;
    let shape = &scene[index];
    Some((index, Intersection::new(ray.at(t), shape, t)))
}
