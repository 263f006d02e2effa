//! One bounce of path integration.
//!
//! Both tracing strategies share this step: the depth-first reference tracer
//! loops over it for a single ray, the batch scheduler applies it to every
//! result a backend returns.

use crate::sampling::random_hemisphere_vector;
use lockstep_core::Intersection;
use lockstep_math::{color_mult, Color, Ray, BLACK};
use rand::RngCore;

/// Outcome of advancing one path by one bounce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathStep {
    /// The path is finished; add this color to its pixel.
    Terminate(Color),
    /// The path bounced; trace `ray` next with the attenuated throughput.
    Continue { ray: Ray, throughput: Color },
}

impl PathStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PathStep::Terminate(_))
    }
}

/// Advance a path by one bounce.
///
/// - no hit: the ray escaped into the void, black
/// - emissive hit: `throughput * emittance * color / 255`
/// - last allowed bounce (`bounce == max_depth - 1`) without a light: black
/// - otherwise a uniform hemisphere bounce off the surface facing the ray
///
/// Bounces are sampled uniformly over the hemisphere, not cosine-weighted.
pub fn step(
    hit: Option<&Intersection<'_>>,
    ray: &Ray,
    throughput: Color,
    max_depth: u32,
    rng: &mut dyn RngCore,
) -> PathStep {
    let Some(hit) = hit else {
        return PathStep::Terminate(BLACK);
    };
    let shape = hit.shape;

    if shape.is_emissive() {
        return PathStep::Terminate(color_mult(throughput, shape.emittance() * shape.color()));
    }

    if ray.bounce() + 1 >= max_depth {
        return PathStep::Terminate(BLACK);
    }

    // Orient the normal against the incoming ray
    let mut normal = shape.normal(hit.point);
    if normal.dot(ray.direction()) > 0.0 {
        normal = -normal;
    }

    let diffuse_dir = random_hemisphere_vector(normal, rng);
    let throughput = color_mult(throughput, shape.color()) * normal.dot(diffuse_dir);

    PathStep::Continue {
        ray: ray.bounced(hit.point, diffuse_dir),
        throughput,
    }
}
