//! Lockstep renderer: batched, backend-agnostic path tracing.
//!
//! Two strategies render the same physics:
//! - [`render`]: depth-first reference tracer, one ray at a time
//! - [`BatchScheduler`]: breadth-first scheduler that advances every pixel's
//!   path in lockstep and offloads intersection to an [`IntersectBackend`]
//!   a fixed number of rays at a time
//!
//! Colors are 0-255 floats throughout; lights contribute
//! `throughput * emittance * color / 255`.

pub mod backend;
mod camera;
mod error;
pub mod integrator;
pub mod intersector;
mod output;
mod renderer;
pub mod sampling;
mod scheduler;

pub use backend::{
    BackendError, DmaLink, EmulatedRaycaster, HardwareBackend, IntersectBackend, SoftwareBackend,
    DEFAULT_BATCH_WIDTH,
};
pub use camera::Camera;
pub use error::{RenderError, RenderResult};
pub use integrator::{step, PathStep};
pub use intersector::{cast_ray, cast_ray_indexed, SELF_INTERSECTION_EPSILON};
pub use output::{clamp_color, ImageBuffer, PixelAccumulator, PixelTag};
pub use renderer::{render, render_pixel, trace_path, RenderConfig};
pub use scheduler::{render_parallel, BatchScheduler, PassStats, PathRecord, RenderStats};

/// Re-export the scene model and math types callers need alongside the renderer
pub use lockstep_core::{Intersection, Scene, Shape};
pub use lockstep_math::{Color, Ray, Vec3};
