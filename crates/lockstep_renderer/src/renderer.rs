//! Render configuration and the depth-first reference tracer.
//!
//! The reference tracer follows one ray at a time to termination. It runs the
//! same [`step`] as the batch scheduler and serves as a correctness check for
//! batched renders.

use crate::error::{RenderError, RenderResult};
use crate::integrator::{step, PathStep};
use crate::intersector::cast_ray;
use crate::output::{clamp_color, ImageBuffer};
use crate::sampling::stream_seed;
use crate::{backend::DEFAULT_BATCH_WIDTH, Camera};
use lockstep_core::Scene;
use lockstep_math::{Color, Ray, WHITE};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Sample passes; each pass traces one path per pixel
    pub rays_per_pixel: u32,
    /// Maximum path length in bounces
    pub max_depth: u32,
    /// Rays per backend call for batched renders
    pub batch_width: usize,
    /// Base seed; every pass and row derives its own stream from it
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            rays_per_pixel: 4,
            max_depth: 4,
            batch_width: DEFAULT_BATCH_WIDTH,
            seed: 0,
        }
    }
}

impl RenderConfig {
    /// Reject settings that cannot produce an image.
    pub fn validate(&self) -> RenderResult<()> {
        if self.rays_per_pixel == 0 {
            return Err(RenderError::InvalidConfig(
                "rays per pixel must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(RenderError::InvalidConfig(
                "max depth must be at least 1".to_string(),
            ));
        }
        if self.batch_width == 0 {
            return Err(RenderError::InvalidConfig(
                "batch width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Follow one path to termination and return its color.
pub fn trace_path(ray: Ray, scene: &Scene, max_depth: u32, rng: &mut dyn RngCore) -> Color {
    let mut ray = ray;
    let mut throughput = WHITE;

    loop {
        let hit = cast_ray(&ray, scene);
        match step(hit.as_ref(), &ray, throughput, max_depth, rng) {
            PathStep::Terminate(color) => return color,
            PathStep::Continue {
                ray: next,
                throughput: next_throughput,
            } => {
                ray = next;
                throughput = next_throughput;
            }
        }
    }
}

/// Average `rays_per_pixel` jittered paths through one pixel.
pub fn render_pixel(
    camera: &Camera,
    scene: &Scene,
    row: u32,
    col: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..config.rays_per_pixel {
        let ray = camera.get_ray(row, col, rng);
        pixel_color += trace_path(ray, scene, config.max_depth, rng);
    }

    clamp_color(pixel_color / config.rays_per_pixel.max(1) as f32)
}

/// Render the whole image depth-first, one row per rayon task.
///
/// Row `r` draws from a generator seeded with `(config.seed, r)`, so the
/// result does not depend on thread scheduling.
pub fn render(camera: &Camera, scene: &Scene, config: &RenderConfig) -> RenderResult<ImageBuffer> {
    config.validate()?;
    camera.validate()?;

    log::info!(
        "Reference render of '{}': {}x{}, {} rays/pixel, depth {}",
        scene.name,
        camera.cols,
        camera.rows,
        config.rays_per_pixel,
        config.max_depth
    );

    let mut image = ImageBuffer::new(camera.rows, camera.cols);
    let cols = camera.cols.max(1) as usize;

    image
        .pixels
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, pixels)| {
            let mut rng = StdRng::seed_from_u64(stream_seed(config.seed, row as u64));
            for (col, pixel) in pixels.iter_mut().enumerate() {
                *pixel = render_pixel(camera, scene, row as u32, col as u32, config, &mut rng);
            }
        });

    Ok(image)
}
