use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use lockstep_core::load_scene_file;
use lockstep_renderer::{
    render, render_parallel, BackendError, BatchScheduler, Camera, EmulatedRaycaster,
    HardwareBackend, ImageBuffer, IntersectBackend, RenderConfig, RenderStats, Scene,
    SoftwareBackend, Vec3,
};

mod cli;
mod logger;

use cli::{Args, BackendKind};
use logger::init_logger;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.debug_level.into());

    let scene = load_scene_file(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    log::info!(
        "Loaded '{}': {} shapes, {} emissive",
        scene.name,
        scene.len(),
        scene.emitter_count()
    );

    let camera = build_camera(&args)?;
    let config = RenderConfig {
        rays_per_pixel: args.rays_per_pixel,
        max_depth: args.depth,
        batch_width: args.batch_width,
        seed: args.seed,
    };

    let start = Instant::now();
    let image = match args.backend {
        BackendKind::Reference => render(&camera, &scene, &config)?,
        BackendKind::Software => {
            let make_backend = || Ok(SoftwareBackend::new(args.batch_width));
            render_batched(&args, &scene, &camera, &config, make_backend)?
        }
        BackendKind::Emulated => {
            let timeout = Duration::from_millis(args.timeout_ms);
            let make_backend = || {
                Ok(HardwareBackend::new(
                    EmulatedRaycaster::with_capacity(args.device_capacity),
                    args.batch_width,
                )
                .with_timeout(timeout))
            };
            render_batched(&args, &scene, &camera, &config, make_backend)?
        }
    };
    log::info!("Render finished in {:.2?}", start.elapsed());

    image
        .save(&args.output)
        .with_context(|| format!("Failed to save image {}", args.output.display()))?;

    Ok(())
}

fn build_camera(args: &Args) -> Result<Camera> {
    let &[x, y, z] = args.position.as_slice() else {
        bail!("--position takes exactly three values, got {}", args.position.len());
    };
    if args.rows == 0 || args.cols == 0 {
        bail!("Image size must be at least 1x1, got {}x{}", args.cols, args.rows);
    }
    if !(args.fov.is_finite() && args.fov > 0.0 && args.fov < 180.0) {
        bail!("--fov must be between 0 and 180 degrees, got {}", args.fov);
    }
    if !args.pitch.is_finite() || !args.yaw.is_finite() {
        bail!("--pitch and --yaw must be finite, got {} and {}", args.pitch, args.yaw);
    }
    if ![x, y, z].iter().all(|c| c.is_finite()) {
        bail!("--position must be finite, got {},{},{}", x, y, z);
    }

    let camera = Camera::new()
        .with_resolution(args.rows, args.cols)
        .with_position(Vec3::new(x, y, z))
        .with_orientation(args.pitch, args.yaw)
        .with_fov(args.fov);
    camera.validate().context("Invalid camera settings")?;
    Ok(camera)
}

fn render_batched<B, F>(
    args: &Args,
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    make_backend: F,
) -> Result<ImageBuffer>
where
    B: IntersectBackend,
    F: Fn() -> Result<B, BackendError> + Sync,
{
    let (image, stats) = if args.parallel {
        render_parallel(scene, camera, config, make_backend)?
    } else {
        let backend = make_backend()?;
        let mut scheduler = BatchScheduler::new(scene, camera, config.clone(), backend)?;
        scheduler.render()?
    };
    report(&stats);
    Ok(image)
}

fn report(stats: &RenderStats) {
    log::info!(
        "{} passes, {} backend calls, {} rays, {} hits",
        stats.passes,
        stats.totals.batches,
        stats.totals.records,
        stats.totals.hits
    );
}
