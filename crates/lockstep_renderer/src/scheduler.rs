//! Breadth-first batch scheduler.
//!
//! Every pass seeds one primary path per pixel into a FIFO queue, then
//! repeatedly hands the backend up to `width` rays at a time. Each result goes
//! through the path integrator: terminal colors land in the pixel
//! accumulator, continuations go to the back of the queue. All primary rays
//! of a pass are therefore intersected before any first bounce, all first
//! bounces before any second bounce, and so on.
//!
//! Per pass, with R x C pixels, depth D and width W:
//! - at most R * C * D records are dispatched
//! - the backend is called at most D * ceil(R * C / W) times

use std::collections::VecDeque;
use std::ops::AddAssign;
use std::time::{Duration, Instant};

use crate::backend::{BackendError, IntersectBackend};
use crate::error::{RenderError, RenderResult};
use crate::integrator::{step, PathStep};
use crate::output::{ImageBuffer, PixelAccumulator, PixelTag};
use crate::renderer::RenderConfig;
use crate::sampling::stream_seed;
use crate::Camera;
use lockstep_core::Scene;
use lockstep_math::{Color, Ray, WHITE};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

/// One in-flight path: the ray to trace next, the pixel it belongs to and
/// the throughput accumulated so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathRecord {
    pub ray: Ray,
    pub pixel: PixelTag,
    pub throughput: Color,
}

impl PathRecord {
    /// A primary path starting with full throughput.
    pub fn primary(ray: Ray, pixel: PixelTag) -> Self {
        Self {
            ray,
            pixel,
            throughput: WHITE,
        }
    }
}

/// Counters for one sample pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Backend invocations
    pub batches: u64,
    /// Path records dispatched to the backend
    pub records: u64,
    /// Records whose ray hit a shape
    pub hits: u64,
}

impl AddAssign for PassStats {
    fn add_assign(&mut self, other: Self) {
        self.batches += other.batches;
        self.records += other.records;
        self.hits += other.hits;
    }
}

/// Totals for a whole render.
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    pub passes: u32,
    pub totals: PassStats,
    pub elapsed: Duration,
}

impl RenderStats {
    /// Rays intersected per second of wall time.
    pub fn rays_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.totals.records as f64 / secs
        } else {
            0.0
        }
    }

    /// Mean rays dispatched per backend call.
    pub fn mean_batch_fill(&self) -> f64 {
        if self.totals.batches == 0 {
            0.0
        } else {
            self.totals.records as f64 / self.totals.batches as f64
        }
    }
}

/// Drives an [`IntersectBackend`] through breadth-first sample passes.
pub struct BatchScheduler<'a, B: IntersectBackend> {
    scene: &'a Scene,
    camera: &'a Camera,
    config: RenderConfig,
    backend: B,
    width: usize,
}

impl<'a, B: IntersectBackend> BatchScheduler<'a, B> {
    /// Validate the configuration and make the scene available to `backend`.
    ///
    /// Batches are as wide as the narrower of `config.batch_width` and the
    /// backend's own width.
    pub fn new(
        scene: &'a Scene,
        camera: &'a Camera,
        config: RenderConfig,
        mut backend: B,
    ) -> RenderResult<Self> {
        config.validate()?;
        camera.validate()?;

        let width = config.batch_width.min(backend.batch_width());
        if width == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "backend '{}' reports a batch width of 0",
                backend.name()
            )));
        }

        backend.prepare(scene)?;
        log::debug!(
            "Prepared '{}' backend for '{}' ({} shapes), batch width {}",
            backend.name(),
            scene.name,
            scene.len(),
            width
        );

        Ok(Self {
            scene,
            camera,
            config,
            backend,
            width,
        })
    }

    /// Rays per backend call.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Trace one sample pass: one path per pixel, run to termination.
    ///
    /// Returns the pass's accumulator, in which every pixel holds exactly one
    /// contribution.
    pub fn trace_pass(
        &mut self,
        rng: &mut dyn RngCore,
    ) -> RenderResult<(PixelAccumulator, PassStats)> {
        let camera = self.camera;
        let max_depth = self.config.max_depth;

        let mut queue: VecDeque<PathRecord> = VecDeque::with_capacity(camera.pixel_count());
        for row in 0..camera.rows {
            for col in 0..camera.cols {
                let ray = camera.get_ray(row, col, rng);
                queue.push_back(PathRecord::primary(ray, PixelTag::new(row, col)));
            }
        }

        let mut accumulator = PixelAccumulator::new(camera.rows, camera.cols);
        let mut stats = PassStats::default();
        let mut batch: Vec<PathRecord> = Vec::with_capacity(self.width);
        let mut rays: Vec<Ray> = Vec::with_capacity(self.width);

        while !queue.is_empty() {
            let n = self.width.min(queue.len());
            batch.clear();
            batch.extend(queue.drain(..n));
            rays.clear();
            rays.extend(batch.iter().map(|record| record.ray));

            let hits = self.backend.batch_intersect(self.scene, &rays)?;
            if hits.len() != n {
                return Err(BackendError::Misaligned {
                    expected: n,
                    found: hits.len(),
                }
                .into());
            }
            stats.batches += 1;
            stats.records += n as u64;

            log::trace!(
                "Batch {}: {} rays, {} queued",
                stats.batches,
                n,
                queue.len()
            );

            for (record, hit) in batch.iter().zip(&hits) {
                if hit.is_some() {
                    stats.hits += 1;
                }
                match step(hit.as_ref(), &record.ray, record.throughput, max_depth, rng) {
                    PathStep::Terminate(color) => accumulator.add(record.pixel, color),
                    PathStep::Continue { ray, throughput } => queue.push_back(PathRecord {
                        ray,
                        pixel: record.pixel,
                        throughput,
                    }),
                }
            }
        }

        if let Some((pixel, samples)) = accumulator.find_incomplete(1) {
            return Err(RenderError::IncompletePass {
                row: pixel.row,
                col: pixel.col,
                samples,
            });
        }

        Ok((accumulator, stats))
    }

    /// Run `rays_per_pixel` passes and average them into an image.
    ///
    /// Pass `p` draws from a generator seeded with `(config.seed, p)`, the
    /// same streams [`render_parallel`] uses.
    pub fn render(&mut self) -> RenderResult<(ImageBuffer, RenderStats)> {
        let start = Instant::now();
        let mut accumulator = PixelAccumulator::new(self.camera.rows, self.camera.cols);
        let mut stats = RenderStats::default();

        log::info!(
            "Batched render of '{}' on '{}': {}x{}, {} rays/pixel, depth {}, width {}",
            self.scene.name,
            self.backend.name(),
            self.camera.cols,
            self.camera.rows,
            self.config.rays_per_pixel,
            self.config.max_depth,
            self.width
        );

        for pass in 0..self.config.rays_per_pixel {
            let mut rng = StdRng::seed_from_u64(stream_seed(self.config.seed, pass as u64));
            let (pass_accumulator, pass_stats) = self.trace_pass(&mut rng)?;
            log_pass(pass, &pass_stats);

            accumulator.merge(&pass_accumulator);
            stats.totals += pass_stats;
            stats.passes += 1;
        }

        stats.elapsed = start.elapsed();
        log_summary(&stats);
        Ok((accumulator.resolve(self.config.rays_per_pixel), stats))
    }
}

/// Render with sample passes spread across the rayon thread pool.
///
/// Each pass gets its own backend from `make_backend` and its own generator
/// seeded with `(config.seed, pass)`. Passes run in groups of one per pool
/// thread, so at most that many per-pass buffers are alive at once. Each
/// group is merged in pass order, so the image matches
/// [`BatchScheduler::render`] with the same seed.
pub fn render_parallel<B, F>(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    make_backend: F,
) -> RenderResult<(ImageBuffer, RenderStats)>
where
    B: IntersectBackend,
    F: Fn() -> Result<B, BackendError> + Sync,
{
    config.validate()?;
    camera.validate()?;
    let start = Instant::now();
    let group = rayon::current_num_threads().max(1) as u32;

    log::info!(
        "Parallel batched render of '{}': {}x{}, {} passes on {} threads",
        scene.name,
        camera.cols,
        camera.rows,
        config.rays_per_pixel,
        group
    );

    let mut accumulator = PixelAccumulator::new(camera.rows, camera.cols);
    let mut stats = RenderStats::default();
    let mut first = 0;

    while first < config.rays_per_pixel {
        let last = first.saturating_add(group).min(config.rays_per_pixel);
        let passes = (first..last)
            .into_par_iter()
            .map(|pass| -> RenderResult<(PixelAccumulator, PassStats)> {
                let backend = make_backend()?;
                let mut scheduler = BatchScheduler::new(scene, camera, config.clone(), backend)?;
                let mut rng = StdRng::seed_from_u64(stream_seed(config.seed, pass as u64));
                let (accumulator, stats) = scheduler.trace_pass(&mut rng)?;
                log_pass(pass, &stats);
                Ok((accumulator, stats))
            })
            .collect::<RenderResult<Vec<_>>>()?;

        for (pass_accumulator, pass_stats) in &passes {
            accumulator.merge(pass_accumulator);
            stats.totals += *pass_stats;
            stats.passes += 1;
        }
        first = last;
    }

    stats.elapsed = start.elapsed();
    log_summary(&stats);
    Ok((accumulator.resolve(config.rays_per_pixel), stats))
}

fn log_pass(pass: u32, stats: &PassStats) {
    log::debug!(
        "Pass {}: {} batches, {} records, {} hits",
        pass,
        stats.batches,
        stats.records,
        stats.hits
    );
}

fn log_summary(stats: &RenderStats) {
    log::info!(
        "Rendered {} passes in {:.2?}: {} batches, {} rays ({:.0} rays/s, {:.1} rays/batch)",
        stats.passes,
        stats.elapsed,
        stats.totals.batches,
        stats.totals.records,
        stats.rays_per_second(),
        stats.mean_batch_fill()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use lockstep_core::{Intersection, Shape};
    use lockstep_math::Vec3;

    /// Software backend that records the bounce index of every ray it sees.
    struct RecordingBackend {
        inner: SoftwareBackend,
        bounces: Vec<u32>,
        batch_sizes: Vec<usize>,
    }

    impl RecordingBackend {
        fn new(width: usize) -> Self {
            Self {
                inner: SoftwareBackend::new(width),
                bounces: Vec::new(),
                batch_sizes: Vec::new(),
            }
        }
    }

    impl IntersectBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn batch_width(&self) -> usize {
            self.inner.batch_width()
        }

        fn batch_intersect<'s>(
            &mut self,
            scene: &'s Scene,
            rays: &[Ray],
        ) -> Result<Vec<Option<Intersection<'s>>>, BackendError> {
            self.bounces.extend(rays.iter().map(Ray::bounce));
            self.batch_sizes.push(rays.len());
            self.inner.batch_intersect(scene, rays)
        }
    }

    /// Backend that drops the last result of every batch.
    struct LossyBackend;

    impl IntersectBackend for LossyBackend {
        fn name(&self) -> &'static str {
            "lossy"
        }

        fn batch_width(&self) -> usize {
            4
        }

        fn batch_intersect<'s>(
            &mut self,
            _scene: &'s Scene,
            rays: &[Ray],
        ) -> Result<Vec<Option<Intersection<'s>>>, BackendError> {
            Ok(vec![None; rays.len().saturating_sub(1)])
        }
    }

    fn emissive_wall() -> Scene {
        Scene::from_shapes(
            "wall",
            vec![Shape::plane(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X)
                .with_color(Vec3::new(120.0, 60.0, 30.0))
                .with_emittance(1.5)],
        )
    }

    /// Diffuse box around the camera with one emissive sphere inside.
    fn closed_room() -> Scene {
        let walls = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        let mut shapes: Vec<Shape> = walls
            .into_iter()
            .map(|n| Shape::plane(n * 4.0, -n).with_color(Vec3::splat(200.0)))
            .collect();
        shapes.push(
            Shape::sphere(Vec3::new(3.0, 1.0, 2.5), 0.5)
                .with_color(Vec3::splat(255.0))
                .with_emittance(8.0),
        );
        Scene::from_shapes("room", shapes)
    }

    #[test]
    fn test_emissive_wall_any_width() {
        let scene = emissive_wall();
        let camera = Camera::new().with_resolution(5, 7).with_fov(60.0);
        let expected = Vec3::new(180.0, 90.0, 45.0);

        for width in [1, 4, 16, 1000] {
            let config = RenderConfig {
                rays_per_pixel: 2,
                batch_width: width,
                ..Default::default()
            };
            let mut scheduler =
                BatchScheduler::new(&scene, &camera, config, SoftwareBackend::new(width)).unwrap();
            let (image, stats) = scheduler.render().unwrap();

            for pixel in &image.pixels {
                assert!(
                    (*pixel - expected).abs().max_element() < 1e-3,
                    "width {}: {:?}",
                    width,
                    pixel
                );
            }
            let pixels = 35u64;
            let w = width as u64;
            assert_eq!(stats.totals.records, 2 * pixels);
            assert_eq!(stats.totals.batches, 2 * ((pixels + w - 1) / w));
        }
    }

    #[test]
    fn test_breadth_first_order() {
        let scene = closed_room();
        let camera = Camera::new().with_resolution(4, 6);
        let config = RenderConfig {
            rays_per_pixel: 1,
            max_depth: 5,
            batch_width: 8,
            ..Default::default()
        };
        let mut scheduler =
            BatchScheduler::new(&scene, &camera, config, RecordingBackend::new(8)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        scheduler.trace_pass(&mut rng).unwrap();

        let bounces = &scheduler.backend().bounces;
        assert!(bounces.windows(2).all(|w| w[0] <= w[1]), "{:?}", bounces);
        assert!(bounces[..24].iter().all(|&b| b == 0));
        assert!(bounces.iter().any(|&b| b > 0));
    }

    #[test]
    fn test_pass_bounds() {
        let scene = closed_room();
        let (rows, cols, depth) = (6u32, 5u32, 4u32);
        let camera = Camera::new().with_resolution(rows, cols);
        let pixels = (rows * cols) as u64;

        for width in [1usize, 3, 7, 16, 64] {
            let config = RenderConfig {
                rays_per_pixel: 1,
                max_depth: depth,
                batch_width: width,
                ..Default::default()
            };
            let mut scheduler =
                BatchScheduler::new(&scene, &camera, config, RecordingBackend::new(width)).unwrap();
            let mut rng = StdRng::seed_from_u64(width as u64);
            let (accumulator, stats) = scheduler.trace_pass(&mut rng).unwrap();

            let w = width as u64;
            assert!(stats.records <= pixels * depth as u64);
            assert!(stats.batches <= depth as u64 * ((pixels + w - 1) / w));
            assert_eq!(accumulator.total_samples(), pixels);
            assert!(scheduler.backend().batch_sizes.iter().all(|&n| n >= 1 && n <= width));
        }
    }

    #[test]
    fn test_depth_one_only_sees_lights() {
        let scene = closed_room();
        let camera = Camera::new().with_resolution(3, 3);
        let config = RenderConfig {
            rays_per_pixel: 1,
            max_depth: 1,
            ..Default::default()
        };
        let mut scheduler =
            BatchScheduler::new(&scene, &camera, config, SoftwareBackend::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let (_, stats) = scheduler.trace_pass(&mut rng).unwrap();

        assert_eq!(stats.records, 9);
        assert_eq!(stats.hits, 9);
    }

    #[test]
    fn test_misaligned_backend_is_an_error() {
        let scene = emissive_wall();
        let camera = Camera::new().with_resolution(2, 2);
        let mut scheduler =
            BatchScheduler::new(&scene, &camera, RenderConfig::default(), LossyBackend).unwrap();

        let err = scheduler.render().unwrap_err();
        assert!(matches!(
            err,
            RenderError::Backend(BackendError::Misaligned {
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let scene = emissive_wall();
        let camera = Camera::new().with_resolution(2, 2);
        let config = RenderConfig {
            max_depth: 0,
            ..Default::default()
        };

        assert!(matches!(
            BatchScheduler::new(&scene, &camera, config, SoftwareBackend::default()),
            Err(RenderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_camera_rejected() {
        let scene = emissive_wall();
        let camera = Camera::new()
            .with_resolution(2, 2)
            .with_position(Vec3::new(f32::NAN, 0.0, 0.0));

        assert!(matches!(
            BatchScheduler::new(
                &scene,
                &camera,
                RenderConfig::default(),
                SoftwareBackend::default()
            ),
            Err(RenderError::InvalidConfig(_))
        ));

        let camera = Camera::new().with_resolution(2, 2).with_fov(f32::NAN);
        let result = render_parallel(&scene, &camera, &RenderConfig::default(), || {
            Ok(SoftwareBackend::default())
        });
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let scene = closed_room();
        let camera = Camera::new().with_resolution(4, 4);
        let config = RenderConfig {
            rays_per_pixel: 3,
            seed: 17,
            ..Default::default()
        };

        let mut scheduler = BatchScheduler::new(
            &scene,
            &camera,
            config.clone(),
            SoftwareBackend::default(),
        )
        .unwrap();
        let (sequential, seq_stats) = scheduler.render().unwrap();
        let (parallel, par_stats) =
            render_parallel(&scene, &camera, &config, || Ok(SoftwareBackend::default())).unwrap();

        assert_eq!(sequential.pixels, parallel.pixels);
        assert_eq!(seq_stats.totals, par_stats.totals);
        assert_eq!(par_stats.passes, 3);
    }

    #[test]
    fn test_parallel_many_passes_small_pool() {
        let scene = closed_room();
        let camera = Camera::new().with_resolution(3, 4);
        let config = RenderConfig {
            rays_per_pixel: 11,
            seed: 4,
            ..Default::default()
        };

        let mut scheduler = BatchScheduler::new(
            &scene,
            &camera,
            config.clone(),
            SoftwareBackend::default(),
        )
        .unwrap();
        let (sequential, seq_stats) = scheduler.render().unwrap();

        // Three threads: passes run in groups of 3, 3, 3 and a tail of 2
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .unwrap();
        let (parallel, par_stats) = pool
            .install(|| {
                render_parallel(&scene, &camera, &config, || Ok(SoftwareBackend::default()))
            })
            .unwrap();

        assert_eq!(sequential.pixels, parallel.pixels);
        assert_eq!(seq_stats.totals, par_stats.totals);
        assert_eq!(par_stats.passes, 11);
    }
}
