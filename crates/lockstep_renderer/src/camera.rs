//! Pinhole camera for primary ray generation.
//!
//! The camera looks down +X with +Y to the left and +Z up, then pitches
//! about Y and yaws about Z. Every builder recomputes the cached view
//! vectors, so a camera is always ready to generate rays.

use crate::error::{RenderError, RenderResult};
use crate::sampling::gen_f32;
use lockstep_math::{rotate_y, rotate_z, Ray, Vec3};
use rand::RngCore;

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub rows: u32,
    pub cols: u32,

    position: Vec3,
    pitch: f32, // Degrees, positive tilts up
    yaw: f32,   // Degrees, positive turns left
    fov: f32,   // Horizontal field of view in degrees

    // Cached computed values
    top_left: Vec3,
    horizontal_delta: Vec3,
    vertical_delta: Vec3,
}

impl Camera {
    /// Create a camera at the origin with a 480x360 image and 90 degree fov.
    pub fn new() -> Self {
        let mut camera = Self {
            rows: 360,
            cols: 480,
            position: Vec3::ZERO,
            pitch: 0.0,
            yaw: 0.0,
            fov: 90.0,
            top_left: Vec3::ZERO,
            horizontal_delta: Vec3::ZERO,
            vertical_delta: Vec3::ZERO,
        };
        camera.precompute();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, rows: u32, cols: u32) -> Self {
        self.rows = rows;
        self.cols = cols;
        self.precompute();
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self.precompute();
        self
    }

    /// Set pitch and yaw in degrees.
    pub fn with_orientation(mut self, pitch: f32, yaw: f32) -> Self {
        self.pitch = pitch;
        self.yaw = yaw;
        self.precompute();
        self
    }

    /// Set the horizontal field of view in degrees.
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self.precompute();
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Horizontal field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Check that every pixel yields a finite, non-zero ray direction.
    ///
    /// Renders call this before tracing; a camera that fails it would
    /// otherwise produce NaN rays.
    pub fn validate(&self) -> RenderResult<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "image must be at least 1x1, got {}x{}",
                self.cols, self.rows
            )));
        }
        if !self.position.is_finite() {
            return Err(RenderError::InvalidConfig(format!(
                "camera position must be finite, got {}",
                self.position
            )));
        }
        if !self.pitch.is_finite() || !self.yaw.is_finite() {
            return Err(RenderError::InvalidConfig(format!(
                "camera pitch and yaw must be finite, got {} and {}",
                self.pitch, self.yaw
            )));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(RenderError::InvalidConfig(format!(
                "field of view must be in (0, 180) degrees, got {}",
                self.fov
            )));
        }
        let fov_y = self.fov * (self.rows as f32 / self.cols as f32);
        if fov_y >= 180.0 {
            return Err(RenderError::InvalidConfig(format!(
                "vertical field of view of {} degrees for a {}x{} image exceeds 180",
                fov_y, self.cols, self.rows
            )));
        }
        Ok(())
    }

    /// Number of pixels in the image.
    pub fn pixel_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    fn precompute(&mut self) {
        let rows = self.rows.max(1) as f32;
        let cols = self.cols.max(1) as f32;

        let fov_x = self.fov.to_radians();
        let fov_y = fov_x * (rows / cols);
        let half_width = (fov_x / 2.0).tan();
        let half_height = (fov_y / 2.0).tan();

        let (ps, pc) = self.pitch.to_radians().sin_cos();
        let (ys, yc) = self.yaw.to_radians().sin_cos();
        let orient = |v: Vec3| rotate_z(rotate_y(v, pc, ps), yc, ys);

        let top_left = orient(Vec3::new(1.0, half_width, half_height));
        let top_right = orient(Vec3::new(1.0, -half_width, half_height));
        let bottom_left = orient(Vec3::new(1.0, half_width, -half_height));

        self.top_left = top_left;
        self.horizontal_delta = (top_right - top_left) / cols;
        self.vertical_delta = (bottom_left - top_left) / rows;
    }

    /// Ray through the continuous image position (`x` columns, `y` rows)
    /// measured from the top-left corner.
    pub fn ray_through(&self, x: f32, y: f32) -> Ray {
        let dir = self.top_left + self.horizontal_delta * x + self.vertical_delta * y;
        Ray::new(self.position, dir)
    }

    /// Ray through a uniformly jittered point inside pixel (`row`, `col`).
    pub fn get_ray(&self, row: u32, col: u32, rng: &mut dyn RngCore) -> Ray {
        let x = col as f32 + gen_f32(rng);
        let y = row as f32 + gen_f32(rng);
        self.ray_through(x, y)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_center_ray_looks_forward() {
        let camera = Camera::new().with_resolution(100, 100);
        let ray = camera.ray_through(50.0, 50.0);

        assert!((ray.direction() - Vec3::X).length() < 1e-5);
        assert_eq!(ray.origin(), Vec3::ZERO);
    }

    #[test]
    fn test_image_orientation() {
        let camera = Camera::new().with_resolution(100, 100);

        // Top-left corner points up and to the left
        let corner = camera.ray_through(0.0, 0.0).direction();
        assert!(corner.y > 0.0);
        assert!(corner.z > 0.0);

        // 90 degree horizontal fov: the left edge is 45 degrees off axis
        let left = camera.ray_through(0.0, 50.0).direction();
        assert!((left.y - left.x).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_turns_view() {
        let camera = Camera::new()
            .with_resolution(10, 10)
            .with_orientation(0.0, 90.0);
        let ray = camera.ray_through(5.0, 5.0);

        assert!((ray.direction() - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_pitch_tilts_up() {
        let camera = Camera::new()
            .with_resolution(10, 10)
            .with_orientation(30.0, 0.0);
        let ray = camera.ray_through(5.0, 5.0);

        assert!(ray.direction().z > 0.4);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Camera::new().validate().is_ok());
        assert!(Camera::new()
            .with_resolution(1, 1)
            .with_fov(179.0)
            .with_orientation(-89.0, 270.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let base = Camera::new().with_resolution(2, 2);
        let cameras = [
            base.clone().with_fov(f32::NAN),
            base.clone().with_fov(0.0),
            base.clone().with_fov(180.0),
            base.clone().with_fov(-30.0),
            base.clone().with_orientation(f32::INFINITY, 0.0),
            base.clone().with_orientation(0.0, f32::NAN),
            base.clone().with_position(Vec3::new(0.0, f32::NAN, 0.0)),
            base.clone().with_resolution(0, 4),
            // Tall image: 150 degrees across becomes 300 degrees vertically
            base.clone().with_resolution(4, 2).with_fov(150.0),
        ];

        for camera in &cameras {
            assert!(
                matches!(camera.validate(), Err(RenderError::InvalidConfig(_))),
                "{:?}",
                camera
            );
        }
    }

    #[test]
    fn test_valid_camera_rays_are_finite() {
        let camera = Camera::new()
            .with_resolution(3, 5)
            .with_fov(170.0)
            .with_orientation(45.0, -120.0);
        camera.validate().unwrap();

        for (x, y) in [(0.0, 0.0), (5.0, 0.0), (0.0, 3.0), (5.0, 3.0), (2.5, 1.5)] {
            let direction = camera.ray_through(x, y).direction();
            assert!(direction.is_finite());
            assert!((direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_jittered_rays_stay_in_pixel() {
        let camera = Camera::new()
            .with_resolution(4, 4)
            .with_position(Vec3::new(1.0, 2.0, 3.0));
        let mut rng = StdRng::seed_from_u64(42);

        let lo = camera.ray_through(1.0, 2.0).direction();
        let hi = camera.ray_through(2.0, 3.0).direction();
        for _ in 0..100 {
            let ray = camera.get_ray(2, 1, &mut rng);
            assert_eq!(ray.origin(), Vec3::new(1.0, 2.0, 3.0));
            assert_eq!(ray.bounce(), 0);
            assert!((ray.direction().length() - 1.0).abs() < 1e-5);
            // Column runs toward -Y, row toward -Z
            assert!(ray.direction().y <= lo.y.max(hi.y) + 1e-5);
            assert!(ray.direction().y >= lo.y.min(hi.y) - 1e-5);
        }
    }
}
