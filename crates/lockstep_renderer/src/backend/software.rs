use super::{BackendError, IntersectBackend, DEFAULT_BATCH_WIDTH};
use crate::intersector::cast_ray;
use lockstep_core::{Intersection, Scene};
use lockstep_math::Ray;

/// Reference backend: the linear-scan intersector applied to each ray.
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    width: usize,
}

impl SoftwareBackend {
    /// Create a software backend that accepts up to `width` rays per batch.
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_WIDTH)
    }
}

impl IntersectBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn batch_width(&self) -> usize {
        self.width
    }

    fn batch_intersect<'s>(
        &mut self,
        scene: &'s Scene,
        rays: &[Ray],
    ) -> Result<Vec<Option<Intersection<'s>>>, BackendError> {
        if rays.len() > self.width {
            return Err(BackendError::BatchTooWide {
                rays: rays.len(),
                width: self.width,
            });
        }
        Ok(rays.iter().map(|ray| cast_ray(ray, scene)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_core::Shape;
    use lockstep_math::Vec3;

    #[test]
    fn test_results_align_with_rays() {
        let scene = Scene::from_shapes("one", vec![Shape::sphere(Vec3::new(5.0, 0.0, 0.0), 1.0)]);
        let rays = [
            Ray::new(Vec3::ZERO, Vec3::X),
            Ray::new(Vec3::ZERO, Vec3::NEG_X),
            Ray::new(Vec3::ZERO, Vec3::X),
        ];
        let mut backend = SoftwareBackend::new(4);

        let hits = backend.batch_intersect(&scene, &rays).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits[0].is_some());
        assert!(hits[1].is_none());
        assert!(hits[2].is_some());
    }

    #[test]
    fn test_rejects_oversized_batch() {
        let scene = Scene::new("empty");
        let rays = vec![Ray::new(Vec3::ZERO, Vec3::X); 3];
        let mut backend = SoftwareBackend::new(2);

        assert_eq!(
            backend.batch_intersect(&scene, &rays).unwrap_err(),
            BackendError::BatchTooWide { rays: 3, width: 2 }
        );
    }
}
