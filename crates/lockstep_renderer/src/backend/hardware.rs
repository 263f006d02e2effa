//! Accelerator backend: batches go through a DMA-style link to a raycast
//! device with fixed intersection parallelism.

use std::time::Duration;

use super::record::{HitRecord, RayRecord, ShapeRecord, HIT_RECORD_SIZE};
use super::{BackendError, IntersectBackend};
use lockstep_core::{Intersection, Scene};
use lockstep_math::{Ray, Vec3};

/// How long to wait for a batch response before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport to a raycast device.
///
/// Mirrors the device's black-box contract: scene memory is written once,
/// the kernel is started before each stream, a batch of ray records is sent
/// and a batch of hit records is received.
pub trait DmaLink {
    /// Maximum number of shapes the device's scene memory holds.
    fn scene_capacity(&self) -> usize;

    /// Write packed [`ShapeRecord`]s into device scene memory.
    fn write_scene(&mut self, records: &[u8]) -> Result<(), BackendError>;

    /// Arm the kernel for the next stream.
    fn start(&mut self) -> Result<(), BackendError>;

    /// Transfer one batch of packed [`RayRecord`]s to the device.
    fn send(&mut self, payload: &[u8]) -> Result<(), BackendError>;

    /// Block until the response arrives or `timeout` elapses, filling
    /// `buffer`. Returns the number of bytes received.
    fn recv(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, BackendError>;
}

/// Intersection backend that offloads batches to a raycast device.
///
/// Every batch is padded to the full device width. Responses are validated
/// before use: a short response, an unwritten slot, an out-of-range scene
/// index or a padding slot reporting a hit is an error, never a miss.
pub struct HardwareBackend<L: DmaLink> {
    link: L,
    width: usize,
    timeout: Duration,
    input: Vec<RayRecord>,
    output: Vec<HitRecord>,
    /// Shape records written to the device by `prepare`
    uploaded: Option<Vec<ShapeRecord>>,
}

impl<L: DmaLink> HardwareBackend<L> {
    /// Create a backend for a device that intersects `width` rays per batch.
    pub fn new(link: L, width: usize) -> Self {
        Self {
            link,
            width,
            timeout: DEFAULT_TIMEOUT,
            input: vec![RayRecord::PADDING; width],
            output: vec![HitRecord::UNWRITTEN; width],
            uploaded: None,
        }
    }

    /// Set the response timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Whether device scene memory holds exactly the geometry of `scene`.
    fn holds(&self, scene: &Scene) -> bool {
        self.uploaded.as_deref().is_some_and(|records| {
            records.len() == scene.len()
                && records
                    .iter()
                    .zip(scene.shapes())
                    .all(|(record, shape)| *record == ShapeRecord::from_shape(shape))
        })
    }

    /// Exchange one padded batch with the device.
    fn round_trip(&mut self, rays: &[Ray]) -> Result<(), BackendError> {
        for (slot, record) in self.input.iter_mut().enumerate() {
            *record = rays.get(slot).map_or(RayRecord::PADDING, RayRecord::from_ray);
        }
        self.output.fill(HitRecord::UNWRITTEN);

        self.link.start()?;
        self.link.send(bytemuck::cast_slice(&self.input))?;

        let expected = self.width * HIT_RECORD_SIZE;
        let found = self
            .link
            .recv(bytemuck::cast_slice_mut(&mut self.output), self.timeout)?;
        if found != expected {
            return Err(BackendError::ShortResponse { expected, found });
        }
        Ok(())
    }

    /// Turn one hit record back into an intersection against `scene`.
    fn resolve<'s>(
        &self,
        scene: &'s Scene,
        slot: usize,
        ray: &Ray,
    ) -> Result<Option<Intersection<'s>>, BackendError> {
        let record = &self.output[slot];
        if record.is_miss() {
            return Ok(None);
        }

        let index = record.scene_index as usize;
        let shape = index
            .checked_sub(1)
            .and_then(|i| scene.get(i))
            .ok_or(BackendError::InvalidSceneIndex {
                slot,
                index: record.scene_index,
                scene_len: scene.len(),
            })?;

        let point = Vec3::from_array(record.point);
        if !point.is_finite() {
            return Err(BackendError::MalformedHit { slot });
        }

        // The device reports no distance; recover it from the hit point
        let distance = (point - ray.origin()).length();
        Ok(Some(Intersection::new(point, shape, distance)))
    }
}

impl<L: DmaLink> IntersectBackend for HardwareBackend<L> {
    fn name(&self) -> &'static str {
        "hardware"
    }

    fn batch_width(&self) -> usize {
        self.width
    }

    fn prepare(&mut self, scene: &Scene) -> Result<(), BackendError> {
        let capacity = self.link.scene_capacity();
        if scene.len() > capacity {
            return Err(BackendError::SceneTooLarge {
                shapes: scene.len(),
                capacity,
            });
        }

        let records: Vec<ShapeRecord> =
            scene.shapes().iter().map(ShapeRecord::from_shape).collect();
        self.uploaded = None;
        self.link.write_scene(bytemuck::cast_slice(&records))?;

        log::debug!(
            "Uploaded {} shape records to device scene memory (capacity {})",
            records.len(),
            capacity
        );
        self.uploaded = Some(records);
        Ok(())
    }

    fn batch_intersect<'s>(
        &mut self,
        scene: &'s Scene,
        rays: &[Ray],
    ) -> Result<Vec<Option<Intersection<'s>>>, BackendError> {
        if !self.holds(scene) {
            return Err(BackendError::NotPrepared);
        }
        if rays.len() > self.width {
            return Err(BackendError::BatchTooWide {
                rays: rays.len(),
                width: self.width,
            });
        }

        self.round_trip(rays)?;

        if let Some(slot) = (rays.len()..self.width).find(|&slot| !self.output[slot].is_miss()) {
            return Err(BackendError::PaddingHit { slot });
        }

        rays.iter()
            .enumerate()
            .map(|(slot, ray)| self.resolve(scene, slot, ray))
            .collect()
    }
}
