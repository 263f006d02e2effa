//! In-process stand-in for the raycast device.

use std::time::Duration;

use super::hardware::DmaLink;
use super::record::{HitRecord, RayRecord, ShapeRecord, RAY_RECORD_SIZE, SHAPE_RECORD_SIZE};
use super::BackendError;
use crate::intersector::closest_hit;
use lockstep_core::Geometry;

/// Shapes the device's scene memory holds.
pub const DEFAULT_SCENE_CAPACITY: usize = 16;

/// A [`DmaLink`] device that runs the raycast kernel on the host.
///
/// Behaves like the hardware: scene memory is written once, the kernel must
/// be started before every stream, each ray slot gets exactly one hit record
/// back and padding slots (zero direction) always report a miss.
#[derive(Debug, Clone)]
pub struct EmulatedRaycaster {
    capacity: usize,
    geometries: Vec<Geometry>,
    started: bool,
    pending: Option<Vec<HitRecord>>,
    batches: u64,
}

impl EmulatedRaycaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SCENE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            geometries: Vec::new(),
            started: false,
            pending: None,
            batches: 0,
        }
    }

    /// Number of batches processed since creation.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Number of shapes currently held in scene memory.
    pub fn scene_len(&self) -> usize {
        self.geometries.len()
    }

    fn trace(&self, record: &RayRecord) -> HitRecord {
        let Some(ray) = record.to_ray() else {
            return HitRecord::MISS;
        };
        match closest_hit(&ray, &self.geometries) {
            Some((index, t)) => HitRecord::hit(ray.at(t), index),
            None => HitRecord::MISS,
        }
    }
}

impl Default for EmulatedRaycaster {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaLink for EmulatedRaycaster {
    fn scene_capacity(&self) -> usize {
        self.capacity
    }

    fn write_scene(&mut self, records: &[u8]) -> Result<(), BackendError> {
        if records.len() % SHAPE_RECORD_SIZE != 0 {
            return Err(BackendError::Transfer(format!(
                "scene payload of {} bytes is not a whole number of shape records",
                records.len()
            )));
        }

        let count = records.len() / SHAPE_RECORD_SIZE;
        if count > self.capacity {
            return Err(BackendError::SceneTooLarge {
                shapes: count,
                capacity: self.capacity,
            });
        }

        self.geometries = records
            .chunks_exact(SHAPE_RECORD_SIZE)
            .enumerate()
            .map(|(i, chunk)| {
                let record: ShapeRecord = bytemuck::pod_read_unaligned(chunk);
                record.to_geometry().ok_or_else(|| {
                    BackendError::Transfer(format!(
                        "shape record {} has unknown type tag {}",
                        i, record.kind
                    ))
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn start(&mut self) -> Result<(), BackendError> {
        self.started = true;
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), BackendError> {
        if !self.started {
            return Err(BackendError::Transfer("kernel not started".to_string()));
        }
        if payload.len() % RAY_RECORD_SIZE != 0 {
            return Err(BackendError::Transfer(format!(
                "ray payload of {} bytes is not a whole number of ray records",
                payload.len()
            )));
        }
        self.started = false;

        let hits = payload
            .chunks_exact(RAY_RECORD_SIZE)
            .map(|chunk| self.trace(&bytemuck::pod_read_unaligned(chunk)))
            .collect();
        self.pending = Some(hits);
        self.batches += 1;
        Ok(())
    }

    fn recv(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, BackendError> {
        let hits = self.pending.take().ok_or(BackendError::Timeout(timeout))?;
        let bytes: &[u8] = bytemuck::cast_slice(&hits);
        let n = bytes.len().min(buffer.len());
        buffer[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }
}
