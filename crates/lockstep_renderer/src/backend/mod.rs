//! Intersection backends.
//!
//! The batch scheduler hands a backend up to `batch_width()` rays at a time
//! and gets back one optional intersection per ray, in the same order. Two
//! implementations are provided:
//!
//! - [`SoftwareBackend`]: runs the linear-scan intersector on each ray
//! - [`HardwareBackend`]: packs rays into fixed-size records, ships them over
//!   a [`DmaLink`] to a fixed-parallelism raycast device and decodes the
//!   returned hit records
//!
//! [`EmulatedRaycaster`] is an in-process `DmaLink` device that behaves like
//! the raycast kernel, for running the hardware path without hardware.

mod emulator;
mod hardware;
mod record;
mod software;

pub use emulator::{EmulatedRaycaster, DEFAULT_SCENE_CAPACITY};
pub use hardware::{DmaLink, HardwareBackend, DEFAULT_TIMEOUT};
pub use record::{
    HitRecord, RayRecord, ShapeRecord, HIT_RECORD_SIZE, RAY_RECORD_SIZE, SHAPE_RECORD_SIZE,
};
pub use software::SoftwareBackend;

use std::time::Duration;

use lockstep_core::{Intersection, Scene};
use lockstep_math::Ray;
use thiserror::Error;

/// Rays per backend call; the raycast device's intersection parallelism.
pub const DEFAULT_BATCH_WIDTH: usize = 16;

/// Errors raised by an intersection backend.
///
/// A backend that cannot produce a complete, aligned batch must return one of
/// these rather than reporting misses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Timed out after {0:?} waiting for the device")]
    Timeout(Duration),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Short response: expected {expected} bytes, received {found}")]
    ShortResponse { expected: usize, found: usize },

    #[error("Slot {slot}: scene index {index} is outside a scene of {scene_len} shapes")]
    InvalidSceneIndex {
        slot: usize,
        index: u32,
        scene_len: usize,
    },

    #[error("Slot {slot}: hit point is not finite")]
    MalformedHit { slot: usize },

    #[error("Slot {slot}: padding slot reported a hit")]
    PaddingHit { slot: usize },

    #[error("Scene has {shapes} shapes but the device holds at most {capacity}")]
    SceneTooLarge { shapes: usize, capacity: usize },

    #[error("Batch of {rays} rays exceeds the backend width of {width}")]
    BatchTooWide { rays: usize, width: usize },

    #[error("Backend returned {found} results for {expected} rays")]
    Misaligned { expected: usize, found: usize },

    #[error("Scene was not uploaded to the device before tracing")]
    NotPrepared,
}

/// A batch ray/scene intersection engine.
pub trait IntersectBackend {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Maximum number of rays per `batch_intersect` call.
    fn batch_width(&self) -> usize;

    /// Make `scene` available to the backend before the first batch.
    fn prepare(&mut self, _scene: &Scene) -> Result<(), BackendError> {
        Ok(())
    }

    /// Intersect up to `batch_width()` rays with `scene`.
    ///
    /// The result holds exactly one entry per input ray, in input order.
    fn batch_intersect<'s>(
        &mut self,
        scene: &'s Scene,
        rays: &[Ray],
    ) -> Result<Vec<Option<Intersection<'s>>>, BackendError>;
}

impl<B: IntersectBackend + ?Sized> IntersectBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn batch_width(&self) -> usize {
        (**self).batch_width()
    }

    fn prepare(&mut self, scene: &Scene) -> Result<(), BackendError> {
        (**self).prepare(scene)
    }

    fn batch_intersect<'s>(
        &mut self,
        scene: &'s Scene,
        rays: &[Ray],
    ) -> Result<Vec<Option<Intersection<'s>>>, BackendError> {
        (**self).batch_intersect(scene, rays)
    }
}
