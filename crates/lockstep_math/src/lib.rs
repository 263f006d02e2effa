//! Math utilities for the lockstep path tracer.
//!
//! Vectors come straight from glam; this crate adds the ray type and the
//! handful of helpers the tracer needs on top (axis rotations, zero-safe
//! normalization and 0-255 color blending).

// Re-export glam for convenience
pub use glam::*;

mod color;
mod ray;
mod vector;

pub use color::{clamp_channel, color_mult, to_rgb8, Color, BLACK, WHITE};
pub use ray::Ray;
pub use vector::{normalize, rotate_y, rotate_z};
