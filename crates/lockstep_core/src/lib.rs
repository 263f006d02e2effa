//! Lockstep Core - scene description for the lockstep path tracer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Shape`, the closed `Geometry` enum (plane, sphere,
//!   triangle) and their intersection kernels
//! - **Scene**: an ordered, read-only list of shapes
//! - **Loading**: the JSON scene format
//!
//! # Example
//!
//! ```ignore
//! use lockstep_core::load_scene_file;
//!
//! let scene = load_scene_file("scenes/cornell_box.json")?;
//! println!("Loaded {} shapes, {} emitters", scene.len(), scene.emitter_count());
//! ```

pub mod intersection;
pub mod loader;
pub mod scene;
pub mod shape;

// Re-export commonly used types
pub use intersection::Intersection;
pub use loader::{
    load_named_scene, load_scene, load_scene_file, scene_to_json, LoadError, LoadResult, ShapeDesc,
};
pub use scene::Scene;
pub use shape::{Geometry, Shape, ShapeKind, PARALLEL_EPSILON, TRIANGLE_T_EPSILON};
