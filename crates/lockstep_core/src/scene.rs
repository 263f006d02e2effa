//! Scene container.
//!
//! A scene is an ordered list of shapes. It is built once (usually by the
//! loader) and then only read, so a `&Scene` can be shared freely across
//! render threads.

use std::ops::Index;

use crate::shape::{Shape, ShapeKind};

/// An ordered, immutable-after-construction collection of shapes.
///
/// Order only matters for tie-breaks between hits at exactly the same
/// distance, and for the 1-based indices the accelerator reports hits with.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Shapes in scene-file order
    shapes: Vec<Shape>,

    /// Scene name (usually from filename)
    pub name: String,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a scene from an ordered list of shapes.
    pub fn from_shapes(name: impl Into<String>, shapes: Vec<Shape>) -> Self {
        Self {
            shapes,
            name: name.into(),
        }
    }

    /// Add a shape to the scene and return its index.
    pub fn add_shape(&mut self, shape: Shape) -> usize {
        let index = self.shapes.len();
        self.shapes.push(shape);
        index
    }

    /// All shapes in scene order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Get a shape by its 0-based index.
    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    /// Position of `shape` in this scene, if it is one of ours.
    pub fn index_of(&self, shape: &Shape) -> Option<usize> {
        self.shapes.iter().position(|s| std::ptr::eq(s, shape))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Number of light-emitting shapes.
    pub fn emitter_count(&self) -> usize {
        self.shapes.iter().filter(|s| s.is_emissive()).count()
    }

    /// Number of shapes of the given kind.
    pub fn count_kind(&self, kind: ShapeKind) -> usize {
        self.shapes.iter().filter(|s| s.kind() == kind).count()
    }
}

impl Index<usize> for Scene {
    type Output = Shape;

    fn index(&self, index: usize) -> &Shape {
        &self.shapes[index]
    }
}
