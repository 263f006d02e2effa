//! JSON scene loading.
//!
//! Scene files are a JSON array of shape objects:
//!
//! ```json
//! [
//!   { "shape_type": "sphere", "color": [255, 255, 255], "specularity": 0,
//!     "emittance": 2, "coordinates": [[0, 0, 5], [1, 0, 0]] }
//! ]
//! ```
//!
//! `coordinates` holds up to three points whose meaning depends on the shape:
//! sphere = `[center, (radius, 0, 0)]`, plane = `[point, normal]`,
//! triangle = `[v0, v1, v2]`.

use std::path::Path;

use lockstep_math::{Color, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::Scene;
use crate::shape::{Geometry, Shape, ShapeKind};

/// Most points any shape description may carry.
pub const MAX_COORDINATES: usize = 3;

/// Errors that can occur while loading a scene.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Shape {index}: unknown shape_type \"{name}\"")]
    UnknownShapeType { index: usize, name: String },

    #[error("Shape {index} ({kind}): expected {expected} coordinates, found {found}")]
    CoordinateArity {
        index: usize,
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Shape {index}: emittance must be non-negative, got {value}")]
    NegativeEmittance { index: usize, value: f32 },

    #[error("Shape {index}: color channel {channel} must be in [0, 255], got {value}")]
    ColorOutOfRange {
        index: usize,
        channel: usize,
        value: f32,
    },

    #[error("Shape {index}: {message}")]
    InvalidGeometry { index: usize, message: String },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// One entry of a scene file, as written on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeDesc {
    pub shape_type: String,
    pub color: [f32; 3],
    #[serde(default)]
    pub specularity: f32,
    pub emittance: f32,
    pub coordinates: Vec<[f32; 3]>,
}

impl ShapeDesc {
    /// Describe an existing shape in scene-file form.
    pub fn from_shape(shape: &Shape) -> Self {
        let coordinates = match *shape.geometry() {
            Geometry::Plane { point, normal } => vec![point.to_array(), normal.to_array()],
            Geometry::Sphere { center, radius } => vec![center.to_array(), [radius, 0.0, 0.0]],
            Geometry::Triangle { v0, v1, v2 } => {
                vec![v0.to_array(), v1.to_array(), v2.to_array()]
            }
        };
        Self {
            shape_type: shape.kind().name().to_string(),
            color: shape.color().to_array(),
            specularity: shape.specularity(),
            emittance: shape.emittance(),
            coordinates,
        }
    }

    /// Validate and convert to a [`Shape`]. `index` is only used in errors.
    pub fn to_shape(&self, index: usize) -> LoadResult<Shape> {
        let kind = ShapeKind::from_name(&self.shape_type).ok_or_else(|| {
            LoadError::UnknownShapeType {
                index,
                name: self.shape_type.clone(),
            }
        })?;

        let expected = match kind {
            ShapeKind::Plane | ShapeKind::Sphere => 2,
            ShapeKind::Triangle => 3,
        };
        let found = self.coordinates.len();
        // Extra trailing points are tolerated up to the fixed record width
        if found < expected || found > MAX_COORDINATES {
            return Err(LoadError::CoordinateArity {
                index,
                kind: kind.name(),
                expected,
                found,
            });
        }

        if self.emittance < 0.0 {
            return Err(LoadError::NegativeEmittance {
                index,
                value: self.emittance,
            });
        }

        let all_finite = self.color.iter().all(|c| c.is_finite())
            && self.emittance.is_finite()
            && self.coordinates.iter().flatten().all(|c| c.is_finite());
        if !all_finite {
            return Err(invalid(index, "non-finite number"));
        }

        if let Some((channel, &value)) = self
            .color
            .iter()
            .enumerate()
            .find(|(_, c)| !(0.0..=255.0).contains(*c))
        {
            return Err(LoadError::ColorOutOfRange {
                index,
                channel,
                value,
            });
        }

        let p: Vec<Vec3> = self.coordinates.iter().map(|c| Vec3::from_array(*c)).collect();
        let geometry = match kind {
            ShapeKind::Plane => {
                if p[1].length_squared() == 0.0 {
                    return Err(invalid(index, "plane normal is zero"));
                }
                Geometry::Plane {
                    point: p[0],
                    normal: p[1],
                }
            }
            ShapeKind::Sphere => {
                let radius = p[1].x;
                if radius <= 0.0 {
                    return Err(invalid(index, "sphere radius must be positive"));
                }
                Geometry::Sphere {
                    center: p[0],
                    radius,
                }
            }
            ShapeKind::Triangle => Geometry::Triangle {
                v0: p[0],
                v1: p[1],
                v2: p[2],
            },
        };

        Ok(Shape::new(geometry)
            .with_color(Color::from_array(self.color))
            .with_specularity(self.specularity)
            .with_emittance(self.emittance))
    }
}

fn invalid(index: usize, message: &str) -> LoadError {
    LoadError::InvalidGeometry {
        index,
        message: message.to_string(),
    }
}

/// Parse a scene from JSON text.
pub fn load_scene(text: &str) -> LoadResult<Scene> {
    load_named_scene("unnamed", text)
}

/// Parse a scene from JSON text, giving it a name.
pub fn load_named_scene(name: &str, text: &str) -> LoadResult<Scene> {
    let descs: Vec<ShapeDesc> = serde_json::from_str(text)?;

    let mut scene = Scene::new(name);
    for (index, desc) in descs.iter().enumerate() {
        scene.add_shape(desc.to_shape(index)?);
    }

    if scene.emitter_count() == 0 {
        log::warn!("Scene '{}' has no emissive shapes; every path will be black", name);
    }
    log::debug!(
        "Loaded scene '{}': {} shapes ({} planes, {} spheres, {} triangles), {} emitters",
        name,
        scene.len(),
        scene.count_kind(ShapeKind::Plane),
        scene.count_kind(ShapeKind::Sphere),
        scene.count_kind(ShapeKind::Triangle),
        scene.emitter_count()
    );

    Ok(scene)
}

/// Load a scene file. The scene is named after the file stem.
pub fn load_scene_file<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");

    let text = std::fs::read_to_string(path)?;
    load_named_scene(name, &text)
}

/// Serialize a scene back to the JSON scene format.
pub fn scene_to_json(scene: &Scene) -> LoadResult<String> {
    let descs: Vec<ShapeDesc> = scene.shapes().iter().map(ShapeDesc::from_shape).collect();
    Ok(serde_json::to_string_pretty(&descs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CORNER: &str = r#"[
        { "shape_type": "plane", "color": [200, 200, 200], "specularity": 0,
          "emittance": 0, "coordinates": [[0, 0, -1], [0, 0, 1]] },
        { "shape_type": "sphere", "color": [255, 255, 255], "specularity": 0.5,
          "emittance": 3, "coordinates": [[0, 0, 4], [0.5, 0, 0]] },
        { "shape_type": "triangle", "color": [255, 0, 0], "specularity": 0,
          "emittance": 0, "coordinates": [[0, 0, 0], [1, 0, 0], [0, 1, 0]] }
    ]"#;

    #[test]
    fn test_load_scene() {
        let scene = load_scene(CORNER).unwrap();

        assert_eq!(scene.len(), 3);
        assert_eq!(scene[0].kind(), ShapeKind::Plane);
        assert_eq!(scene[1].kind(), ShapeKind::Sphere);
        assert_eq!(scene[2].kind(), ShapeKind::Triangle);

        assert_eq!(scene[1].emittance(), 3.0);
        assert_eq!(scene[1].specularity(), 0.5);
        assert_eq!(scene[2].color(), Color::new(255.0, 0.0, 0.0));
        match *scene[1].geometry() {
            Geometry::Sphere { center, radius } => {
                assert_eq!(center, Vec3::new(0.0, 0.0, 4.0));
                assert_eq!(radius, 0.5);
            }
            ref other => panic!("expected sphere, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_shape_type() {
        let text = r#"[{ "shape_type": "cube", "color": [1, 1, 1], "specularity": 0,
                         "emittance": 0, "coordinates": [[0, 0, 0], [1, 1, 1]] }]"#;

        match load_scene(text) {
            Err(LoadError::UnknownShapeType { index, name }) => {
                assert_eq!(index, 0);
                assert_eq!(name, "cube");
            }
            other => panic!("expected UnknownShapeType, got {:?}", other),
        }
    }

    #[test]
    fn test_coordinate_arity() {
        let text = r#"[{ "shape_type": "triangle", "color": [1, 1, 1], "specularity": 0,
                         "emittance": 0, "coordinates": [[0, 0, 0], [1, 0, 0]] }]"#;

        assert!(matches!(
            load_scene(text),
            Err(LoadError::CoordinateArity { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_malformed_point_is_json_error() {
        let text = r#"[{ "shape_type": "plane", "color": [1, 1, 1], "specularity": 0,
                         "emittance": 0, "coordinates": [[0, 0], [0, 0, 1]] }]"#;

        assert!(matches!(load_scene(text), Err(LoadError::Json(_))));
        assert!(matches!(load_scene("not json"), Err(LoadError::Json(_))));
    }

    #[test]
    fn test_negative_emittance_rejected() {
        let text = r#"[{ "shape_type": "sphere", "color": [1, 1, 1], "specularity": 0,
                         "emittance": -1, "coordinates": [[0, 0, 0], [1, 0, 0]] }]"#;

        assert!(matches!(load_scene(text), Err(LoadError::NegativeEmittance { .. })));
    }

    #[test]
    fn test_color_out_of_range_rejected() {
        let too_bright = r#"[{ "shape_type": "sphere", "color": [10, 300, 10], "specularity": 0,
                               "emittance": 1, "coordinates": [[0, 0, 0], [1, 0, 0]] }]"#;
        let negative = r#"[{ "shape_type": "plane", "color": [-5, 0, 0], "specularity": 0,
                             "emittance": 0, "coordinates": [[0, 0, 0], [0, 0, 1]] }]"#;
        let edges = r#"[{ "shape_type": "plane", "color": [0, 255, 0], "specularity": 0,
                          "emittance": 0, "coordinates": [[0, 0, 0], [0, 0, 1]] }]"#;

        match load_scene(too_bright) {
            Err(LoadError::ColorOutOfRange {
                index,
                channel,
                value,
            }) => {
                assert_eq!((index, channel), (0, 1));
                assert_eq!(value, 300.0);
            }
            other => panic!("expected ColorOutOfRange, got {:?}", other),
        }
        assert!(matches!(
            load_scene(negative),
            Err(LoadError::ColorOutOfRange { channel: 0, .. })
        ));
        assert!(load_scene(edges).is_ok());
    }

    #[test]
    fn test_degenerate_geometry_rejected() {
        let zero_normal = r#"[{ "shape_type": "plane", "color": [1, 1, 1], "specularity": 0,
                                "emittance": 0, "coordinates": [[0, 0, 0], [0, 0, 0]] }]"#;
        let zero_radius = r#"[{ "shape_type": "sphere", "color": [1, 1, 1], "specularity": 0,
                                "emittance": 0, "coordinates": [[0, 0, 0], [0, 0, 0]] }]"#;

        assert!(matches!(load_scene(zero_normal), Err(LoadError::InvalidGeometry { .. })));
        assert!(matches!(load_scene(zero_radius), Err(LoadError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_json_round_trip_preserves_shapes() {
        let scene = load_scene(CORNER).unwrap();
        let json = scene_to_json(&scene).unwrap();
        let reloaded = load_scene(&json).unwrap();

        assert_eq!(scene.shapes(), reloaded.shapes());
    }

    #[test]
    fn test_load_scene_file_uses_stem_as_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corner.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(CORNER.as_bytes()).unwrap();

        let scene = load_scene_file(&path).unwrap();
        assert_eq!(scene.name, "corner");
        assert_eq!(scene.len(), 3);

        assert!(matches!(
            load_scene_file(dir.path().join("missing.json")),
            Err(LoadError::Io(_))
        ));
    }
}
