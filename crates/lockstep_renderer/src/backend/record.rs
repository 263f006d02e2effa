//! Fixed-size records exchanged with the raycast device.
//!
//! All records are `#[repr(C)]` plain-old-data and travel as little-endian
//! bytes (the device and every supported host are little-endian).
//!
//! | Record | Size | Layout |
//! |---|---|---|
//! | ray | 32 bytes | origin xyz f32, direction xyz f32, 2 f32 padding |
//! | hit | 16 bytes | hit point xyz f32, u32 scene index (1-based, 0 = miss) |
//! | shape | 64 bytes | 3 points (xyz f32), u32 type tag, 24 bytes padding |

use bytemuck::{Pod, Zeroable};
use lockstep_core::{Geometry, Shape, ShapeKind};
use lockstep_math::{Ray, Vec3};

pub const RAY_RECORD_SIZE: usize = 32;
pub const HIT_RECORD_SIZE: usize = 16;
pub const SHAPE_RECORD_SIZE: usize = 64;

/// One ray slot of a batch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RayRecord {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub _pad: [f32; 2],
}

impl RayRecord {
    /// Filler for unused slots. Its zero direction can never hit anything.
    pub const PADDING: RayRecord = RayRecord {
        origin: [0.0; 3],
        direction: [0.0; 3],
        _pad: [0.0; 2],
    };

    pub fn from_ray(ray: &Ray) -> Self {
        Self {
            origin: ray.origin().to_array(),
            direction: ray.direction().to_array(),
            _pad: [0.0; 2],
        }
    }

    /// Decode to a ray, or `None` for a padding slot.
    pub fn to_ray(&self) -> Option<Ray> {
        Ray::try_new(Vec3::from_array(self.origin), Vec3::from_array(self.direction))
    }
}

/// One result slot of a batch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct HitRecord {
    pub point: [f32; 3],
    pub scene_index: u32,
}

impl HitRecord {
    pub const MISS: HitRecord = HitRecord {
        point: [0.0; 3],
        scene_index: 0,
    };

    /// Fill pattern for the receive buffer. Its index is out of range for any
    /// scene, so a slot the device never wrote cannot pass as a miss.
    pub const UNWRITTEN: HitRecord = HitRecord {
        point: [f32::NAN; 3],
        scene_index: u32::MAX,
    };

    /// A hit on the shape at 0-based `index`.
    pub fn hit(point: Vec3, index: usize) -> Self {
        Self {
            point: point.to_array(),
            scene_index: index as u32 + 1,
        }
    }

    pub fn is_miss(&self) -> bool {
        self.scene_index == 0
    }
}

/// Geometry of one scene shape as stored in device scene memory.
///
/// The device only needs geometry; color and emittance stay on the host.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShapeRecord {
    pub coords: [[f32; 3]; 3],
    pub kind: u32,
    pub _pad: [u32; 6],
}

impl ShapeRecord {
    pub fn from_shape(shape: &Shape) -> Self {
        let coords = match *shape.geometry() {
            Geometry::Plane { point, normal } => [point.to_array(), normal.to_array(), [0.0; 3]],
            Geometry::Sphere { center, radius } => {
                [center.to_array(), [radius, 0.0, 0.0], [0.0; 3]]
            }
            Geometry::Triangle { v0, v1, v2 } => [v0.to_array(), v1.to_array(), v2.to_array()],
        };
        Self {
            coords,
            kind: shape.kind().tag(),
            _pad: [0; 6],
        }
    }

    /// Decode the stored geometry, or `None` for an unknown type tag.
    pub fn to_geometry(&self) -> Option<Geometry> {
        let [a, b, c] = self.coords.map(Vec3::from_array);
        let geometry = match ShapeKind::from_tag(self.kind)? {
            ShapeKind::Plane => Geometry::Plane {
                point: a,
                normal: b,
            },
            ShapeKind::Sphere => Geometry::Sphere {
                center: a,
                radius: b.x,
            },
            ShapeKind::Triangle => Geometry::Triangle {
                v0: a,
                v1: b,
                v2: c,
            },
        };
        Some(geometry)
    }
}

const _: () = assert!(std::mem::size_of::<RayRecord>() == RAY_RECORD_SIZE);
const _: () = assert!(std::mem::size_of::<HitRecord>() == HIT_RECORD_SIZE);
const _: () = assert!(std::mem::size_of::<ShapeRecord>() == SHAPE_RECORD_SIZE);
