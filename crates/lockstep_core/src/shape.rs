//! Scene primitives: planes, spheres and triangles.
//!
//! The primitive set is closed. `Geometry` is an exhaustive enum, so adding
//! a primitive means touching every `match` over it (intersection, normals,
//! the scene loader and the accelerator record encoder).

use lockstep_math::{Color, Ray, Vec3};

use crate::intersection::Intersection;

/// Below this `|direction . normal|` a ray counts as parallel to a plane,
/// and below this `|det|` as parallel to a triangle.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Minimum ray parameter accepted for a triangle hit.
pub const TRIANGLE_T_EPSILON: f32 = 1e-6;

/// Primitive type tag, also used as the accelerator's shape type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Plane,
    Sphere,
    Triangle,
}

impl ShapeKind {
    /// Tag value stored in accelerator shape records.
    pub fn tag(self) -> u32 {
        match self {
            ShapeKind::Plane => 0,
            ShapeKind::Sphere => 1,
            ShapeKind::Triangle => 2,
        }
    }

    /// Inverse of [`ShapeKind::tag`].
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(ShapeKind::Plane),
            1 => Some(ShapeKind::Sphere),
            2 => Some(ShapeKind::Triangle),
            _ => None,
        }
    }

    /// Name used for `shape_type` in scene files.
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Plane => "plane",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Triangle => "triangle",
        }
    }

    /// Parse a scene-file `shape_type`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "plane" => Some(ShapeKind::Plane),
            "sphere" => Some(ShapeKind::Sphere),
            "triangle" => Some(ShapeKind::Triangle),
            _ => None,
        }
    }
}

/// Variant-specific geometry payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// Infinite plane through `point`; `normal` is unit length.
    Plane { point: Vec3, normal: Vec3 },
    Sphere { center: Vec3, radius: f32 },
    Triangle { v0: Vec3, v1: Vec3, v2: Vec3 },
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Plane { .. } => ShapeKind::Plane,
            Geometry::Sphere { .. } => ShapeKind::Sphere,
            Geometry::Triangle { .. } => ShapeKind::Triangle,
        }
    }

    /// Ray parameter (distance, for a unit ray) of the nearest admissible hit.
    pub fn hit_distance(&self, ray: &Ray) -> Option<f32> {
        match *self {
            Geometry::Plane { point, normal } => {
                let dir_dot_norm = ray.direction().dot(normal);
                if dir_dot_norm.abs() < PARALLEL_EPSILON {
                    return None;
                }
                let t = (point - ray.origin()).dot(normal) / dir_dot_norm;
                if t < 0.0 {
                    return None;
                }
                Some(t)
            }
            Geometry::Sphere { center, radius } => {
                let oc = ray.origin() - center;
                let a = ray.direction().length_squared();
                let b = 2.0 * ray.direction().dot(oc);
                let c = oc.length_squared() - radius * radius;

                let discriminant = b * b - 4.0 * a * c;
                if discriminant < 0.0 {
                    return None;
                }

                let sqrtd = discriminant.sqrt();
                let near = (-b - sqrtd) / (2.0 * a);
                let far = (-b + sqrtd) / (2.0 * a);

                // Smaller non-negative root; origin inside the sphere gives near < 0
                if near >= 0.0 {
                    Some(near)
                } else if far >= 0.0 {
                    Some(far)
                } else {
                    None
                }
            }
            Geometry::Triangle { v0, v1, v2 } => {
                // Möller-Trumbore
                let edge1 = v1 - v0;
                let edge2 = v2 - v0;
                let ray_cross_edge2 = ray.direction().cross(edge2);
                let det = edge1.dot(ray_cross_edge2);

                if det.abs() < PARALLEL_EPSILON {
                    return None;
                }

                let inv_det = 1.0 / det;
                let s = ray.origin() - v0;
                let u = inv_det * s.dot(ray_cross_edge2);
                if !(0.0..=1.0).contains(&u) {
                    return None;
                }

                let s_cross_edge1 = s.cross(edge1);
                let v = inv_det * ray.direction().dot(s_cross_edge1);
                if v < 0.0 || u + v > 1.0 {
                    return None;
                }

                let t = inv_det * edge2.dot(s_cross_edge1);
                if t < TRIANGLE_T_EPSILON {
                    return None;
                }
                Some(t)
            }
        }
    }

    /// Unit surface normal at `point`; sign relative to any ray is unresolved.
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        match *self {
            Geometry::Plane { normal, .. } => normal,
            Geometry::Sphere { center, .. } => (point - center).normalize_or_zero(),
            Geometry::Triangle { v0, v1, v2 } => (v1 - v0).cross(v2 - v0).normalize_or_zero(),
        }
    }
}

/// A primitive with its surface properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    geometry: Geometry,
    /// Surface color, 0-255 per channel
    color: Color,
    /// Reserved; not used by the diffuse shading model
    specularity: f32,
    /// Light emission strength, 0 for non-emissive surfaces
    emittance: f32,
}

impl Shape {
    /// Create a grey, non-emissive shape from raw geometry.
    ///
    /// Plane normals are normalized here so `normal()` is always unit length.
    pub fn new(geometry: Geometry) -> Self {
        let geometry = match geometry {
            Geometry::Plane { point, normal } => Geometry::Plane {
                point,
                normal: normal.normalize_or_zero(),
            },
            Geometry::Sphere { center, radius } => Geometry::Sphere {
                center,
                radius: radius.max(0.0),
            },
            triangle @ Geometry::Triangle { .. } => triangle,
        };
        Self {
            geometry,
            color: Color::splat(128.0),
            specularity: 0.0,
            emittance: 0.0,
        }
    }

    /// Plane through `point` facing `normal`.
    pub fn plane(point: Vec3, normal: Vec3) -> Self {
        Self::new(Geometry::Plane { point, normal })
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::new(Geometry::Sphere { center, radius })
    }

    pub fn triangle(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self::new(Geometry::Triangle { v0, v1, v2 })
    }

    /// Set the surface color (0-255 per channel).
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the emittance. Negative values are clamped to zero.
    pub fn with_emittance(mut self, emittance: f32) -> Self {
        self.emittance = emittance.max(0.0);
        self
    }

    pub fn with_specularity(mut self, specularity: f32) -> Self {
        self.specularity = specularity;
        self
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn specularity(&self) -> f32 {
        self.specularity
    }

    #[inline]
    pub fn emittance(&self) -> f32 {
        self.emittance
    }

    /// True if hitting this shape ends a path as a light hit.
    #[inline]
    pub fn is_emissive(&self) -> bool {
        self.emittance > 0.0
    }

    /// Intersect a ray with this shape.
    ///
    /// Near-parallel rays, negative discriminants and hits behind the origin
    /// are plain misses.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        let t = self.geometry.hit_distance(ray)?;
        Some(Intersection::new(ray.at(t), self, t))
    }

    /// Unit normal at `point`. The caller orients it against the incoming ray.
    pub fn normal(&self, point: Vec3) -> Vec3 {
        self.geometry.normal_at(point)
    }
}
