use crate::Vec3;

/// A ray in 3D space with origin, unit direction and bounce index.
///
/// The direction is normalized on construction, so every `Ray` in the
/// tracer satisfies `direction.length() == 1` (within float tolerance).
/// A bounce never mutates a ray; it builds the next one with
/// [`Ray::bounced`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    bounce: u32,
}

impl Ray {
    /// Create a primary ray (bounce 0). `direction` is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_bounce(origin, direction, 0)
    }

    /// Create a ray at the given bounce index. `direction` is normalized.
    ///
    /// # Panics
    ///
    /// Panics if `direction` is zero or not finite; use [`Ray::try_new`] for
    /// directions that have not been validated.
    pub fn with_bounce(origin: Vec3, direction: Vec3, bounce: u32) -> Self {
        match unit(direction) {
            Some(direction) => Self {
                origin,
                direction,
                bounce,
            },
            None => panic!("ray direction must be finite and non-zero, got {direction}"),
        }
    }

    /// Create a ray from a finite origin and a non-zero, finite direction,
    /// or `None`.
    pub fn try_new(origin: Vec3, direction: Vec3) -> Option<Self> {
        if !origin.is_finite() {
            return None;
        }
        Some(Self {
            origin,
            direction: unit(direction)?,
            bounce: 0,
        })
    }

    /// The continuation ray leaving `origin` along `direction`, one bounce deeper.
    pub fn bounced(&self, origin: Vec3, direction: Vec3) -> Self {
        Self::with_bounce(origin, direction, self.bounce + 1)
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the unit direction of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Number of surfaces this path has bounced off before this ray.
    #[inline]
    pub fn bounce(&self) -> u32 {
        self.bounce
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Normalize `v` unless it is already unit length, in which case its bits
/// are kept so decoded accelerator records reproduce the host ray. `None`
/// for zero or non-finite vectors.
#[inline]
fn unit(v: Vec3) -> Option<Vec3> {
    if (v.length_squared() - 1.0).abs() <= UNIT_TOLERANCE {
        Some(v)
    } else {
        v.try_normalize()
    }
}

const UNIT_TOLERANCE: f32 = 1e-6;
