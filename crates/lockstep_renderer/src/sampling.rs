//! Random sampling helpers.
//!
//! Every function takes the generator explicitly; there is no global RNG.
//! Seed a `rand::rngs::StdRng` to make a render or a test reproducible.

use lockstep_math::Vec3;
use rand::{Rng, RngCore};
use std::f32::consts::TAU;

/// Uniform f32 in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Uniformly distributed point on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    let theta = gen_f32(rng) * TAU;
    let cos_phi = 2.0 * gen_f32(rng) - 1.0;
    let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
    Vec3::new(sin_phi * theta.cos(), sin_phi * theta.sin(), cos_phi)
}

/// Uniformly distributed direction in the hemisphere around `normal`.
///
/// Not cosine-weighted: the integrator weights by `n . d` afterwards.
pub fn random_hemisphere_vector(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let v = random_unit_vector(rng);
    if v.dot(normal) < 0.0 {
        -v
    } else {
        v
    }
}

/// Derive an independent seed for one stream (pass, row, ...) of a render.
pub fn stream_seed(seed: u64, stream: u64) -> u64 {
    // splitmix64 finalizer
    let mut z = seed ^ stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unit_vectors_are_unit() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_hemisphere_faces_normal() {
        let mut rng = StdRng::seed_from_u64(11);
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        for _ in 0..1000 {
            assert!(random_hemisphere_vector(normal, &mut rng).dot(normal) >= 0.0);
        }
    }

    #[test]
    fn test_hemisphere_is_seed_reproducible() {
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(
                random_hemisphere_vector(Vec3::Z, &mut a),
                random_hemisphere_vector(Vec3::Z, &mut b)
            );
        }
    }

    #[test]
    fn test_stream_seeds_differ() {
        assert_ne!(stream_seed(42, 0), stream_seed(42, 1));
        assert_ne!(stream_seed(42, 0), stream_seed(43, 0));
        assert_eq!(stream_seed(42, 5), stream_seed(42, 5));
    }
}
