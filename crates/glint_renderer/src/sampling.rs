//! Random sampling helpers.
//!
//! Every helper draws from an explicitly passed generator; there is no
//! global or thread-local RNG anywhere in the renderer.

use glint_math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Uniform f32 in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Random point strictly inside the unit sphere (rejection sampling).
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Random point strictly inside the unit disk on the XY plane.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Deterministic generator for one unit of render work.
///
/// Mixes the global seed with the phase and bucket index (SplitMix64
/// finalizer) so that every bucket of every phase gets its own stream,
/// independent of which worker thread picks it up.
pub fn work_rng(seed: u64, phase: usize, bucket: usize) -> StdRng {
    let mut z = seed
        ^ (phase as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (bucket as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    StdRng::seed_from_u64(z ^ (z >> 31))
}
