//! Gradient (Perlin) noise.

use glint_math::Vec3;
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::sampling::gen_f32;

const POINT_COUNT: usize = 256;

/// Default octave count for [`Perlin::turb`].
pub const DEFAULT_TURBULENCE_DEPTH: u32 = 7;

/// Lattice noise with random unit gradients and per-axis permutation tables.
///
/// Tables are generated once from the caller's rng, so the same seed always
/// yields the same noise field.
#[derive(Clone)]
pub struct Perlin {
    gradients: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let gradients = (0..POINT_COUNT)
            .map(|_| random_gradient(rng))
            .collect();

        Self {
            gradients,
            perm_x: permutation(rng),
            perm_y: permutation(rng),
            perm_z: permutation(rng),
        }
    }

    /// Smooth noise in roughly [-1, 1].
    pub fn noise(&self, p: Vec3) -> f32 {
        let floor = p.floor();
        let frac = p - floor;
        let (i, j, k) = (floor.x as i32, floor.y as i32, floor.z as i32);

        let mut corners = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in corners.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, corner) in row.iter_mut().enumerate() {
                    let index = self.perm_x[wrap(i + di as i32)]
                        ^ self.perm_y[wrap(j + dj as i32)]
                        ^ self.perm_z[wrap(k + dk as i32)];
                    *corner = self.gradients[index];
                }
            }
        }

        interpolate(&corners, frac)
    }

    /// Sum of `depth` octaves of noise, each at twice the frequency and half
    /// the weight of the previous one.
    pub fn turb(&self, p: Vec3, depth: u32) -> f32 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;

        for _ in 0..depth {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p *= 2.0;
        }

        accum.abs()
    }
}

#[inline]
fn wrap(i: i32) -> usize {
    (i & (POINT_COUNT as i32 - 1)) as usize
}

fn random_gradient(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let v = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

fn permutation(rng: &mut dyn RngCore) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..POINT_COUNT).collect();
    perm.shuffle(rng);
    perm
}

/// Trilinear blend of the corner gradients with Hermite smoothing.
fn interpolate(corners: &[[[Vec3; 2]; 2]; 2], frac: Vec3) -> f32 {
    let smooth = frac * frac * (Vec3::splat(3.0) - 2.0 * frac);
    let mut accum = 0.0;

    for (i, plane) in corners.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, gradient) in row.iter().enumerate() {
                let corner = Vec3::new(i as f32, j as f32, k as f32);
                let weight = frac - corner;
                let blend = corner * smooth + (Vec3::ONE - corner) * (Vec3::ONE - smooth);
                accum += blend.x * blend.y * blend.z * gradient.dot(weight);
            }
        }
    }

    accum
}
