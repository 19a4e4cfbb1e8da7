//! Procedural textures.

use std::sync::Arc;

use glint_math::{Color, Point3};
use rand::RngCore;

use crate::perlin::{Perlin, DEFAULT_TURBULENCE_DEPTH};

/// A color that varies over a surface.
pub trait Texture: Send + Sync {
    /// Color at surface coordinates `(u, v)` and world position `p`.
    fn value(&self, u: f32, v: f32, p: Point3) -> Color;
}

/// A single flat color.
#[derive(Debug, Clone, Copy)]
pub struct SolidColor {
    color: Color,
}

impl SolidColor {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl From<Color> for SolidColor {
    fn from(color: Color) -> Self {
        Self::new(color)
    }
}

impl Texture for SolidColor {
    fn value(&self, _u: f32, _v: f32, _p: Point3) -> Color {
        self.color
    }
}

/// 3D checkerboard: alternates between two textures on the sign of
/// `sin(10x) sin(10y) sin(10z)`.
#[derive(Clone)]
pub struct CheckerTexture {
    odd: Arc<dyn Texture>,
    even: Arc<dyn Texture>,
}

impl CheckerTexture {
    pub fn new(odd: Arc<dyn Texture>, even: Arc<dyn Texture>) -> Self {
        Self { odd, even }
    }

    pub fn from_colors(odd: Color, even: Color) -> Self {
        Self::new(Arc::new(SolidColor::new(odd)), Arc::new(SolidColor::new(even)))
    }
}

impl Texture for CheckerTexture {
    fn value(&self, u: f32, v: f32, p: Point3) -> Color {
        let sines = (10.0 * p.x()).sin() * (10.0 * p.y()).sin() * (10.0 * p.z()).sin();
        if sines < 0.0 {
            self.odd.value(u, v, p)
        } else {
            self.even.value(u, v, p)
        }
    }
}

/// Marble-like gray pattern driven by Perlin turbulence.
#[derive(Clone)]
pub struct NoiseTexture {
    noise: Perlin,
    scale: f32,
}

impl NoiseTexture {
    pub fn new(scale: f32, rng: &mut dyn RngCore) -> Self {
        Self {
            noise: Perlin::new(rng),
            scale,
        }
    }
}

impl Texture for NoiseTexture {
    fn value(&self, _u: f32, _v: f32, p: Point3) -> Color {
        let turb = self.noise.turb(p.to_vec3(), DEFAULT_TURBULENCE_DEPTH);
        Color::gray(0.5 * (1.0 + (self.scale * p.z() + 10.0 * turb).sin()))
    }
}
