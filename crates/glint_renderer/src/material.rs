//! Material trait for surface scattering.
//!
//! `scatter` is a pure function of the incident ray, the hit record and the
//! draws it takes from `rng`; materials hold no mutable state.

use std::sync::Arc;

use glint_math::{Color, Point3, Ray, Vec3Ext};
use rand::RngCore;

use crate::hittable::HitRecord;
use crate::sampling::{gen_f32, random_in_unit_sphere};
use crate::texture::{SolidColor, Texture};

/// Result of a successful scatter: how much light survives and where the
/// path goes next.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    pub attenuation: Color,
    pub scattered: Ray,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed, which ends the path.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult>;

    /// Light emitted at the given surface point. Black unless the material
    /// is a light source.
    fn emitted(&self, _u: f32, _v: f32, _p: Point3) -> Color {
        Color::BLACK
    }
}

/// Lambertian (diffuse) material.
#[derive(Clone)]
pub struct Lambertian {
    albedo: Arc<dyn Texture>,
}

impl Lambertian {
    /// Create a new Lambertian material with a flat albedo color.
    pub fn new(albedo: Color) -> Self {
        Self::textured(Arc::new(SolidColor::new(albedo)))
    }

    pub fn textured(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let mut direction = rec.normal + random_in_unit_sphere(rng);

        // Catch degenerate scatter direction
        if direction.length_squared() < 1e-8 {
            direction = rec.normal;
        }

        Some(ScatterResult {
            attenuation: self.albedo.value(rec.u, rec.v, rec.p),
            scattered: Ray::new(rec.p, direction, ray_in.time()),
        })
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone, Copy)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror. Values of 1.0 and above
    ///   disable the perturbation entirely.
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self { albedo, fuzz }
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let mut reflected = ray_in.direction().normalize().reflect_about(rec.normal);
        if self.fuzz < 1.0 {
            reflected += self.fuzz * random_in_unit_sphere(rng);
        }

        // Pointing into the surface: absorbed
        if reflected.dot(rec.normal) < 0.0 {
            return None;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, reflected, ray_in.time()),
        })
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone, Copy)]
pub struct Dielectric {
    /// Index of refraction relative to the surrounding medium
    ri: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ri`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ri: f32) -> Self {
        Self { ri }
    }

    /// Schlick's approximation for reflectance
    pub fn reflectance(cosine: f32, ri: f32) -> f32 {
        let r0 = ((1.0 - ri) / (1.0 + ri)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let direction = ray_in.direction();
        let dot = direction.dot(rec.normal);

        let (outward_normal, ni_over_nt, cosine) = if dot > 0.0 {
            // Leaving the medium
            let cosine = dot / direction.length();
            let cosine = (1.0 - self.ri * self.ri * (1.0 - cosine * cosine)).sqrt();
            (-rec.normal, self.ri, cosine)
        } else {
            (rec.normal, 1.0 / self.ri, -dot / direction.length())
        };

        let scattered_direction = match direction.try_refract(outward_normal, ni_over_nt) {
            Some(refracted) if gen_f32(rng) >= Self::reflectance(cosine, self.ri) => refracted,
            _ => direction.normalize().reflect_about(rec.normal),
        };

        Some(ScatterResult {
            attenuation: Color::WHITE,
            scattered: Ray::new(rec.p, scattered_direction, ray_in.time()),
        })
    }
}

/// Diffuse light emitter. Never scatters; contributes its emission only.
#[derive(Clone)]
pub struct DiffuseLight {
    emit: Arc<dyn Texture>,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self::textured(Arc::new(SolidColor::new(emit)))
    }

    pub fn textured(emit: Arc<dyn Texture>) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn scatter(&self, _ray_in: &Ray, _rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<ScatterResult> {
        None
    }

    fn emitted(&self, u: f32, v: f32, p: Point3) -> Color {
        self.emit.value(u, v, p)
    }
}
