//! Sphere primitives for ray tracing.
//!
//! A negative radius is accepted on purpose: the surface is the same but
//! the normal points inward, which turns a sphere nested inside a glass
//! ball into a hollow shell.

use crate::{
    error::{SceneError, SceneResult},
    hittable::{HitRecord, Hittable},
    Material,
};
use glint_math::{Aabb, Interval, Point3, Ray, Vec3};
use std::f32::consts::PI;

/// A static sphere primitive.
pub struct Sphere<M: Material> {
    center: Point3,
    radius: f32,
    material: M,
}

impl<M: Material> Sphere<M> {
    /// Create a new sphere. Zero or non-finite radii are rejected.
    pub fn new(center: Point3, radius: f32, material: M) -> SceneResult<Self> {
        validate(center, radius)?;
        Ok(Self {
            center,
            radius,
            material,
        })
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl<M: Material + 'static> Hittable for Sphere<M> {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        hit_sphere(self.center, self.radius, &self.material, ray, ray_t)
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        Some(sphere_box(self.center, self.radius))
    }
}

/// A sphere whose center moves linearly from `center0` at `time0` to
/// `center1` at `time1`. Rays see it at the position for their own time
/// sample, which produces motion blur once samples are averaged.
pub struct MovingSphere<M: Material> {
    center0: Point3,
    center1: Point3,
    time0: f32,
    time1: f32,
    radius: f32,
    material: M,
}

impl<M: Material> MovingSphere<M> {
    pub fn new(
        center0: Point3,
        center1: Point3,
        time0: f32,
        time1: f32,
        radius: f32,
        material: M,
    ) -> SceneResult<Self> {
        validate(center0, radius)?;
        validate(center1, radius)?;
        if !(time1 > time0) {
            return Err(SceneError::InvalidTimeRange { time0, time1 });
        }

        Ok(Self {
            center0,
            center1,
            time0,
            time1,
            radius,
            material,
        })
    }

    /// Center at the given time (extrapolated outside `[time0, time1]`).
    pub fn center(&self, time: f32) -> Point3 {
        let f = (time - self.time0) / (self.time1 - self.time0);
        self.center0 + f * (self.center1 - self.center0)
    }
}

impl<M: Material + 'static> Hittable for MovingSphere<M> {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        hit_sphere(self.center(ray.time()), self.radius, &self.material, ray, ray_t)
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        let box0 = sphere_box(self.center(time0), self.radius);
        let box1 = sphere_box(self.center(time1), self.radius);
        Some(Aabb::surrounding(&box0, &box1))
    }
}

fn validate(center: Point3, radius: f32) -> SceneResult<()> {
    if radius == 0.0 || !radius.is_finite() {
        return Err(SceneError::DegenerateSphere { radius });
    }
    if !center.is_finite() {
        return Err(SceneError::NonFiniteCenter);
    }
    Ok(())
}

fn sphere_box(center: Point3, radius: f32) -> Aabb {
    let rvec = Vec3::splat(radius.abs());
    Aabb::from_points(center - rvec, center + rvec)
}

/// Shared ray/sphere test.
///
/// Solves `|O - C + tD|² = r²` with the half-b form. A zero discriminant
/// (tangent ray) counts as a miss. The near root is tried before the far
/// one and each must lie strictly inside `ray_t`.
fn hit_sphere<'a>(
    center: Point3,
    radius: f32,
    material: &'a dyn Material,
    ray: &Ray,
    ray_t: Interval,
) -> Option<HitRecord<'a>> {
    let oc = ray.origin() - center;
    let a = ray.direction().length_squared();
    let b = oc.dot(ray.direction());
    let c = oc.length_squared() - radius * radius;

    let discriminant = b * b - a * c;
    if discriminant <= 0.0 {
        return None;
    }

    let sqrtd = discriminant.sqrt();
    let root = [(-b - sqrtd) / a, (-b + sqrtd) / a]
        .into_iter()
        .find(|&t| ray_t.surrounds(t))?;

    let p = ray.at(root);
    // offset / radius is not unit length in f32 for small spheres
    let outward = (p - center).normalize();
    let (u, v) = sphere_uv(outward);

    Some(HitRecord {
        t: root,
        p,
        normal: outward * radius.signum(),
        material,
        u,
        v,
    })
}

/// UV coordinates for a point on the unit sphere centered at the origin.
///
/// u: angle around the Y axis from X = -1, v: angle from Y = -1 to Y = +1.
fn sphere_uv(p: Vec3) -> (f32, f32) {
    let theta = (-p.y).acos();
    let phi = (-p.z).atan2(p.x) + PI;

    (phi / (2.0 * PI), theta / PI)
}
