//! Hittable trait and HitRecord for ray-object intersection.

use crate::Material;
use glint_math::{Aabb, Interval, Point3, Ray, Vec3};

/// Record of a ray-object intersection.
///
/// Built fresh by the primitive that was hit and handed back by value.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Point3,
    /// Unit outward surface normal. Not flipped towards the ray; materials
    /// compare it against the incident direction themselves.
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a dyn Material,
    /// Surface parametrization
    pub u: f32,
    pub v: f32,
}

impl std::fmt::Debug for HitRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HitRecord")
            .field("t", &self.t)
            .field("p", &self.p)
            .field("normal", &self.normal)
            .field("u", &self.u)
            .field("v", &self.v)
            .finish_non_exhaustive()
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Nearest intersection with `t` strictly inside `ray_t`, if any.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>>;

    /// Box enclosing the object over the shutter interval `[time0, time1]`.
    ///
    /// `None` means the object is unbounded and cannot go into a BVH.
    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb>;
}

/// A flat list of hittable objects.
///
/// Intersection is a linear scan that keeps shrinking the upper bound to
/// the closest hit found so far, so it always returns the global nearest.
#[derive(Default)]
pub struct HittableList {
    objects: Vec<Box<dyn Hittable>>,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: Box<dyn Hittable>) {
        self.objects.push(object);
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Give up the children, e.g. to build a BVH from them.
    pub fn into_objects(self) -> Vec<Box<dyn Hittable>> {
        self.objects
    }
}

impl From<Vec<Box<dyn Hittable>>> for HittableList {
    fn from(objects: Vec<Box<dyn Hittable>>) -> Self {
        Self { objects }
    }
}

impl Hittable for HittableList {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let mut closest: Option<HitRecord<'_>> = None;

        for object in &self.objects {
            let closest_so_far = closest.as_ref().map_or(ray_t.max, |rec| rec.t);
            if let Some(rec) = object.hit(ray, ray_t.with_max(closest_so_far)) {
                closest = Some(rec);
            }
        }

        closest
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        let mut objects = self.objects.iter();
        let first = objects.next()?.bounding_box(time0, time1)?;

        objects.try_fold(first, |acc, object| {
            let bbox = object.bounding_box(time0, time1)?;
            Some(Aabb::surrounding(&acc, &bbox))
        })
    }
}
