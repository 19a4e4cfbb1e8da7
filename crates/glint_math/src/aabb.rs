use crate::{Interval, Point3, Ray, Vec3};

/// Axis-aligned bounding box used by the BVH.
///
/// Stored as one interval per axis. Axes thinner than [`Aabb::MIN_EXTENT`]
/// are padded so flat boxes still register slab hits.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    pub const MIN_EXTENT: f32 = 0.0001;

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from two opposite corners, in any order.
    pub fn from_points(a: Point3, b: Point3) -> Self {
        let (a, b) = (a.to_vec3(), b.to_vec3());
        Self::new(
            Interval::new(a.x.min(b.x), a.x.max(b.x)),
            Interval::new(a.y.min(b.y), a.y.max(b.y)),
            Interval::new(a.z.min(b.z), a.z.max(b.z)),
        )
    }

    /// Smallest box enclosing both boxes (component-wise min/max).
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Slab test: does the ray pass through the box for some t in `ray_t`?
    pub fn hit(&self, ray: &Ray, mut ray_t: Interval) -> bool {
        let origin = ray.origin().to_vec3();
        let direction = ray.direction();

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let inv_d = 1.0 / direction[axis];
            let mut t0 = (slab.min - origin[axis]) * inv_d;
            let mut t1 = (slab.max - origin[axis]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }

            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }

        true
    }

    fn pad_to_minimums(&mut self) {
        for axis in [&mut self.x, &mut self.y, &mut self.z] {
            if axis.size() < Self::MIN_EXTENT {
                *axis = axis.expand(Self::MIN_EXTENT);
            }
        }
    }
}
