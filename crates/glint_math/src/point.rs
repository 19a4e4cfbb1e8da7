use std::ops::{Add, Sub};

use crate::Vec3;

/// A position in 3D space.
///
/// Kept distinct from [`Vec3`] so positions and directions cannot be mixed
/// up: points can be translated by vectors and subtracted from each other,
/// but not added together.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point3(Vec3);

impl Point3 {
    /// The world origin.
    pub const ORIGIN: Point3 = Point3(Vec3::ZERO);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }

    /// Reinterpret a vector from the origin as a point.
    #[inline]
    pub const fn from_vec3(v: Vec3) -> Self {
        Self(v)
    }

    /// The vector from the origin to this point.
    #[inline]
    pub const fn to_vec3(self) -> Vec3 {
        self.0
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.0.y
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.0.z
    }

    /// Move the point by `v`.
    #[inline]
    pub fn translate(self, v: Vec3) -> Point3 {
        Point3(self.0 + v)
    }

    /// True if every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

impl Add<Vec3> for Point3 {
    type Output = Point3;

    #[inline]
    fn add(self, rhs: Vec3) -> Point3 {
        self.translate(rhs)
    }
}

impl Sub<Vec3> for Point3 {
    type Output = Point3;

    #[inline]
    fn sub(self, rhs: Vec3) -> Point3 {
        Point3(self.0 - rhs)
    }
}

impl Sub for Point3 {
    type Output = Vec3;

    #[inline]
    fn sub(self, rhs: Point3) -> Vec3 {
        self.0 - rhs.0
    }
}
