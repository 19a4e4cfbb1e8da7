//! Glint math kernel.
//!
//! Free vectors come from glam; positions, colors, rays and bounding boxes
//! are Glint's own value types so points and directions cannot be mixed up.

// Re-export glam for convenience
pub use glam::{vec3, Vec3};

mod aabb;
mod color;
mod interval;
mod point;
mod ray;
mod vector;

pub use aabb::Aabb;
pub use color::{unpack_rgb, Color};
pub use interval::Interval;
pub use point::Point3;
pub use ray::Ray;
pub use vector::Vec3Ext;
