//! Glint renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer: spheres and moving spheres behind a BVH,
//! Lambertian, metal, dielectric and emissive materials, procedural
//! textures, and a progressive bucket renderer that writes packed RGB
//! pixels into a buffer other threads can read while it runs.

mod bucket;
mod bvh;
mod camera;
mod error;
mod hittable;
mod material;
mod perlin;
mod pixel_buffer;
mod progress;
mod renderer;
mod sampling;
mod sphere;
mod texture;

pub use bucket::{generate_buckets, Bucket, BucketAccumulator, DEFAULT_BUCKET_SIZE};
pub use bvh::Bvh;
pub use camera::{Camera, CameraConfig};
pub use error::{RenderError, SceneError, SceneResult};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{Dielectric, DiffuseLight, Lambertian, Material, Metal, ScatterResult};
pub use perlin::{Perlin, DEFAULT_TURBULENCE_DEPTH};
pub use pixel_buffer::PixelBuffer;
pub use progress::{Progress, RenderEvent};
pub use renderer::{
    ray_color, Background, RenderHandle, RenderOutput, RenderSettings, RenderStats, Renderer,
    Scene, HIT_EPSILON,
};
pub use sampling::{gen_f32, random_in_unit_disk, random_in_unit_sphere, work_rng};
pub use sphere::{MovingSphere, Sphere};
pub use texture::{CheckerTexture, NoiseTexture, SolidColor, Texture};

/// Re-export the math types the public API is written in
pub use glint_math::{Aabb, Color, Interval, Point3, Ray, Vec3};
