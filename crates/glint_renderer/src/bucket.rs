//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that can be rendered
//! independently and in parallel. Each tile owns the running colour sums
//! of its pixels, so progressive phases only ever add samples.

use glint_math::Color;
use rand::RngCore;

use crate::renderer::{ray_color, RenderSettings, Scene};
use crate::sampling::gen_f32;
use crate::PixelBuffer;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    /// Create a new bucket.
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// Generate buckets for an image, sorted in spiral order from center.
///
/// Buckets are rendered from the center outward so the middle of the
/// frame fills in first.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let mut buckets = Vec::new();
    let mut index = 0;

    // Generate grid of buckets
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, index));
            index += 1;
            x += bucket_size;
        }
        y += bucket_size;
    }

    // Sort by distance from center (spiral order)
    sort_spiral(&mut buckets, width, height);

    // Update indices after sorting
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center.
///
/// The sort is stable, so equidistant buckets keep their row-major order.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    buckets.sort_by(|a, b| {
        let a_center_x = a.x as f32 + a.width as f32 / 2.0;
        let a_center_y = a.y as f32 + a.height as f32 / 2.0;
        let b_center_x = b.x as f32 + b.width as f32 / 2.0;
        let b_center_y = b.y as f32 + b.height as f32 / 2.0;

        let a_dist = (a_center_x - center_x).powi(2) + (a_center_y - center_y).powi(2);
        let b_dist = (b_center_x - center_x).powi(2) + (b_center_y - center_y).powi(2);

        a_dist.total_cmp(&b_dist)
    });
}

/// Running per-pixel colour sums for one bucket.
#[derive(Debug, Clone)]
pub struct BucketAccumulator {
    bucket: Bucket,
    /// Row-major within the bucket
    sums: Vec<Color>,
    samples: u32,
}

impl BucketAccumulator {
    pub fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            sums: vec![Color::BLACK; bucket.pixel_count() as usize],
            samples: 0,
        }
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    /// Samples per pixel accumulated so far.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Add `samples` more samples to every pixel of the bucket.
    ///
    /// `y = 0` is the top row of the image, so the vertical image
    /// coordinate handed to the camera is flipped.
    pub fn render_phase(
        &mut self,
        scene: &Scene,
        settings: &RenderSettings,
        samples: u32,
        rng: &mut dyn RngCore,
    ) {
        let width = settings.width as f32;
        let height = settings.height as f32;

        for local_y in 0..self.bucket.height {
            for local_x in 0..self.bucket.width {
                let x = (self.bucket.x + local_x) as f32;
                let y = (self.bucket.y + local_y) as f32;

                let mut sum = Color::BLACK;
                for _ in 0..samples {
                    let s = (x + gen_f32(rng)) / width;
                    let t = (height - 1.0 - y + gen_f32(rng)) / height;
                    let ray = scene.camera.get_ray(s, t, rng);
                    sum += ray_color(&ray, scene.world.as_ref(), settings.max_depth, &scene.background, rng);
                }

                self.sums[(local_y * self.bucket.width + local_x) as usize] += sum;
            }
        }

        self.samples += samples;
    }

    /// Average colour of a pixel in bucket-local coordinates.
    pub fn average(&self, local_x: u32, local_y: u32) -> Color {
        if self.samples == 0 {
            return Color::BLACK;
        }
        self.sums[(local_y * self.bucket.width + local_x) as usize] / self.samples as f32
    }

    /// Write the gamma-mapped averages into the shared buffer.
    pub fn resolve(&self, buffer: &PixelBuffer) {
        for local_y in 0..self.bucket.height {
            for local_x in 0..self.bucket.width {
                let value = self.average(local_x, local_y).gamma2().pixel_value();
                buffer.set(self.bucket.x + local_x, self.bucket.y + local_y, value);
            }
        }
    }
}
