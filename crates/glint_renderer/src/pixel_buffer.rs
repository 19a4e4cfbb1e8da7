//! Shared output image.
//!
//! Each pixel is a packed `0x00RRGGBB` word in an `AtomicU32`, so readers
//! can look at the image while workers are still writing it and never see
//! a half-written pixel.

use std::sync::atomic::{AtomicU32, Ordering};

use glint_math::unpack_rgb;

/// Row-major `width x height` buffer of packed RGB pixels, `y = 0` at the top.
#[derive(Debug)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<AtomicU32>,
}

impl PixelBuffer {
    /// Create a new buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Get the packed pixel at (x, y), or `None` outside the image.
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i].load(Ordering::Relaxed))
    }

    /// Set the packed pixel at (x, y).
    ///
    /// Panics outside the image; buckets are clipped to it.
    pub(crate) fn set(&self, x: u32, y: u32, value: u32) {
        let Some(i) = self.index(x, y) else {
            panic!("pixel ({x}, {y}) outside {}x{} buffer", self.width, self.height);
        };
        self.pixels[i].store(value, Ordering::Relaxed);
    }

    /// Copy of every pixel in row-major order.
    pub fn snapshot(&self) -> Vec<u32> {
        self.pixels.iter().map(|p| p.load(Ordering::Relaxed)).collect()
    }

    /// Convert to tightly packed RGB bytes (for display or saving).
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in &self.pixels {
            bytes.extend_from_slice(&unpack_rgb(pixel.load(Ordering::Relaxed)));
        }
        bytes
    }
}
