use std::ops::{Add, AddAssign, Div, Mul};

/// Linear RGB radiance. Channels are not clamped; values above 1.0 are
/// legal and saturate only when converted to a pixel.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// A gray with all three channels set to `v`.
    #[inline]
    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Apply gamma 2 (square root per channel). Non-positive channels map to 0.
    pub fn gamma2(self) -> Color {
        Color::new(
            linear_to_gamma(self.r),
            linear_to_gamma(self.g),
            linear_to_gamma(self.b),
        )
    }

    /// Pack into a `0x00RRGGBB` pixel.
    ///
    /// Each channel is scaled by 255.99, clamped to [0, 255] and truncated,
    /// so anything at or above 1.0 saturates to 255.
    pub fn pixel_value(self) -> u32 {
        let r = channel_to_byte(self.r);
        let g = channel_to_byte(self.g);
        let b = channel_to_byte(self.b);
        (r << 16) | (g << 8) | b
    }

    /// True if every channel is finite.
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

/// Split a packed `0x00RRGGBB` pixel into its `[r, g, b]` bytes.
#[inline]
pub fn unpack_rgb(pixel: u32) -> [u8; 3] {
    [
        ((pixel >> 16) & 0xFF) as u8,
        ((pixel >> 8) & 0xFF) as u8,
        (pixel & 0xFF) as u8,
    ]
}

#[inline]
fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

#[inline]
fn channel_to_byte(c: f32) -> u32 {
    // NaN falls through the clamp and casts to 0
    (c * 255.99).clamp(0.0, 255.0) as u32
}

impl Add for Color {
    type Output = Color;

    #[inline]
    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Color {
    #[inline]
    fn add_assign(&mut self, rhs: Color) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

/// Component-wise product (attenuation).
impl Mul for Color {
    type Output = Color;

    #[inline]
    fn mul(self, rhs: Color) -> Color {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    #[inline]
    fn mul(self, t: f32) -> Color {
        Color::new(self.r * t, self.g * t, self.b * t)
    }
}

impl Mul<Color> for f32 {
    type Output = Color;

    #[inline]
    fn mul(self, c: Color) -> Color {
        c * self
    }
}

impl Div<f32> for Color {
    type Output = Color;

    #[inline]
    fn div(self, t: f32) -> Color {
        self * (1.0 / t)
    }
}
