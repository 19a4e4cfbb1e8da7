use crate::Vec3;

/// Optics helpers on top of glam's `Vec3`.
pub trait Vec3Ext {
    /// Mirror the vector about the normal `n` (`n` should be unit length).
    fn reflect_about(self, n: Vec3) -> Vec3;

    /// Refract through a surface with normal `n` using Snell's law.
    ///
    /// Both vectors are normalized first. Returns `None` on total internal
    /// reflection, i.e. when `1 - ni_over_nt² (1 - dt²) <= 0`.
    fn try_refract(self, n: Vec3, ni_over_nt: f32) -> Option<Vec3>;
}

impl Vec3Ext for Vec3 {
    #[inline]
    fn reflect_about(self, n: Vec3) -> Vec3 {
        self - 2.0 * self.dot(n) * n
    }

    fn try_refract(self, n: Vec3, ni_over_nt: f32) -> Option<Vec3> {
        let uv = self.normalize();
        let un = n.normalize();

        let dt = uv.dot(un);
        let discriminant = 1.0 - ni_over_nt * ni_over_nt * (1.0 - dt * dt);
        if discriminant <= 0.0 {
            return None;
        }

        Some(ni_over_nt * (uv - un * dt) - un * discriminant.sqrt())
    }
}
