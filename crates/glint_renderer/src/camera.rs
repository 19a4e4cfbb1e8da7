//! Camera for ray generation.

use crate::error::{SceneError, SceneResult};
use crate::sampling::{gen_f32, random_in_unit_disk};
use glint_math::{Interval, Point3, Ray, Vec3};
use rand::RngCore;

/// Thin-lens camera producing rays through normalized image coordinates.
///
/// Immutable after construction, so one camera is shared by every worker.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    origin: Point3,
    lower_left: Point3,
    horizontal: Vec3,
    vertical: Vec3,

    // Orthonormal basis, w points away from the view direction
    u: Vec3,
    v: Vec3,
    w: Vec3,

    lens_radius: f32,
    shutter: Interval,
}

impl Camera {
    /// Create a camera.
    ///
    /// - `vfov`: vertical field of view in degrees, in (0, 180)
    /// - `aspect`: image width over height
    /// - `aperture`: lens diameter, 0 for a pinhole
    /// - `focus_dist`: distance to the plane of perfect focus
    pub fn new(
        look_from: Point3,
        look_at: Point3,
        vup: Vec3,
        vfov: f32,
        aspect: f32,
        aperture: f32,
        focus_dist: f32,
    ) -> SceneResult<Self> {
        let view = look_from - look_at;
        if !(view.length_squared() > 0.0) {
            return Err(SceneError::DegenerateCamera("look_from and look_at coincide"));
        }
        if !(vfov > 0.0 && vfov < 180.0) {
            return Err(SceneError::DegenerateCamera("vertical fov must be in (0, 180) degrees"));
        }
        if !(aspect > 0.0 && aspect.is_finite()) {
            return Err(SceneError::DegenerateCamera("aspect ratio must be positive"));
        }
        if !(focus_dist > 0.0 && focus_dist.is_finite()) {
            return Err(SceneError::DegenerateCamera("focus distance must be positive"));
        }
        if !(aperture >= 0.0 && aperture.is_finite()) {
            return Err(SceneError::DegenerateCamera("aperture must not be negative"));
        }

        let w = view.normalize();
        let side = vup.cross(w);
        if side.length_squared() < 1e-12 {
            return Err(SceneError::DegenerateCamera("vup is parallel to the view direction"));
        }
        let u = side.normalize();
        let v = w.cross(u);

        let half_height = (vfov.to_radians() / 2.0).tan();
        let half_width = aspect * half_height;

        let lower_left = look_from
            - half_width * focus_dist * u
            - half_height * focus_dist * v
            - focus_dist * w;

        Ok(Self {
            origin: look_from,
            lower_left,
            horizontal: 2.0 * half_width * focus_dist * u,
            vertical: 2.0 * half_height * focus_dist * v,
            u,
            v,
            w,
            lens_radius: aperture / 2.0,
            shutter: Interval::new(0.0, 1.0),
        })
    }

    /// Set the shutter interval ray times are drawn from.
    pub fn with_shutter(mut self, time0: f32, time1: f32) -> SceneResult<Self> {
        if !(time1 >= time0) {
            return Err(SceneError::InvalidTimeRange { time0, time1 });
        }
        self.shutter = Interval::new(time0, time1);
        Ok(self)
    }

    pub fn origin(&self) -> Point3 {
        self.origin
    }

    pub fn shutter(&self) -> Interval {
        self.shutter
    }

    pub fn lens_radius(&self) -> f32 {
        self.lens_radius
    }

    /// Unit vector pointing from the camera towards the scene.
    pub fn forward(&self) -> Vec3 {
        -self.w
    }

    /// Generate a ray through image coordinates `(s, t)`, both in [0, 1]
    /// with `t = 0` at the bottom edge.
    pub fn get_ray(&self, s: f32, t: f32, rng: &mut dyn RngCore) -> Ray {
        let offset = if self.lens_radius > 0.0 {
            let rd = self.lens_radius * random_in_unit_disk(rng);
            self.u * rd.x + self.v * rd.y
        } else {
            Vec3::ZERO
        };

        let origin = self.origin + offset;
        let target = self.lower_left + s * self.horizontal + t * self.vertical;
        let time = self.shutter.min + gen_f32(rng) * self.shutter.size();

        Ray::new(origin, target - origin, time)
    }
}

/// Builder for [`Camera`] with defaults matching a 2:1 image looking down -Z.
#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    pub look_from: Point3,
    pub look_at: Point3,
    pub vup: Vec3,
    pub vfov: f32,
    pub aspect_ratio: f32,
    pub aperture: f32,
    pub focus_dist: f32,
    pub time0: f32,
    pub time1: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            look_from: Point3::ORIGIN,
            look_at: Point3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            aspect_ratio: 2.0,
            aperture: 0.0,
            focus_dist: 1.0,
            time0: 0.0,
            time1: 1.0,
        }
    }
}

impl CameraConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Point3, look_at: Point3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set field of view and focus distance.
    pub fn with_lens(mut self, vfov: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.focus_dist = focus_dist;
        self
    }

    pub fn with_aperture(mut self, aperture: f32) -> Self {
        self.aperture = aperture;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_shutter(mut self, time0: f32, time1: f32) -> Self {
        self.time0 = time0;
        self.time1 = time1;
        self
    }

    pub fn build(&self) -> SceneResult<Camera> {
        Camera::new(
            self.look_from,
            self.look_at,
            self.vup,
            self.vfov,
            self.aspect_ratio,
            self.aperture,
            self.focus_dist,
        )?
        .with_shutter(self.time0, self.time1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hittable, HittableList, Lambertian, Sphere};
    use glint_math::Color;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_camera_basis() {
        let camera = CameraConfig::new().build().unwrap();

        assert_eq!(camera.origin(), Point3::ORIGIN);
        assert!((camera.w - Vec3::Z).length() < 1e-6);
        assert!((camera.u - Vec3::X).length() < 1e-6);
        assert!((camera.v - Vec3::Y).length() < 1e-6);

        // 90 degree fov at aspect 2: viewport is 4 wide, 2 tall
        assert!((camera.horizontal - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-5);
        assert!((camera.vertical - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
        assert!((camera.lower_left - Point3::new(-2.0, -1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_camera_center_ray_points_at_target() {
        let camera = CameraConfig::new()
            .with_position(Point3::new(3.0, 3.0, 2.0), Point3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(20.0, 1.0)
            .build()
            .unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let ray = camera.get_ray(0.5, 0.5, &mut rng);
        let expected = (Point3::new(0.0, 0.0, -1.0) - Point3::new(3.0, 3.0, 2.0)).normalize();

        assert!((ray.direction().normalize() - expected).length() < 1e-5);
        assert!((camera.forward() - expected).length() < 1e-5);
    }

    #[test]
    fn test_corners_map_to_image_edges() {
        let camera = CameraConfig::new().build().unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let bottom_left = camera.get_ray(0.0, 0.0, &mut rng).direction();
        let top_right = camera.get_ray(1.0, 1.0, &mut rng).direction();
        assert!(bottom_left.x < 0.0 && bottom_left.y < 0.0);
        assert!(top_right.x > 0.0 && top_right.y > 0.0);
    }

    #[test]
    fn test_pinhole_rays_share_origin() {
        let camera = CameraConfig::new().build().unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for i in 0..50 {
            let ray = camera.get_ray(i as f32 / 50.0, 0.3, &mut rng);
            assert_eq!(ray.origin(), Point3::ORIGIN);
        }
    }

    #[test]
    fn test_defocus_origin_within_lens() {
        let camera = CameraConfig::new()
            .with_position(Point3::new(13.0, 2.0, 3.0), Point3::ORIGIN, Vec3::Y)
            .with_lens(20.0, 10.0)
            .with_aperture(0.1)
            .build()
            .unwrap();
        assert!((camera.lens_radius() - 0.05).abs() < 1e-7);

        let mut rng = StdRng::seed_from_u64(11);
        let focus_point = camera.lower_left + 0.5 * camera.horizontal + 0.5 * camera.vertical;
        for _ in 0..100 {
            let ray = camera.get_ray(0.5, 0.5, &mut rng);
            let offset = ray.origin() - camera.origin();
            assert!(offset.length() < 0.05 + 1e-5);
            // Offset lies in the lens plane
            assert!(offset.dot(camera.w).abs() < 1e-5);
            // Every lens sample still converges on the focus plane
            assert!((ray.at(1.0) - focus_point).length() < 1e-3);
        }
    }

    #[test]
    fn test_ray_times_within_shutter() {
        let camera = CameraConfig::new().with_shutter(0.25, 0.75).build().unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let time = camera.get_ray(0.5, 0.5, &mut rng).time();
            assert!((0.25..0.75).contains(&time));
        }
    }

    #[test]
    fn test_degenerate_cameras_rejected() {
        let coincident = CameraConfig::new().with_position(Point3::ORIGIN, Point3::ORIGIN, Vec3::Y);
        assert!(matches!(coincident.build(), Err(SceneError::DegenerateCamera(_))));

        let parallel_up = CameraConfig::new().with_position(Point3::ORIGIN, Point3::new(0.0, 5.0, 0.0), Vec3::Y);
        assert!(matches!(parallel_up.build(), Err(SceneError::DegenerateCamera(_))));

        assert!(CameraConfig::new().with_lens(180.0, 1.0).build().is_err());
        assert!(CameraConfig::new().with_lens(60.0, 0.0).build().is_err());
        assert!(CameraConfig::new().with_aspect_ratio(0.0).build().is_err());
        assert!(CameraConfig::new().with_aperture(-1.0).build().is_err());

        let backwards = CameraConfig::new().with_shutter(1.0, 0.0).build();
        assert_eq!(backwards.err(), Some(SceneError::InvalidTimeRange { time0: 1.0, time1: 0.0 }));
    }

    #[test]
    fn test_foreground_sphere_hit_before_ground() {
        let mut world = HittableList::new();
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, -100.5, -1.0), 100.0, Lambertian::new(Color::gray(0.5))).unwrap(),
        ));
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, 0.0, -1.0), 0.5, Lambertian::new(Color::gray(0.5))).unwrap(),
        ));

        let camera = CameraConfig::new()
            .with_position(Point3::new(0.0, 0.0, 3.0), Point3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(45.0, 1.0)
            .build()
            .unwrap();

        let ray = camera.get_ray(0.5, 0.5, &mut StdRng::seed_from_u64(1));
        let rec = world.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();

        // Front of the small sphere, not the ground beneath it
        assert!((rec.t - 3.5).abs() < 1e-4);
        assert!((rec.p - Point3::new(0.0, 0.0, -0.5)).length() < 1e-4);
    }
}
