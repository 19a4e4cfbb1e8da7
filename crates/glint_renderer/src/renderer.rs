//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with configurable depth
//! - Gamma correction
//! - Progressive phases that keep adding samples to every pixel
//! - Bucketed rendering on a dedicated rayon pool

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use glint_math::{Color, Interval, Ray};
use rand::RngCore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bucket::{generate_buckets, Bucket, BucketAccumulator, DEFAULT_BUCKET_SIZE};
use crate::error::RenderError;
use crate::progress::{Progress, RenderEvent};
use crate::sampling::work_rng;
use crate::{Camera, Hittable, PixelBuffer};

/// Lower bound of the hit interval; keeps scattered rays from re-hitting
/// the surface they left.
pub const HIT_EPSILON: f32 = 0.001;

/// What a ray sees when it escapes the scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Background {
    /// Vertical white-to-blue gradient.
    #[default]
    Sky,
    Solid(Color),
}

impl Background {
    pub fn color(&self, ray: &Ray) -> Color {
        match self {
            Background::Sky => sky_gradient(ray),
            Background::Solid(color) => *color,
        }
    }
}

/// Compute sky gradient background.
fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    Color::WHITE * (1.0 - a) + blue * a
}

/// Compute the color seen by a ray.
///
/// This is the core path tracing function. It traces the ray through
/// the scene, bouncing off surfaces and accumulating color. `depth` counts
/// down; a miss always sees the background, a hit with no bounces left
/// contributes nothing.
pub fn ray_color(
    ray: &Ray,
    world: &dyn Hittable,
    depth: u32,
    background: &Background,
    rng: &mut dyn RngCore,
) -> Color {
    let Some(rec) = world.hit(ray, Interval::new(HIT_EPSILON, f32::INFINITY)) else {
        return background.color(ray);
    };

    if depth == 0 {
        return Color::BLACK;
    }

    // Get emission from material (for lights)
    let emission = rec.material.emitted(rec.u, rec.v, rec.p);

    match rec.material.scatter(ray, &rec, rng) {
        Some(result) => {
            let scattered_color = ray_color(&result.scattered, world, depth - 1, background, rng);
            emission + result.attenuation * scattered_color
        }
        // Ray was absorbed - just return emission
        None => emission,
    }
}

/// Everything a render needs to know about what to draw.
pub struct Scene {
    pub camera: Camera,
    pub world: Box<dyn Hittable>,
    pub background: Background,
}

impl Scene {
    pub fn new(camera: Camera, world: Box<dyn Hittable>, background: Background) -> Self {
        Self { camera, world, background }
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel added by each progressive phase
    pub phases: Vec<u32>,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Size of the worker pool
    pub workers: usize,
    pub seed: u64,
    pub bucket_size: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            phases: vec![1, 99],
            max_depth: 50,
            workers: available_workers(),
            seed: 2017,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl RenderSettings {
    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_phases(mut self, phases: Vec<u32>) -> Self {
        self.phases = phases;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_bucket_size(mut self, bucket_size: u32) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Samples per pixel once every phase has run.
    pub fn total_samples(&self) -> u32 {
        self.phases.iter().sum()
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |msg: &str| Err(RenderError::InvalidSettings(msg.to_string()));

        if self.width == 0 || self.height == 0 {
            return invalid("image dimensions must be non-zero");
        }
        if self.phases.is_empty() {
            return invalid("at least one phase is required");
        }
        if self.phases.contains(&0) {
            return invalid("every phase must take at least one sample");
        }
        if self.phases.iter().try_fold(0u32, |acc, &n| acc.checked_add(n)).is_none() {
            return invalid("total sample count overflows");
        }
        if self.max_depth == 0 {
            return invalid("max depth must be at least 1");
        }
        if self.workers == 0 {
            return invalid("at least one worker is required");
        }
        if self.bucket_size == 0 {
            return invalid("bucket size must be non-zero");
        }
        Ok(())
    }
}

/// Summary of a finished render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
    pub phases: usize,
    /// Total samples per pixel
    pub samples_per_pixel: u32,
    pub buckets: usize,
    pub elapsed: Duration,
}

/// Result of a blocking [`Renderer::render`].
pub struct RenderOutput {
    pub buffer: Arc<PixelBuffer>,
    pub stats: RenderStats,
}

/// Progressive bucket renderer.
pub struct Renderer {
    scene: Arc<Scene>,
    settings: RenderSettings,
    buckets: Vec<Bucket>,
    buffer: Arc<PixelBuffer>,
    progress: Arc<Progress>,
}

impl Renderer {
    pub fn new(scene: Scene, settings: RenderSettings) -> Result<Self, RenderError> {
        settings.validate()?;

        let available = available_workers();
        if settings.workers > available {
            log::warn!(
                "Requested {} workers but only {} CPUs are available",
                settings.workers,
                available
            );
        }

        let buckets = generate_buckets(settings.width, settings.height, settings.bucket_size);
        let progress = Progress::new(buckets.len(), settings.phases.len());

        Ok(Self {
            scene: Arc::new(scene),
            buffer: Arc::new(PixelBuffer::new(settings.width, settings.height)),
            progress: Arc::new(progress),
            buckets,
            settings,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn buffer(&self) -> &Arc<PixelBuffer> {
        &self.buffer
    }

    pub fn progress(&self) -> &Arc<Progress> {
        &self.progress
    }

    /// Render every phase on the calling thread and return the image.
    pub fn render(self) -> Result<RenderOutput, RenderError> {
        let stats = self.run(None)?;
        Ok(RenderOutput {
            buffer: self.buffer,
            stats,
        })
    }

    /// Run the render on a background thread.
    pub fn spawn(self) -> RenderHandle {
        let (sender, events) = mpsc::channel();
        let buffer = Arc::clone(&self.buffer);
        let progress = Arc::clone(&self.progress);

        let thread = std::thread::spawn(move || {
            let stats = self.run(Some(&sender))?;
            // Receiver may already be gone
            let _ = sender.send(RenderEvent::Finished(stats.clone()));
            Ok(stats)
        });

        RenderHandle {
            buffer,
            progress,
            events,
            thread,
        }
    }

    fn run(&self, events: Option<&Sender<RenderEvent>>) -> Result<RenderStats, RenderError> {
        let settings = &self.settings;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.workers)
            .thread_name(|i| format!("glint-worker-{i}"))
            .build()?;

        log::info!(
            "Rendering {}x{} with phases {:?} on {} workers ({} buckets)",
            settings.width,
            settings.height,
            settings.phases,
            settings.workers,
            self.buckets.len()
        );

        let start = Instant::now();
        let mut tiles: Vec<BucketAccumulator> =
            self.buckets.iter().copied().map(BucketAccumulator::new).collect();
        let mut samples_per_pixel = 0;

        for (phase, &samples) in settings.phases.iter().enumerate() {
            let scene = self.scene.as_ref();
            let buffer = self.buffer.as_ref();
            let progress = self.progress.as_ref();

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                pool.install(|| {
                    tiles.par_iter_mut().for_each(|tile| {
                        let mut rng = work_rng(settings.seed, phase, tile.bucket().index);
                        tile.render_phase(scene, settings, samples, &mut rng);
                        tile.resolve(buffer);
                        progress.bucket_finished();
                        log::debug!("Phase {} bucket {} done", phase, tile.bucket().index);
                    })
                })
            }));

            if result.is_err() {
                log::error!("Render worker panicked during phase {}", phase);
                return Err(RenderError::WorkerPanicked);
            }

            samples_per_pixel += samples;
            self.progress.phase_finished();

            let elapsed = start.elapsed();
            log::info!(
                "Phase {} complete: {} spp in {:.2?}",
                phase,
                samples_per_pixel,
                elapsed
            );

            if let Some(sender) = events {
                let _ = sender.send(RenderEvent::PhaseComplete {
                    phase,
                    samples_per_pixel,
                    elapsed,
                });
            }
        }

        self.progress.mark_complete();

        Ok(RenderStats {
            phases: settings.phases.len(),
            samples_per_pixel,
            buckets: self.buckets.len(),
            elapsed: start.elapsed(),
        })
    }
}

/// Handle to a render running on a background thread.
pub struct RenderHandle {
    buffer: Arc<PixelBuffer>,
    progress: Arc<Progress>,
    events: Receiver<RenderEvent>,
    thread: JoinHandle<Result<RenderStats, RenderError>>,
}

impl RenderHandle {
    /// The buffer being rendered into; readable while the render runs.
    pub fn buffer(&self) -> &Arc<PixelBuffer> {
        &self.buffer
    }

    pub fn progress(&self) -> &Arc<Progress> {
        &self.progress
    }

    /// Next pending event, without blocking.
    pub fn try_event(&self) -> Option<RenderEvent> {
        self.events.try_recv().ok()
    }

    /// Blocking iterator over events; ends when the render thread exits.
    pub fn events(&self) -> impl Iterator<Item = RenderEvent> + '_ {
        self.events.iter()
    }

    /// True once the render thread has exited, successfully or not.
    pub fn is_complete(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn wait(self) -> Result<RenderStats, RenderError> {
        self.thread.join().map_err(|_| RenderError::WorkerPanicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraConfig, DiffuseLight, HitRecord, HittableList, Lambertian, Metal, Sphere};
    use glint_math::{Aabb, Point3, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sky_gradient() {
        // Ray pointing up should be more blue (less red than white)
        let up_ray = Ray::new_simple(Point3::ORIGIN, Vec3::Y);
        let up_color = Background::Sky.color(&up_ray);

        // Ray pointing down should be white
        let down_ray = Ray::new_simple(Point3::ORIGIN, -Vec3::Y);
        let down_color = Background::Sky.color(&down_ray);

        assert!((up_color.r - 0.5).abs() < 1e-6);
        assert!((up_color.b - 1.0).abs() < 1e-6);
        assert_eq!(down_color, Color::WHITE);
    }

    fn diffuse_floor() -> HittableList {
        let mut world = HittableList::new();
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, -100.5, 0.0), 100.0, Lambertian::new(Color::gray(0.5))).unwrap(),
        ));
        world
    }

    #[test]
    fn test_ray_color_miss_ignores_depth() {
        let world = HittableList::new();
        let ray = Ray::new_simple(Point3::ORIGIN, -Vec3::Z);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            ray_color(&ray, &world, 0, &Background::Sky, &mut rng),
            Background::Sky.color(&ray)
        );
    }

    #[test]
    fn test_ray_color_hit_with_depth_exhausted() {
        let world = diffuse_floor();
        let ray = Ray::new_simple(Point3::ORIGIN, -Vec3::Y);
        let mut rng = StdRng::seed_from_u64(0);

        let bg = Background::Solid(Color::WHITE);
        assert_eq!(ray_color(&ray, &world, 0, &bg, &mut rng), Color::BLACK);
    }

    #[test]
    fn test_ray_color_single_bounce_reaches_sky() {
        let world = diffuse_floor();
        let ray = Ray::new_simple(Point3::ORIGIN, -Vec3::Y);
        let bg = Background::Solid(Color::WHITE);

        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(ray_color(&ray, &world, 1, &bg, &mut rng), Color::gray(0.5));
        }
    }

    #[test]
    fn test_ray_color_miss_returns_background() {
        let world = HittableList::new();
        let ray = Ray::new_simple(Point3::ORIGIN, -Vec3::Z);
        let mut rng = StdRng::seed_from_u64(0);
        let bg = Background::Solid(Color::new(0.1, 0.2, 0.3));

        assert_eq!(ray_color(&ray, &world, 50, &bg, &mut rng), Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_ray_color_mirror_sees_light() {
        // Mirror facing the camera reflects straight back into a light behind it
        let mut world = HittableList::new();
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, 0.0, -2.0), 0.5, Metal::new(Color::gray(0.5), 0.0)).unwrap(),
        ));
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, 0.0, 3.0), 0.5, DiffuseLight::new(Color::WHITE)).unwrap(),
        ));

        let ray = Ray::new_simple(Point3::ORIGIN, -Vec3::Z);
        let mut rng = StdRng::seed_from_u64(0);
        let bg = Background::Solid(Color::BLACK);

        assert_eq!(ray_color(&ray, &world, 50, &bg, &mut rng), Color::gray(0.5));
        // One bounce is not enough to reach the light
        assert_eq!(ray_color(&ray, &world, 1, &bg, &mut rng), Color::BLACK);
    }

    #[test]
    fn test_settings_validation() {
        let settings = RenderSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.total_samples(), 100);

        let bad = [
            settings.clone().with_resolution(0, 10),
            settings.clone().with_phases(vec![]),
            settings.clone().with_phases(vec![1, 0]),
            settings.clone().with_phases(vec![u32::MAX, 1]),
            settings.clone().with_max_depth(0),
            settings.clone().with_workers(0),
            settings.clone().with_bucket_size(0),
        ];
        for case in bad {
            assert!(matches!(case.validate(), Err(RenderError::InvalidSettings(_))), "{case:?}");
        }
    }

    #[test]
    fn test_settings_json_fills_defaults() {
        let settings: RenderSettings =
            serde_json::from_str(r#"{ "width": 320, "height": 160, "phases": [4, 12] }"#).unwrap();

        assert_eq!(settings.width, 320);
        assert_eq!(settings.phases, vec![4, 12]);
        assert_eq!(settings.max_depth, 50);
        assert_eq!(settings.seed, 2017);
        assert_eq!(settings.bucket_size, DEFAULT_BUCKET_SIZE);

        let json = serde_json::to_string(&settings).unwrap();
        let back: RenderSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    fn small_settings() -> RenderSettings {
        RenderSettings::default()
            .with_resolution(24, 12)
            .with_phases(vec![2, 2])
            .with_max_depth(8)
            .with_bucket_size(8)
            .with_workers(2)
    }

    fn diffuse_scene(aspect: f32) -> Scene {
        let mut world = HittableList::new();
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, -100.5, -1.0), 100.0, Lambertian::new(Color::gray(0.5))).unwrap(),
        ));
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, 0.0, -1.0), 0.5, Lambertian::new(Color::new(0.8, 0.3, 0.3))).unwrap(),
        ));
        world.add(Box::new(
            Sphere::new(Point3::new(1.0, 0.0, -1.0), 0.5, Metal::new(Color::new(0.8, 0.6, 0.2), 0.3)).unwrap(),
        ));

        let camera = CameraConfig::new().with_aspect_ratio(aspect).build().unwrap();
        Scene::new(camera, Box::new(world), Background::Sky)
    }

    fn render_snapshot(settings: RenderSettings) -> Vec<u32> {
        let scene = diffuse_scene(settings.aspect_ratio());
        let output = Renderer::new(scene, settings).unwrap().render().unwrap();
        output.buffer.snapshot()
    }

    #[test]
    fn test_same_seed_same_image() {
        let a = render_snapshot(small_settings());
        let b = render_snapshot(small_settings());
        assert_eq!(a, b);
        assert!(a.iter().any(|&p| p != 0));

        let other = render_snapshot(small_settings().with_seed(7));
        assert_ne!(a, other);
    }

    #[test]
    fn test_worker_count_does_not_change_image() {
        let single = render_snapshot(small_settings().with_workers(1));
        let many = render_snapshot(small_settings().with_workers(4));
        assert_eq!(single, many);
    }

    #[test]
    fn test_single_colour_world_is_uniform() {
        let _ = env_logger::builder().is_test(true).try_init();

        let glow = Color::gray(0.25);
        let shell = Sphere::new(Point3::ORIGIN, 20.0, DiffuseLight::new(glow)).unwrap();
        let camera = CameraConfig::new().build().unwrap();
        let scene = Scene::new(camera, Box::new(shell), Background::Solid(Color::BLACK));

        let output = Renderer::new(scene, small_settings()).unwrap().render().unwrap();
        let expected = glow.gamma2().pixel_value();
        assert_eq!(expected, 0x007F_7F7F);
        assert!(output.buffer.snapshot().iter().all(|&p| p == expected));
    }

    #[test]
    fn test_single_sample_single_colour_world_is_uniform() {
        // One jittered sample per pixel still lands on the same colour everywhere
        let glow = Color::new(0.25, 0.5, 1.0);
        let shell = Sphere::new(Point3::ORIGIN, 20.0, DiffuseLight::new(glow)).unwrap();
        let camera = CameraConfig::new().build().unwrap();
        let scene = Scene::new(camera, Box::new(shell), Background::Sky);

        let settings = small_settings().with_phases(vec![1]);
        let output = Renderer::new(scene, settings).unwrap().render().unwrap();
        let expected = glow.gamma2().pixel_value();
        assert!(output.buffer.snapshot().iter().all(|&p| p == expected));
    }

    #[test]
    fn test_foreground_sphere_in_front_of_ground() {
        let mut world = HittableList::new();
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, -100.5, -1.0), 100.0, DiffuseLight::new(Color::new(0.0, 1.0, 0.0))).unwrap(),
        ));
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, 0.0, -1.0), 0.5, DiffuseLight::new(Color::new(1.0, 0.0, 0.0))).unwrap(),
        ));

        let settings = small_settings().with_resolution(21, 11);
        let camera = CameraConfig::new()
            .with_position(Point3::new(0.0, 0.0, 3.0), Point3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(45.0, 1.0)
            .with_aspect_ratio(settings.aspect_ratio())
            .build()
            .unwrap();
        let scene = Scene::new(camera, Box::new(world), Background::Solid(Color::BLACK));

        let output = Renderer::new(scene, settings).unwrap().render().unwrap();
        assert_eq!(output.buffer.get(10, 5), Some(0x00FF_0000));
        assert_eq!(output.buffer.get(0, 10), Some(0x0000_FF00));
        // Top of the frame looks past everything
        assert_eq!(output.buffer.get(0, 0), Some(0));
    }

    #[test]
    fn test_spawned_render_reports_accumulating_phases() {
        let settings = small_settings().with_phases(vec![1, 2, 3]);
        let scene = diffuse_scene(settings.aspect_ratio());
        let handle = Renderer::new(scene, settings).unwrap().spawn();

        let events: Vec<RenderEvent> = handle.events().collect();
        assert_eq!(events.len(), 4);

        let spp: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                RenderEvent::PhaseComplete { samples_per_pixel, .. } => Some(*samples_per_pixel),
                RenderEvent::Finished(_) => None,
            })
            .collect();
        assert_eq!(spp, vec![1, 3, 6]);

        assert!(handle.progress().is_complete());
        assert_eq!(handle.progress().fraction(), 1.0);

        let stats = handle.wait().unwrap();
        assert_eq!(stats.phases, 3);
        assert_eq!(stats.samples_per_pixel, 6);
        assert_eq!(stats.buckets, 6);
        assert!(matches!(events.last(), Some(RenderEvent::Finished(s)) if *s == stats));
    }

    struct Exploding;

    impl Hittable for Exploding {
        fn hit(&self, _ray: &Ray, _ray_t: Interval) -> Option<HitRecord<'_>> {
            panic!("intersection blew up");
        }

        fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
            None
        }
    }

    #[test]
    fn test_worker_panic_aborts_render() {
        let camera = CameraConfig::new().build().unwrap();
        let scene = Scene::new(camera, Box::new(Exploding), Background::Sky);

        let result = Renderer::new(scene, small_settings()).unwrap().render();
        assert!(matches!(result, Err(RenderError::WorkerPanicked)));
    }

    #[test]
    fn test_invalid_settings_rejected_up_front() {
        let scene = diffuse_scene(2.0);
        let result = Renderer::new(scene, small_settings().with_phases(vec![]));
        assert!(matches!(result, Err(RenderError::InvalidSettings(_))));
    }
}
