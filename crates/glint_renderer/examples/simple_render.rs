//! Simple path tracer example.
//!
//! Renders a small scene on a background thread, polls progress while it
//! runs and saves the result in PPM format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Duration;

use glint_renderer::{
    Background, Bvh, CameraConfig, Color, Dielectric, Hittable, Lambertian, Metal, PixelBuffer,
    Point3, RenderSettings, Renderer, Scene, Sphere, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let settings = RenderSettings::default()
        .with_resolution(400, 225)
        .with_phases(vec![4, 28])
        .with_max_depth(10);

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let camera = CameraConfig::new()
        .with_position(Point3::new(13.0, 2.0, 3.0), Point3::ORIGIN, Vec3::Y)
        .with_lens(20.0, 10.0)
        .with_aperture(0.6)
        .with_aspect_ratio(settings.aspect_ratio())
        .build()?;
    let world = build_world(&mut rng)?;
    let scene = Scene::new(camera, Box::new(world), Background::Sky);

    let handle = Renderer::new(scene, settings)?.spawn();
    while !handle.is_complete() {
        log::info!("{:.0}% done", handle.progress().fraction() * 100.0);
        std::thread::sleep(Duration::from_millis(250));
    }

    let buffer = handle.buffer().clone();
    let stats = handle.wait()?;
    log::info!("Rendered {} spp in {:.2?}", stats.samples_per_pixel, stats.elapsed);

    let filename = "output.ppm";
    save_ppm(&buffer, filename)?;
    log::info!("Saved to {}", filename);
    Ok(())
}

fn build_world(rng: &mut StdRng) -> Result<Bvh, glint_renderer::SceneError> {
    let mut objects: Vec<Box<dyn Hittable>> = vec![
        // Ground
        Box::new(Sphere::new(Point3::new(0.0, -1000.0, 0.0), 1000.0, Lambertian::new(Color::gray(0.5)))?),
        // Three main spheres
        Box::new(Sphere::new(Point3::new(0.0, 1.0, 0.0), 1.0, Dielectric::new(1.5))?),
        Box::new(Sphere::new(Point3::new(-4.0, 1.0, 0.0), 1.0, Lambertian::new(Color::new(0.4, 0.2, 0.1)))?),
        Box::new(Sphere::new(Point3::new(4.0, 1.0, 0.0), 1.0, Metal::new(Color::new(0.7, 0.6, 0.5), 0.0))?),
    ];

    for a in -5..5 {
        for b in -5..5 {
            let center = Point3::new(a as f32 + 0.9 * rng.gen::<f32>(), 0.2, b as f32 + 0.9 * rng.gen::<f32>());
            if (center - Point3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let albedo = Color::new(rng.gen(), rng.gen(), rng.gen());
            let object: Box<dyn Hittable> = match rng.gen::<f32>() {
                x if x < 0.8 => Box::new(Sphere::new(center, 0.2, Lambertian::new(albedo * albedo))?),
                x if x < 0.95 => Box::new(Sphere::new(center, 0.2, Metal::new(0.5 * (albedo + Color::WHITE), 0.2))?),
                _ => Box::new(Sphere::new(center, 0.2, Dielectric::new(1.5))?),
            };
            objects.push(object);
        }
    }

    log::info!("Created {} objects", objects.len());
    Bvh::new(objects, 0.0, 1.0, rng)
}

fn save_ppm(buffer: &PixelBuffer, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", buffer.width(), buffer.height())?;
    writeln!(writer, "255")?;

    for rgb in buffer.to_rgb8().chunks_exact(3) {
        writeln!(writer, "{} {} {}", rgb[0], rgb[1], rgb[2])?;
    }

    Ok(())
}
