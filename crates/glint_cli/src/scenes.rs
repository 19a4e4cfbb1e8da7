//! Stock scenes selectable with `--scene`.
//!
//! Every random choice draws from the rng handed in, so a scene is fully
//! determined by the seed.

use std::sync::Arc;

use glint_math::{Color, Point3, Vec3};
use glint_renderer::{
    Background, Bvh, CameraConfig, CheckerTexture, Dielectric, Hittable, HittableList, Lambertian,
    Material, Metal, MovingSphere, NoiseTexture, Scene, SceneResult, Sphere,
};
use rand::rngs::StdRng;
use rand::Rng;

/// Upper bound on the number of spheres in the random scenes.
const MAX_SPHERES: usize = 500;

/// Build stock scene `id` for an image of the given aspect ratio.
///
/// Unknown ids fall back to scene 1.
pub fn build(id: u32, aspect: f32, rng: &mut StdRng) -> SceneResult<Scene> {
    match id {
        1 => {
            log::info!("Building scene 1: two spheres");
            two_spheres(aspect)
        }
        2 => {
            log::info!("Building scene 2: lambertian");
            lambertian(aspect)
        }
        3 => {
            log::info!("Building scene 3: dielectrics");
            dielectrics(aspect)
        }
        4 => {
            log::info!("Building scene 4: metal spheres");
            metal_spheres(aspect)
        }
        5 => {
            log::info!("Building scene 5: final random scene");
            random_spheres(aspect, rng)
        }
        6 => {
            log::info!("Building scene 6: bouncing spheres");
            bouncing_spheres(aspect, rng)
        }
        7 => {
            log::info!("Building scene 7: perlin spheres");
            perlin_spheres(aspect, rng)
        }
        other => {
            log::warn!("Unknown scene {}, building scene 1", other);
            two_spheres(aspect)
        }
    }
}

fn sphere(
    center: Point3,
    radius: f32,
    material: impl Material + 'static,
) -> SceneResult<Box<dyn Hittable>> {
    Ok(Box::new(Sphere::new(center, radius, material)?))
}

/// Large sphere standing in for the ground plane below `z = -1`.
fn ground(color: Color) -> SceneResult<Box<dyn Hittable>> {
    sphere(Point3::new(0.0, -100.5, -1.0), 100.0, Lambertian::new(color))
}

/// Close-up camera used by the small scenes.
fn close_camera(look_from: Point3, aspect: f32) -> CameraConfig {
    CameraConfig::new()
        .with_position(look_from, Point3::new(0.0, 0.0, -1.0), Vec3::Y)
        .with_lens(20.0, 1.0)
        .with_aspect_ratio(aspect)
}

/// Camera for the wide random scenes.
fn wide_camera(aspect: f32, aperture: f32) -> CameraConfig {
    CameraConfig::new()
        .with_position(Point3::new(13.0, 2.0, 3.0), Point3::ORIGIN, Vec3::Y)
        .with_lens(20.0, 10.0)
        .with_aperture(aperture)
        .with_aspect_ratio(aspect)
}

fn two_spheres(aspect: f32) -> SceneResult<Scene> {
    let mut world = HittableList::new();
    world.add(sphere(Point3::new(-0.5, 0.5, -1.0), 0.5, Lambertian::new(Color::new(0.1, 0.2, 0.5)))?);
    world.add(ground(Color::gray(0.5))?);

    let camera = close_camera(Point3::new(-2.0, 2.0, 5.0), aspect).build()?;
    Ok(Scene::new(camera, Box::new(world), Background::Sky))
}

fn lambertian(aspect: f32) -> SceneResult<Scene> {
    let mut world = HittableList::new();
    world.add(sphere(Point3::new(0.0, 0.0, -1.0), 0.5, Lambertian::new(Color::new(1.0, 0.0, 0.0)))?);
    world.add(ground(Color::new(0.0, 1.0, 0.0))?);

    let camera = close_camera(Point3::new(0.0, 0.0, 3.0), aspect).build()?;
    Ok(Scene::new(camera, Box::new(world), Background::Sky))
}

fn dielectrics(aspect: f32) -> SceneResult<Scene> {
    let mut world = HittableList::new();
    world.add(sphere(Point3::new(0.0, 0.0, -1.0), 0.5, Lambertian::new(Color::new(0.1, 0.2, 0.5)))?);
    world.add(ground(Color::new(0.8, 0.8, 0.0))?);
    world.add(sphere(Point3::new(1.0, 0.0, -1.0), 0.5, Metal::new(Color::new(0.8, 0.6, 0.2), 1.0))?);
    // Glass ball with a hollow core: the inner sphere has its normal flipped
    world.add(sphere(Point3::new(-1.0, 0.0, -1.0), 0.5, Dielectric::new(1.5))?);
    world.add(sphere(Point3::new(-1.0, 0.0, -1.0), -0.45, Dielectric::new(1.5))?);

    let camera = close_camera(Point3::new(-2.0, 2.0, 5.0), aspect).build()?;
    Ok(Scene::new(camera, Box::new(world), Background::Sky))
}

fn metal_spheres(aspect: f32) -> SceneResult<Scene> {
    let mut world = HittableList::new();
    world.add(sphere(Point3::new(0.0, 0.0, -1.0), 0.5, Lambertian::new(Color::new(0.8, 0.3, 0.3)))?);
    world.add(ground(Color::new(0.8, 0.8, 0.0))?);
    world.add(sphere(Point3::new(1.0, 0.0, -1.0), 0.5, Metal::new(Color::new(0.8, 0.6, 0.2), 1.0))?);
    world.add(sphere(Point3::new(-1.0, 0.0, -1.0), 0.5, Metal::new(Color::gray(0.8), 0.3))?);

    let camera = close_camera(Point3::new(0.0, 0.0, 3.0), aspect).build()?;
    Ok(Scene::new(camera, Box::new(world), Background::Sky))
}

/// Small random spheres scattered on a grid, plus the three large ones.
///
/// `small` builds one small sphere at a jittered grid position; it gets the
/// rng back so scenes can layer extra draws (motion) on top.
fn scatter_spheres(
    world: &mut HittableList,
    rng: &mut StdRng,
    mut small: impl FnMut(Point3, &mut StdRng) -> SceneResult<Box<dyn Hittable>>,
) -> SceneResult<()> {
    let avoid = Point3::new(4.0, 0.2, 0.0);

    'grid: for a in -11..11 {
        for b in -11..11 {
            if world.len() >= MAX_SPHERES - 3 {
                break 'grid;
            }

            let center = Point3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );
            if (center - avoid).length() > 0.9 {
                world.add(small(center, rng)?);
            }
        }
    }

    world.add(sphere(Point3::new(0.0, 1.0, 0.0), 1.0, Dielectric::new(1.5))?);
    world.add(sphere(Point3::new(-4.0, 1.0, 0.0), 1.0, Lambertian::new(Color::new(0.4, 0.2, 0.1)))?);
    world.add(sphere(Point3::new(4.0, 1.0, 0.0), 1.0, Metal::new(Color::new(0.7, 0.6, 0.5), 0.0))?);
    Ok(())
}

fn random_color(rng: &mut StdRng) -> Color {
    Color::new(rng.gen(), rng.gen(), rng.gen())
}

/// Small sphere with the usual 80/15/5 diffuse, metal, glass split.
fn random_small_sphere(center: Point3, rng: &mut StdRng) -> SceneResult<Box<dyn Hittable>> {
    let choose_material: f32 = rng.gen();

    if choose_material < 0.8 {
        let albedo = random_color(rng) * random_color(rng);
        sphere(center, 0.2, Lambertian::new(albedo))
    } else if choose_material < 0.95 {
        let albedo = Color::new(
            0.5 * (1.0 + rng.gen::<f32>()),
            0.5 * (1.0 + rng.gen::<f32>()),
            0.5 * (1.0 + rng.gen::<f32>()),
        );
        sphere(center, 0.2, Metal::new(albedo, 0.5 * rng.gen::<f32>()))
    } else {
        sphere(center, 0.2, Dielectric::new(1.5))
    }
}

fn random_spheres(aspect: f32, rng: &mut StdRng) -> SceneResult<Scene> {
    let mut world = HittableList::new();
    world.add(sphere(Point3::new(0.0, -1000.0, 0.0), 1000.0, Lambertian::new(Color::gray(0.5)))?);
    scatter_spheres(&mut world, rng, random_small_sphere)?;

    let camera = wide_camera(aspect, 0.1).build()?;
    let bvh = Bvh::from_list(world, 0.0, 1.0, rng)?;
    log::info!("Scene has {} spheres", bvh.len());
    Ok(Scene::new(camera, Box::new(bvh), Background::Sky))
}

fn bouncing_spheres(aspect: f32, rng: &mut StdRng) -> SceneResult<Scene> {
    let checker = CheckerTexture::from_colors(Color::new(0.2, 0.3, 0.1), Color::gray(0.9));

    let mut world = HittableList::new();
    world.add(sphere(
        Point3::new(0.0, -1000.0, 0.0),
        1000.0,
        Lambertian::textured(Arc::new(checker)),
    )?);

    scatter_spheres(&mut world, rng, |center, rng| {
        if rng.gen::<f32>() < 0.8 {
            // Diffuse spheres bounce upwards during the shutter
            let albedo = random_color(rng) * random_color(rng);
            let end = center + Vec3::new(0.0, 0.5 * rng.gen::<f32>(), 0.0);
            let mover = MovingSphere::new(center, end, 0.0, 1.0, 0.2, Lambertian::new(albedo))?;
            Ok(Box::new(mover) as Box<dyn Hittable>)
        } else {
            random_small_sphere(center, rng)
        }
    })?;

    let camera = wide_camera(aspect, 0.0).with_shutter(0.0, 1.0).build()?;
    let bvh = Bvh::from_list(world, 0.0, 1.0, rng)?;
    Ok(Scene::new(camera, Box::new(bvh), Background::Sky))
}

fn perlin_spheres(aspect: f32, rng: &mut StdRng) -> SceneResult<Scene> {
    let marble = Arc::new(NoiseTexture::new(4.0, rng));

    let mut world = HittableList::new();
    world.add(sphere(Point3::new(0.0, -1000.0, 0.0), 1000.0, Lambertian::textured(marble.clone()))?);
    world.add(sphere(Point3::new(0.0, 2.0, 0.0), 2.0, Lambertian::textured(marble))?);

    let camera = wide_camera(aspect, 0.0).build()?;
    Ok(Scene::new(camera, Box::new(world), Background::Sky))
}
