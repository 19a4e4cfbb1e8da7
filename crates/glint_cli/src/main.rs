//! Glint - progressive CPU path tracer
//!
//! Builds one of the stock scenes, renders it phase by phase and writes
//! the image to a PNG file.

mod scenes;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use glint_renderer::{PixelBuffer, RenderEvent, RenderSettings, Renderer};
use image::{ImageFormat, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(version, about, disable_help_flag = true)]
struct Args {
    /// Width in pixels [default: 800]
    #[arg(short = 'w', long = "width")]
    width: Option<u32>,

    /// Height in pixels [default: 400]
    #[arg(short = 'h', long = "height")]
    height: Option<u32>,

    /// Number of render threads [default: all CPUs]
    #[arg(long = "cpu")]
    cpu: Option<usize>,

    /// Seed for scene generation and sampling [default: 2017]
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Rays per pixel for each phase; comma separated or repeated [default: 1,99]
    #[arg(short = 'r', long = "rays", value_delimiter = ',')]
    rays: Vec<u32>,

    /// Stock scene to build (1-7)
    #[arg(long = "scene", default_value_t = 1)]
    scene: u32,

    /// Maximum bounces per path [default: 50]
    #[arg(long = "max-depth")]
    max_depth: Option<u32>,

    /// JSON file with render settings; other flags override it
    #[arg(long = "settings")]
    settings: Option<PathBuf>,

    /// PNG file to write (not saved if omitted)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    #[arg(long = "help", action = ArgAction::Help)]
    help: Option<bool>,
}

impl Args {
    /// Settings from `--settings` (or defaults) with flags applied on top.
    fn render_settings(&self) -> Result<RenderSettings> {
        let mut settings = match &self.settings {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings from {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse settings in {}", path.display()))?
            }
            None => RenderSettings::default(),
        };

        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(cpu) = self.cpu {
            settings.workers = cpu;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
        if !self.rays.is_empty() {
            settings.phases = self.rays.clone();
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn save_png(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let image = RgbImage::from_raw(buffer.width(), buffer.height(), buffer.to_rgb8())
        .context("Pixel buffer does not match image dimensions")?;
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let settings = args.render_settings()?;

    log::info!("Starting Glint");

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let scene = scenes::build(args.scene, settings.aspect_ratio(), &mut rng)?;

    let phase_count = settings.phases.len();
    let handle = Renderer::new(scene, settings)?.spawn();

    for event in handle.events() {
        match event {
            RenderEvent::PhaseComplete {
                phase,
                samples_per_pixel,
                elapsed,
            } => {
                log::info!(
                    "Phase {}/{} done: {} rays per pixel after {:.2?}",
                    phase + 1,
                    phase_count,
                    samples_per_pixel,
                    elapsed
                );

                // Partial image; the last phase is written once the render thread exits
                if let Some(path) = &args.output {
                    if phase + 1 < phase_count {
                        save_png(handle.buffer(), path)?;
                    }
                }
            }
            RenderEvent::Finished(stats) => {
                log::info!(
                    "Render finished: {} phases, {} buckets, {:.2?}",
                    stats.phases,
                    stats.buckets,
                    stats.elapsed
                );
            }
        }
    }

    let buffer = handle.buffer().clone();
    handle.wait()?;

    if let Some(path) = &args.output {
        save_png(&buffer, path)?;
        log::info!("Image saved to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults_match_render_settings() {
        let args = Args::try_parse_from(["glint"]).unwrap();
        assert_eq!(args.scene, 1);

        let settings = args.render_settings().unwrap();
        assert_eq!(settings, RenderSettings::default());
        assert_eq!((settings.width, settings.height), (800, 400));
        assert_eq!(settings.phases, vec![1, 99]);
        assert_eq!(settings.seed, 2017);
    }

    #[test]
    fn test_rays_accept_lists_and_repeats() {
        let args = Args::try_parse_from(["glint", "-r", "1,10", "-r", "50", "-h", "200", "--cpu", "2"]).unwrap();
        let settings = args.render_settings().unwrap();

        assert_eq!(settings.phases, vec![1, 10, 50]);
        assert_eq!(settings.height, 200);
        assert_eq!(settings.workers, 2);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let args = Args::try_parse_from(["glint", "-w", "0"]).unwrap();
        assert!(args.render_settings().is_err());
    }

    #[test]
    fn test_settings_file_then_flags() {
        let path = std::env::temp_dir().join(format!("glint-settings-{}.json", std::process::id()));
        fs::write(&path, r#"{ "width": 64, "height": 32, "seed": 9, "phases": [2] }"#).unwrap();

        let args = Args::try_parse_from([
            "glint",
            "--settings",
            path.to_str().unwrap(),
            "--seed",
            "11",
        ])
        .unwrap();
        let settings = args.render_settings().unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!((settings.width, settings.height), (64, 32));
        assert_eq!(settings.phases, vec![2]);
        assert_eq!(settings.seed, 11);
    }

    #[test]
    fn test_png_written_from_buffer() {
        let buffer = PixelBuffer::new(4, 2);
        let path = std::env::temp_dir().join(format!("glint-test-{}.png", std::process::id()));

        save_png(&buffer, &path).unwrap();
        let decoded = image::open(&path).unwrap().to_rgb8();
        fs::remove_file(&path).unwrap();

        assert_eq!(decoded.dimensions(), (4, 2));
        assert!(decoded.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
