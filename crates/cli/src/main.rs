use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use smile_tracker_core::capture::infrastructure::image_sequence_source::ImageSequenceSource;
use smile_tracker_core::detection::infrastructure::cascade_loader::{load_cascades, CascadePaths};
use smile_tracker_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use smile_tracker_core::pipeline::tracker_config::TrackerConfig;
use smile_tracker_core::pipeline::tracking_pipeline::FaceTracker;
use smile_tracker_core::rendering::domain::overlay_renderer::OverlayRenderer;
use smile_tracker_core::rendering::infrastructure::cpu_overlay_renderer::CpuOverlayRenderer;
use smile_tracker_core::shared::frame::Frame;

/// Face, smile and eye tracking over a sequence of captured frames.
///
/// Every role loads a SeetaFace funnel model. Published models of that kind
/// exist for frontal faces only; the smile and eye models must be trained in
/// the same format.
#[derive(Parser)]
#[command(name = "smile-tracker")]
struct Cli {
    /// Directory of captured frames (processed in file name order).
    frames: PathBuf,

    /// Write overlay images to this directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON config file (defaults to the user config directory if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the default cascade model files.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Face cascade model (overrides --assets).
    #[arg(long)]
    face: Option<PathBuf>,

    /// Smile cascade model in SeetaFace format (overrides --assets).
    #[arg(long)]
    smile: Option<PathBuf>,

    /// Left-eye cascade model in SeetaFace format (overrides --assets).
    #[arg(long)]
    left_eye: Option<PathBuf>,

    /// Right-eye cascade model in SeetaFace format (overrides --assets).
    #[arg(long)]
    right_eye: Option<PathBuf>,

    /// Consecutive smile frames that must be exceeded to report smiling.
    #[arg(long)]
    threshold: Option<u32>,

    /// Downscale factor for the analysis image.
    #[arg(long)]
    calc_scale: Option<u32>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let cascades = load_cascades(&config.cascades, &config.tuning)?;
    let source = ImageSequenceSource::open(&cli.frames, config.frame_size())?;
    let total = source.len();

    let mut tracker = FaceTracker::new(&config, cascades, Box::new(source))?
        .with_logger(Box::new(StdoutPipelineLogger::default()));
    let renderer = CpuOverlayRenderer::new();

    if let Some(dir) = &cli.output {
        std::fs::create_dir_all(dir)?;
    }

    let mut processed = 0;
    while tracker.update()? {
        processed += 1;
        let store = tracker.store();
        let cursor = store.head_cursor();
        log::debug!(
            "Frame {processed}/{total}: {} faces, smiling={}, cursor=({:.0}, {:.0})",
            store.faces().len(),
            store.is_smiling(),
            cursor.x,
            cursor.y
        );
        eprint!("\rTracking frame {processed}/{total}");

        if let Some(dir) = &cli.output {
            let overlay = renderer.render(store)?;
            write_overlay(dir, processed - 1, &overlay)?;
        }
    }
    eprintln!();

    tracker.logger().summary();
    if let Some(dir) = &cli.output {
        log::info!("Overlays written to {}", dir.display());
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<TrackerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => TrackerConfig::load(path)?,
        None => match TrackerConfig::default_path().filter(|p| p.exists()) {
            Some(path) => {
                log::info!("Using config {}", path.display());
                TrackerConfig::load(&path)?
            }
            None => TrackerConfig::default(),
        },
    };

    if let Some(dir) = &cli.assets {
        config.cascades = CascadePaths::in_dir(dir);
    }
    if let Some(path) = &cli.face {
        config.cascades.face = path.clone();
    }
    if let Some(path) = &cli.smile {
        config.cascades.smile = path.clone();
    }
    if let Some(path) = &cli.left_eye {
        config.cascades.left_eye = path.clone();
    }
    if let Some(path) = &cli.right_eye {
        config.cascades.right_eye = path.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.smiling_threshold = threshold;
    }
    if let Some(scale) = cli.calc_scale {
        config.calc_scale = scale;
    }

    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.frames.is_dir() {
        return Err(format!("Frames directory not found: {}", cli.frames.display()).into());
    }
    if let Some(dir) = &cli.assets {
        if !dir.is_dir() {
            return Err(format!("Assets directory not found: {}", dir.display()).into());
        }
    }
    if cli.calc_scale == Some(0) {
        return Err("Calc scale must be at least 1".into());
    }
    Ok(())
}

fn write_overlay(
    dir: &Path,
    index: usize,
    frame: &Frame,
) -> Result<(), Box<dyn std::error::Error>> {
    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or("Failed to create image from overlay data")?;
    img.save(dir.join(format!("{index:06}.png")))?;
    Ok(())
}
