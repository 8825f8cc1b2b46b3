use std::fs::{self, File};
use std::process;

use anyhow::{Context, Result, bail};
use log::{info, warn};

use heartfield::{
    config::HeartfieldConfig,
    engine::{AnimationDriver, SurfaceDimensions},
    player::{Player, random_source},
    renderer::{RasterCanvas, Renderer},
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const PLAY_USAGE: &str = "heartfield play [config.json]";
const RECORD_USAGE: &str = "heartfield record <frames> <output.json> [config.json]";

/// Terminal size assumed for recordings.
const RECORD_COLS: u16 = 80;
const RECORD_ROWS: u16 = 24;

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        None => play(None),
        Some("play") => play(args.next().as_deref()),
        Some("record") => {
            let frames = args.next().context(RECORD_USAGE)?;
            let frames: usize = frames
                .parse()
                .with_context(|| format!("Invalid frame count {frames:?}"))?;
            let output_path = args.next().context(RECORD_USAGE)?;
            record(frames, &output_path, args.next().as_deref())
        }
        _ => bail!(
            "heartfield — hearts in your terminal\n\nUsage:\n  {PLAY_USAGE}\n  {RECORD_USAGE}"
        ),
    }
}

fn init_logging(config: &HeartfieldConfig) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = &config.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Load the config, start logging, then report anything the loader skipped.
fn load_config(config_path: Option<&str>) -> Result<HeartfieldConfig> {
    let (config, warning) = HeartfieldConfig::load(config_path)?;
    init_logging(&config)?;
    if let Some(warning) = warning {
        warn!("{warning}");
    }
    Ok(config)
}

fn play(config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    let summary = Player::new(config).play()?;
    info!("played {} frames", summary.frames);
    Ok(())
}

fn record(frames: usize, output_path: &str, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    let mut canvas = RasterCanvas::for_terminal(
        RECORD_COLS,
        RECORD_ROWS,
        config.pixel_size,
        config.background,
    );
    let (w, h) = canvas.surface_size();
    let mut driver = AnimationDriver::initialize(
        config.population,
        config.emitter.clone(),
        SurfaceDimensions::new(w, h),
        random_source(config.seed),
    )?;

    let recording = Renderer::record(&mut driver, &mut canvas, frames);
    let output_json = serde_json::to_string_pretty(&recording)?;
    fs::write(output_path, &output_json)
        .with_context(|| format!("Failed to write {output_path}"))?;

    eprintln!(
        "Recorded {} frames ({}x{} cells) -> {}",
        recording.frames.len(),
        recording.contract.width,
        recording.contract.height,
        output_path,
    );
    Ok(())
}
