//! Hip flexion trend analysis command line tool.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use trendetect::{
    config::{Config, EXAMPLE_CONFIG},
    constants::{DEFAULT_MARKER_COUNT, DEFAULT_MARKER_SIZE},
    pipeline::{join_analysis, spawn_analysis, PipelineOutput, TrendPipeline},
    tracker::create_tracker,
    trend_io::save_trend,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze recorded tracker output (wide marker CSV)
    Analyze {
        /// Marker recording to analyze
        markers: PathBuf,

        /// Save the angle trend to this CSV file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Track markers in a video and analyze them
    Video {
        /// Video file to process
        path: PathBuf,

        /// Save the angle trend to this CSV file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Override the configured frame step
        #[arg(long)]
        frame_step: Option<usize>,
    },

    /// Print the summary of a saved angle trend
    Summarize {
        /// Trend CSV written by `analyze --save`
        trend: PathBuf,
    },

    /// Write printable ArUco markers as PNG images
    GenerateMarkers {
        /// Output directory
        dir: PathBuf,

        /// Number of markers, starting at id 0
        #[arg(long, default_value_t = DEFAULT_MARKER_COUNT)]
        count: u32,

        /// Side length of each image in pixels
        #[arg(long, default_value_t = DEFAULT_MARKER_SIZE)]
        size: i32,
    },

    /// Write an example configuration file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = load_config(args.config.as_deref());
    config.validate().context("Invalid configuration")?;

    match args.command {
        Command::Analyze { markers, save } => {
            let output = analyze(&config, "recorded", markers, config.tracker.frame_step)?;
            report(&output, save.as_deref())
        }
        Command::Video { path, save, frame_step } => {
            let step = frame_step.unwrap_or(config.tracker.frame_step);
            let output = analyze(&config, "aruco", path, step)?;
            report(&output, save.as_deref())
        }
        Command::Summarize { trend } => {
            let (series, summary) = TrendPipeline::summarize_saved(&trend)
                .with_context(|| format!("Failed to summarize {}", trend.display()))?;
            info!("Loaded {} samples", series.len());
            println!("{summary}");
            Ok(())
        }
        Command::GenerateMarkers { dir, count, size } => generate_markers(&config, &dir, count, size),
        Command::InitConfig { path } => {
            std::fs::write(&path, EXAMPLE_CONFIG)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote example configuration to {}", path.display());
            Ok(())
        }
    }
}

/// Load the configuration file, falling back to defaults
fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    info!("Loading configuration from: {}", path.display());
    match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config file: {}. Using defaults.", e);
            Config::default()
        }
    }
}

#[cfg(feature = "aruco")]
fn generate_markers(config: &Config, dir: &Path, count: u32, size: i32) -> Result<()> {
    let paths = trendetect::tracker::aruco::generate_markers(&config.tracker.dictionary, count, size, dir)
        .with_context(|| format!("Failed to generate markers in {}", dir.display()))?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(not(feature = "aruco"))]
fn generate_markers(_config: &Config, _dir: &Path, _count: u32, _size: i32) -> Result<()> {
    anyhow::bail!("Marker generation needs the 'aruco' feature")
}

/// Run the pipeline on a worker thread and log its progress
fn analyze(config: &Config, tracker_type: &str, source: PathBuf, frame_step: usize) -> Result<PipelineOutput> {
    let tracker = create_tracker(tracker_type, &config.tracker)?;
    let pipeline = TrendPipeline::new(config.pipeline_params());
    let (handle, progress) = spawn_analysis(
        pipeline,
        tracker,
        source.clone(),
        config.tracker.dictionary.clone(),
        frame_step,
    );

    for percent in progress {
        info!("Progress: {}%", percent);
    }

    join_analysis(handle).with_context(|| format!("Analysis of {} failed", source.display()))
}

fn report(output: &PipelineOutput, save: Option<&Path>) -> Result<()> {
    println!(
        "Roles: tibia={} hip_base={} hip_test={}",
        output.assignment.tibia, output.assignment.hip_base, output.assignment.hip_test
    );
    println!("Calibration offset: {:.2}°", output.offset);
    println!(
        "Test window: {:.2}s to {:.2}s ({} samples)",
        output.window.start_time,
        output.window.end_time,
        output.series.len()
    );
    println!("{}", output.summary);

    if let Some(path) = save {
        save_trend(&output.series, path).with_context(|| format!("Failed to save {}", path.display()))?;
        info!("Trend saved to {}", path.display());
    }
    Ok(())
}
