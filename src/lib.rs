//! Hip flexion trend extraction from tracked 2-D marker positions.
//!
//! Three markers are filmed during a hip flexion test: one on the tibia and
//! two on the hip. An external tracker reports where each marker was seen in
//! every processed frame. This library turns those noisy, anonymous
//! positions into a hip angle trend and a short summary.
//!
//! The analysis pipeline consists of:
//! 1. Role assignment: decide which marker is the tibia, the hip base and
//!    the hip test marker
//! 2. Detection validation: reject recordings with long hip dropouts
//! 3. Gap interpolation: repair short hip dropouts
//! 4. Calibration: read the resting hip tilt from the first frame
//! 5. Window isolation: the tibia marker disappears while the leg is raised,
//!    which marks the active part of the test
//! 6. Angle computation and summary
//!
//! # Examples
//!
//! ## Analyzing a Recording
//!
//! ```no_run
//! use trendetect::{
//!     pipeline::{PipelineParams, TrendPipeline},
//!     tracker::create_tracker,
//!     config::Config,
//! };
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut tracker = create_tracker("recorded", &config.tracker)?;
//! let pipeline = TrendPipeline::new(PipelineParams::default());
//!
//! let output = pipeline.process(
//!     tracker.as_mut(),
//!     Path::new("session_markers.csv"),
//!     &config.tracker.dictionary,
//!     config.tracker.frame_step,
//!     &mut |percent| println!("{percent}%"),
//! )?;
//!
//! println!("Offset: {:.2}°", output.offset);
//! println!("{}", output.summary);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running Individual Stages
//!
//! ```no_run
//! use trendetect::{
//!     angles::{compute_hip_angles, subtract_offset},
//!     calibration::compute_offset,
//!     interpolation::interpolate_missing,
//!     roles::label_table,
//!     summary::generate_summary,
//!     tracker::recorded::read_marker_csv,
//!     validation::validate_detection,
//!     windowing::crop_test_window,
//! };
//! use std::{fs::File, io::BufReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = read_marker_csv(BufReader::new(File::open("session_markers.csv")?), 30.0)?;
//!
//! let (assignment, labelled) = label_table(&table, 10)?;
//! println!("Tibia marker: {}", assignment.tibia);
//!
//! validate_detection(&labelled, 5)?;
//! let repaired = interpolate_missing(&labelled);
//! let offset = compute_offset(&repaired)?;
//! let segment = crop_test_window(&repaired, 5)?;
//!
//! let series = subtract_offset(&compute_hip_angles(&segment)?, offset);
//! let summary = generate_summary(&series)?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Analysis
//!
//! ```no_run
//! use trendetect::{
//!     pipeline::{join_analysis, spawn_analysis, TrendPipeline},
//!     tracker::recorded::RecordedTracker,
//! };
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (handle, progress) = spawn_analysis(
//!     TrendPipeline::default(),
//!     Box::new(RecordedTracker::new(30.0)),
//!     PathBuf::from("session_markers.csv"),
//!     "DICT_6X6_250".to_string(),
//!     3,
//! );
//!
//! for percent in progress {
//!     println!("Progress: {percent}%");
//! }
//! let output = join_analysis(handle)?;
//! trendetect::trend_io::save_trend(&output.series, "trend.csv")?;
//! # Ok(())
//! # }
//! ```

/// Frame tables before and after role relabelling
pub mod table;

/// Anatomical roles and the role assignment stage
pub mod roles;

/// Detection quality gate on hip channels
pub mod validation;

/// Gap repair for hip channels
pub mod interpolation;

/// Angle conventions between two marker positions
pub mod geometry;

/// Baseline tilt calibration
pub mod calibration;

/// Test window detection, collapsing and extraction
pub mod windowing;

/// Hip angle trend computation
pub mod angles;

/// Trend summary statistics
pub mod summary;

/// Trend series persistence
pub mod trend_io;

/// Marker tracker interface and implementations
pub mod tracker;

/// Stage orchestration and progress reporting
pub mod pipeline;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
