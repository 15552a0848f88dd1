//! Configuration management for the trend detection pipeline

use crate::{
    constants::{
        DEFAULT_DICTIONARY, DEFAULT_FPS, DEFAULT_FRAME_STEP, DEFAULT_MAX_ALLOWED_GAP, DEFAULT_MIN_WINDOW_LEN,
        DEFAULT_ROLE_FRAMES,
    },
    pipeline::PipelineParams,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tracker configuration
    pub tracker: TrackerConfig,

    /// Role assignment configuration
    pub roles: RolesConfig,

    /// Detection validation configuration
    pub validation: ValidationConfig,

    /// Test window configuration
    pub window: WindowConfig,
}

/// Marker tracker parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Predefined ArUco dictionary name
    pub dictionary: String,

    /// Frames skipped between tracked frames
    pub frame_step: usize,

    /// Frame rate used when the source does not report one
    pub fps: f64,

    /// Rotate frames to portrait before detection
    pub rotate_clockwise: bool,
}

/// Role assignment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Number of opening frames inspected
    pub n_frames: usize,
}

/// Detection validation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Longest tolerated run of missing hip samples
    pub max_allowed_gap: usize,
}

/// Test window parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Undetected runs shorter than this many frames are noise
    pub min_len: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dictionary: DEFAULT_DICTIONARY.to_string(),
            frame_step: DEFAULT_FRAME_STEP,
            fps: DEFAULT_FPS,
            rotate_clockwise: true,
        }
    }
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            n_frames: DEFAULT_ROLE_FRAMES,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_allowed_gap: DEFAULT_MAX_ALLOWED_GAP,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_WINDOW_LEN,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the text is not valid configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Pipeline parameters derived from this configuration
    #[must_use]
    pub fn pipeline_params(&self) -> PipelineParams {
        PipelineParams {
            n_frames: self.roles.n_frames,
            max_allowed_gap: self.validation.max_allowed_gap,
            min_window_len: self.window.min_len,
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.roles.n_frames == 0 {
            return Err(Error::ConfigError(
                "Role assignment frame count must be greater than 0".to_string(),
            ));
        }
        if self.window.min_len == 0 {
            return Err(Error::ConfigError(
                "Minimum window length must be greater than 0".to_string(),
            ));
        }
        if !(self.tracker.fps.is_finite() && self.tracker.fps > 0.0) {
            return Err(Error::ConfigError("Frame rate must be positive".to_string()));
        }
        if self.tracker.dictionary.trim().is_empty() {
            return Err(Error::ConfigError("Marker dictionary must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Hip trend detection configuration

# Marker tracking
tracker:
  dictionary: "DICT_6X6_250"
  frame_step: 3
  fps: 30.0
  rotate_clockwise: true

# Role assignment
roles:
  n_frames: 10

# Detection quality gate
validation:
  max_allowed_gap: 5

# Test window isolation
window:
  min_len: 5
"#;
