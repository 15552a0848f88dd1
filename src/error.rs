//! Error types for the trend detection library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Role assignment could not find enough markers in the initial frames
    #[error("Insufficient markers: need {required} with a valid position in the first {frames} frames, found {found}")]
    InsufficientMarkers {
        /// Number of markers the role assignment needs
        required: usize,
        /// Number of markers with a valid position
        found: usize,
        /// Size of the frame window inspected
        frames: usize,
    },

    /// A hip channel has a detection gap longer than allowed
    #[error("Insufficient detection: channel {channel} is missing for {longest_gap} consecutive frames (max {max_allowed_gap})")]
    InsufficientDetection {
        /// Column name of the failing channel
        channel: String,
        /// Longest run of consecutive missing values
        longest_gap: usize,
        /// Configured tolerance
        max_allowed_gap: usize,
    },

    /// No undetected run of the reference marker survived collapsing
    #[error("No test window found: the reference marker never drops out long enough")]
    NoTestWindow,

    /// Zero horizontal separation between the hip markers
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// `OpenCV` operation failed
    #[cfg(feature = "aruco")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line in a CSV input
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// One-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tracker collaborator failed
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// Analysis worker thread panicked
    #[error("Analysis worker panicked: {0}")]
    Worker(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Build a parse error for a given one-based line
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
