//! Constants used throughout the pipeline

/// Number of markers the role assignment needs (tibia, hip base, hip test)
pub const REQUIRED_MARKERS: usize = 3;

/// Frames inspected when assigning roles
pub const DEFAULT_ROLE_FRAMES: usize = 10;

/// Longest tolerated run of missing hip samples
pub const DEFAULT_MAX_ALLOWED_GAP: usize = 5;

/// Undetected runs shorter than this many frames are detector noise
pub const DEFAULT_MIN_WINDOW_LEN: usize = 5;

/// Frames skipped between two tracked frames
pub const DEFAULT_FRAME_STEP: usize = 3;

/// Frame rate used when the video source does not report one
pub const DEFAULT_FPS: f64 = 30.0;

/// Predefined ArUco dictionary used by the printed markers
pub const DEFAULT_DICTIONARY: &str = "DICT_6X6_250";

/// Markers printed for one session (tibia, hip base, hip test, spare)
pub const DEFAULT_MARKER_COUNT: u32 = 4;

/// Side length of a generated marker image in pixels
pub const DEFAULT_MARKER_SIZE: i32 = 400;

/// Progress milestones reported to the caller
pub mod progress {
    pub const TRACKING_STARTED: u8 = 10;
    pub const ROLES_ASSIGNED: u8 = 25;
    pub const VALIDATED: u8 = 40;
    pub const INTERPOLATED: u8 = 55;
    pub const WINDOW_CROPPED: u8 = 70;
    pub const ANGLES_COMPUTED: u8 = 85;
    pub const SUMMARY_BUILT: u8 = 95;
    pub const DONE: u8 = 100;
}

/// Column header of the persisted time axis
pub const TIME_COLUMN: &str = "time";

/// Column header of the persisted angle series
pub const ANGLE_COLUMN: &str = "hip_angle";

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
