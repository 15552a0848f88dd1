//! Marker tracker collaborators.
//!
//! A tracker turns a source (video or recording) into a [`FrameTable`]. The
//! analysis never depends on how the markers were found, only on this
//! interface.

/// Replay of previously recorded tracker output
pub mod recorded;

/// `OpenCV` ArUco video tracker
#[cfg(feature = "aruco")]
pub mod aruco;

use crate::{config::TrackerConfig, table::FrameTable, Error, Result};
use std::path::Path;

/// Trait for all marker trackers
pub trait Tracker: Send {
    /// Track markers in `source`, keeping one frame out of `frame_step + 1`
    fn track(&mut self, source: &Path, dictionary: &str, frame_step: usize) -> Result<FrameTable>;

    /// Get tracker name
    fn name(&self) -> &str;
}

/// Create a tracker by type name
///
/// # Errors
///
/// Returns [`Error::Tracker`] for an unknown name or one whose feature is
/// not compiled in.
pub fn create_tracker(tracker_type: &str, config: &TrackerConfig) -> Result<Box<dyn Tracker>> {
    match tracker_type.to_lowercase().as_str() {
        "recorded" | "csv" => Ok(Box::new(recorded::RecordedTracker::new(config.fps))),
        #[cfg(feature = "aruco")]
        "aruco" | "video" => Ok(Box::new(aruco::ArucoTracker::new(config.fps, config.rotate_clockwise))),
        #[cfg(not(feature = "aruco"))]
        "aruco" | "video" => Err(Error::Tracker(
            "Video tracking needs the 'aruco' feature".to_string(),
        )),
        _ => Err(Error::Tracker(format!("Unknown tracker type: {tracker_type}"))),
    }
}
