//! Test window isolation from the reference marker's presence signal.
//!
//! The tibia marker leaves the camera's view while the leg is raised, so the
//! active phase of the test shows up as a run of frames where `tibia_x` is
//! missing. Detection is noisy: short dropouts happen at rest too. The
//! window logic therefore runs in three steps:
//!
//! 1. [`detect_windows`] run-length encodes the missing/present signal.
//! 2. [`collapse_windows`] removes short undetected runs and merges
//!    neighbours that end up sharing a state.
//! 3. [`extract_test_segment`] crops the table to the first surviving
//!    undetected run.

use crate::{roles::Channel, table::RoleFrameTable, Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Start of a run of constant detection state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateWindow {
    /// Row position in the table where the run starts
    pub index: usize,
    /// Timestamp of that row
    pub time: f64,
    /// `true` while the reference marker is not detected
    pub undetected: bool,
}

/// Inclusive row range of the active test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestWindow {
    pub start: usize,
    pub end: usize,
    pub start_time: f64,
    pub end_time: f64,
}

/// Emit a window at the first row and at every change of the reference state
#[must_use]
pub fn detect_windows(table: &RoleFrameTable) -> Vec<StateWindow> {
    let mut windows = Vec::new();
    let mut previous: Option<bool> = None;
    for (index, row) in table.rows().iter().enumerate() {
        let undetected = row.get(Channel::REFERENCE).is_none();
        if previous != Some(undetected) {
            windows.push(StateWindow {
                index,
                time: row.time,
                undetected,
            });
        }
        previous = Some(undetected);
    }
    debug!("Detected {} state changes on {}", windows.len(), Channel::REFERENCE);
    windows
}

/// What the scan does with the entry under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Keep the entry, merging it into the last kept one if states match
    Keep,
    /// Drop the entry (a short undetected run) and its closing boundary
    DropWithBoundary,
}

/// Kept windows plus the merge rule applied on every push
#[derive(Debug, Default)]
struct Collapsed {
    kept: Vec<StateWindow>,
}

impl Collapsed {
    fn last_state(&self) -> Option<bool> {
        self.kept.last().map(|w| w.undetected)
    }

    /// Same state as the last kept entry replaces it, otherwise append
    fn push(&mut self, window: StateWindow) {
        match self.kept.last_mut() {
            Some(last) if last.undetected == window.undetected => *last = window,
            _ => self.kept.push(window),
        }
    }
}

/// Remove undetected runs shorter than `min_len` rows and merge neighbours
///
/// Single left-to-right pass. Each entry is classified by the length of its
/// run (distance to the following entry). A short undetected run is dropped
/// together with the boundary that closes it, which joins the detected runs
/// around it. The final entry has no measurable length and is only appended
/// when its state differs from the last kept one. The output alternates
/// strictly and collapsing it again changes nothing.
#[must_use]
pub fn collapse_windows(windows: &[StateWindow], min_len: usize) -> Vec<StateWindow> {
    let mut collapsed = Collapsed::default();
    let mut cursor = 0;

    while cursor + 1 < windows.len() {
        let current = windows[cursor];
        let run_len = windows[cursor + 1].index - current.index;
        let step = if current.undetected && run_len < min_len {
            Step::DropWithBoundary
        } else {
            Step::Keep
        };
        match step {
            Step::DropWithBoundary => cursor += 2,
            Step::Keep => {
                collapsed.push(current);
                cursor += 1;
            }
        }
    }

    if let Some(&last) = windows.get(cursor) {
        if collapsed.last_state() != Some(last.undetected) {
            collapsed.kept.push(last);
        }
    }

    debug!(
        "Collapsed {} windows into {} (min_len = {})",
        windows.len(),
        collapsed.kept.len(),
        min_len
    );
    collapsed.kept
}

/// Locate the first undetected window and where it ends
///
/// # Errors
///
/// Returns [`Error::NoTestWindow`] if no undetected window exists.
pub fn locate_test_window(table: &RoleFrameTable, windows: &[StateWindow]) -> Result<TestWindow> {
    let position = windows
        .iter()
        .position(|w| w.undetected)
        .ok_or(Error::NoTestWindow)?;
    let start = windows[position];
    let last_row = table.len().checked_sub(1).ok_or(Error::NoTestWindow)?;
    let end = windows.get(position + 1).map_or(last_row, |w| w.index).min(last_row);
    let time_at = |i: usize| table.rows().get(i).map_or(start.time, |r| r.time);

    Ok(TestWindow {
        start: start.index,
        end,
        start_time: start.time,
        end_time: time_at(end),
    })
}

/// Crop the table to the first undetected window, both ends inclusive
///
/// Later qualifying windows are ignored; one test per recording.
///
/// # Errors
///
/// Returns [`Error::NoTestWindow`] if no undetected window exists.
pub fn extract_test_segment(table: &RoleFrameTable, windows: &[StateWindow]) -> Result<RoleFrameTable> {
    let window = locate_test_window(table, windows)?;
    info!(
        "Test window: rows {}..={} ({:.2}s to {:.2}s)",
        window.start, window.end, window.start_time, window.end_time
    );
    Ok(table.slice_inclusive(window.start, window.end))
}

/// Detect, collapse and crop in one call
///
/// # Errors
///
/// Returns [`Error::NoTestWindow`] if no undetected run survives collapsing.
pub fn crop_test_window(table: &RoleFrameTable, min_len: usize) -> Result<RoleFrameTable> {
    let windows = collapse_windows(&detect_windows(table), min_len);
    extract_test_segment(table, &windows)
}
