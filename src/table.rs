//! Frame tables produced by the tracker and consumed by the analysis stages.
//!
//! A [`FrameTable`] holds raw observations keyed by opaque marker ids. Once
//! roles are assigned it is projected into a [`RoleFrameTable`], which stores
//! one optional value per role coordinate channel and is what every later
//! stage operates on.

use crate::{
    roles::{Channel, MarkerRole},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Opaque marker identifier as reported by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerId(pub u32);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id_{}", self.0)
    }
}

/// 2-D image position in pixels (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One marker seen in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub marker: MarkerId,
    pub position: Point2,
}

/// A tracked frame: source index, timestamp and whatever markers were detected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Index of the frame in the source video
    pub index: usize,
    /// Seconds since the start of the video
    pub time: f64,
    /// Detected markers, possibly none
    pub observations: Vec<Observation>,
}

impl Frame {
    /// Create a frame with no detections
    #[must_use]
    pub fn empty(index: usize, time: f64) -> Self {
        Self {
            index,
            time,
            observations: Vec::new(),
        }
    }

    /// Add an observation, builder style
    #[must_use]
    pub fn with(mut self, marker: MarkerId, x: f64, y: f64) -> Self {
        self.observations.push(Observation {
            marker,
            position: Point2::new(x, y),
        });
        self
    }

    /// Position of a marker in this frame, if detected
    #[must_use]
    pub fn position_of(&self, marker: MarkerId) -> Option<Point2> {
        self.observations
            .iter()
            .find(|o| o.marker == marker)
            .map(|o| o.position)
    }
}

/// Per-frame positions of a single marker, aligned with the table rows
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTrack {
    pub marker: MarkerId,
    pub positions: Vec<Option<Point2>>,
}

impl MarkerTrack {
    /// First valid position within the first `n` rows
    #[must_use]
    pub fn first_valid_within(&self, n: usize) -> Option<Point2> {
        self.positions.iter().take(n).find_map(|p| *p)
    }
}

/// Ordered sequence of tracked frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTable {
    frames: Vec<Frame>,
}

impl FrameTable {
    /// Build a table, checking that frames are ordered
    ///
    /// # Errors
    ///
    /// Returns an error if source indices or timestamps do not strictly
    /// increase, or if a timestamp or coordinate is not finite.
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        for (row, pair) in frames.windows(2).enumerate() {
            if pair[1].index <= pair[0].index || pair[1].time <= pair[0].time {
                return Err(Error::InvalidInput(format!(
                    "Frames out of order at row {}: index {} / time {} follows index {} / time {}",
                    row + 1,
                    pair[1].index,
                    pair[1].time,
                    pair[0].index,
                    pair[0].time
                )));
            }
        }
        for frame in &frames {
            if !frame.time.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "Non-finite timestamp in frame {}",
                    frame.index
                )));
            }
            if frame
                .observations
                .iter()
                .any(|o| !o.position.x.is_finite() || !o.position.y.is_finite())
            {
                return Err(Error::InvalidInput(format!(
                    "Non-finite marker position in frame {}",
                    frame.index
                )));
            }
        }
        Ok(Self { frames })
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Every marker id observed anywhere in the table, in ascending order
    #[must_use]
    pub fn marker_ids(&self) -> BTreeSet<MarkerId> {
        self.frames
            .iter()
            .flat_map(|f| f.observations.iter().map(|o| o.marker))
            .collect()
    }

    /// Track of one marker across all rows
    #[must_use]
    pub fn track(&self, marker: MarkerId) -> MarkerTrack {
        MarkerTrack {
            marker,
            positions: self.frames.iter().map(|f| f.position_of(marker)).collect(),
        }
    }

    /// Rewrite marker ids to role channels, dropping unmapped markers
    #[must_use]
    pub fn project(&self, mapping: &BTreeMap<MarkerId, MarkerRole>) -> RoleFrameTable {
        let frames = self
            .frames
            .iter()
            .map(|frame| {
                let mut row = RoleFrame::empty(frame.index, frame.time);
                for obs in &frame.observations {
                    if let Some(&role) = mapping.get(&obs.marker) {
                        row.values[Channel::x(role).slot()] = Some(obs.position.x);
                        row.values[Channel::y(role).slot()] = Some(obs.position.y);
                    }
                }
                row
            })
            .collect();
        RoleFrameTable { frames }
    }
}

/// One row of a role-labelled table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleFrame {
    /// Index of the frame in the source video
    pub source_index: usize,
    /// Seconds since the start of the video
    pub time: f64,
    values: [Option<f64>; Channel::COUNT],
}

impl RoleFrame {
    #[must_use]
    pub fn empty(source_index: usize, time: f64) -> Self {
        Self {
            source_index,
            time,
            values: [None; Channel::COUNT],
        }
    }

    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.values[channel.slot()]
    }

    /// Copy of this row with one channel replaced
    #[must_use]
    pub fn with(mut self, channel: Channel, value: Option<f64>) -> Self {
        self.values[channel.slot()] = value;
        self
    }

    /// Position of a role, present only when both coordinates are
    #[must_use]
    pub fn position(&self, role: MarkerRole) -> Option<Point2> {
        Some(Point2::new(self.get(Channel::x(role))?, self.get(Channel::y(role))?))
    }
}

/// Frame table whose columns are anatomical role channels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleFrameTable {
    frames: Vec<RoleFrame>,
}

impl RoleFrameTable {
    /// Build a table from rows that are already ordered
    #[must_use]
    pub fn from_rows(frames: Vec<RoleFrame>) -> Self {
        Self { frames }
    }

    #[must_use]
    pub fn rows(&self) -> &[RoleFrame] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&RoleFrame> {
        self.frames.first()
    }

    /// Values of one channel, row by row
    #[must_use]
    pub fn channel(&self, channel: Channel) -> Vec<Option<f64>> {
        self.frames.iter().map(|f| f.get(channel)).collect()
    }

    /// `true` where the channel has no value
    #[must_use]
    pub fn missing_mask(&self, channel: Channel) -> Vec<bool> {
        self.frames.iter().map(|f| f.get(channel).is_none()).collect()
    }

    /// Rows `start..=end`, clamped to the table
    #[must_use]
    pub fn slice_inclusive(&self, start: usize, end: usize) -> Self {
        if self.frames.is_empty() || start >= self.frames.len() {
            return Self::default();
        }
        let end = end.min(self.frames.len() - 1);
        Self {
            frames: self.frames[start..=end].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> FrameTable {
        FrameTable::new(vec![
            Frame::empty(0, 0.0).with(MarkerId(3), 1.0, 2.0).with(MarkerId(7), 5.0, 6.0),
            Frame::empty(4, 0.1).with(MarkerId(7), 5.5, 6.5),
            Frame::empty(8, 0.2),
        ])
        .unwrap()
    }

    #[test]
    fn test_marker_ids_sorted() {
        let ids: Vec<_> = sample_table().marker_ids().into_iter().collect();
        assert_eq!(ids, vec![MarkerId(3), MarkerId(7)]);
    }

    #[test]
    fn test_track_alignment() {
        let track = sample_table().track(MarkerId(3));
        assert_eq!(track.positions.len(), 3);
        assert_eq!(track.positions[0], Some(Point2::new(1.0, 2.0)));
        assert!(track.positions[1].is_none());
        assert_eq!(track.first_valid_within(1), Some(Point2::new(1.0, 2.0)));
    }

    #[test]
    fn test_rejects_reordered_frames() {
        let result = FrameTable::new(vec![Frame::empty(4, 0.1), Frame::empty(0, 0.0)]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_non_finite_positions() {
        let result = FrameTable::new(vec![Frame::empty(0, 0.0).with(MarkerId(1), f64::NAN, 1.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_projection_drops_unmapped_markers() {
        let mapping = BTreeMap::from([(MarkerId(7), MarkerRole::Tibia)]);
        let roles = sample_table().project(&mapping);
        assert_eq!(roles.len(), 3);
        assert_eq!(roles.rows()[0].position(MarkerRole::Tibia), Some(Point2::new(5.0, 6.0)));
        assert!(roles.rows()[0].position(MarkerRole::HipBase).is_none());
        assert_eq!(roles.missing_mask(Channel::x(MarkerRole::Tibia)), vec![false, false, true]);
    }

    #[test]
    fn test_slice_inclusive_clamps() {
        let mapping = BTreeMap::from([(MarkerId(7), MarkerRole::Tibia)]);
        let roles = sample_table().project(&mapping);
        assert_eq!(roles.slice_inclusive(1, 10).len(), 2);
        assert!(roles.slice_inclusive(5, 10).is_empty());
    }
}
