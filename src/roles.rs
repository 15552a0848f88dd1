//! Anatomical role assignment for anonymous tracker markers.
//!
//! The tracker only reports opaque ids. Roles are inferred once per run from
//! the first valid position of each marker in the opening frames:
//! - `tibia` is the lowest marker in the image (greatest y)
//! - `hip_test` is the remaining marker horizontally closest to the tibia
//! - `hip_base` is the one left over
//!
//! Ties resolve to the first marker in ascending id order.

use crate::{
    constants::REQUIRED_MARKERS,
    table::{FrameTable, MarkerId, Point2, RoleFrameTable},
    Error, Result,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Anatomical role of a tracked marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerRole {
    /// Marker strapped to the shin; its dropout marks the active test phase
    Tibia,
    /// Fixed hip reference marker
    HipBase,
    /// Hip marker that moves with the tested leg
    HipTest,
}

impl MarkerRole {
    pub const ALL: [Self; 3] = [Self::Tibia, Self::HipBase, Self::HipTest];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tibia => "tibia",
            Self::HipBase => "hip_base",
            Self::HipTest => "hip_test",
        }
    }

    const fn ordinal(self) -> usize {
        match self {
            Self::Tibia => 0,
            Self::HipBase => 1,
            Self::HipTest => 2,
        }
    }
}

impl fmt::Display for MarkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Image axis of a coordinate channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// One coordinate column of a role, e.g. `hip_test_x`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    pub role: MarkerRole,
    pub axis: Axis,
}

impl Channel {
    /// Number of role channels in a table row
    pub const COUNT: usize = 6;

    /// Channels gated by validation and repaired by interpolation
    pub const HIP: [Self; 4] = [
        Self::x(MarkerRole::HipBase),
        Self::y(MarkerRole::HipBase),
        Self::x(MarkerRole::HipTest),
        Self::y(MarkerRole::HipTest),
    ];

    /// Presence signal used to locate the test window
    pub const REFERENCE: Self = Self::x(MarkerRole::Tibia);

    #[must_use]
    pub const fn x(role: MarkerRole) -> Self {
        Self { role, axis: Axis::X }
    }

    #[must_use]
    pub const fn y(role: MarkerRole) -> Self {
        Self { role, axis: Axis::Y }
    }

    /// Column name, e.g. `hip_base_y`
    #[must_use]
    pub fn column_name(self) -> String {
        let suffix = match self.axis {
            Axis::X => "x",
            Axis::Y => "y",
        };
        format!("{}_{suffix}", self.role.name())
    }

    pub(crate) const fn slot(self) -> usize {
        let axis = match self.axis {
            Axis::X => 0,
            Axis::Y => 1,
        };
        self.role.ordinal() * 2 + axis
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column_name())
    }
}

/// Marker chosen for each role, fixed for the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub tibia: MarkerId,
    pub hip_base: MarkerId,
    pub hip_test: MarkerId,
}

impl RoleAssignment {
    #[must_use]
    pub const fn marker_for(&self, role: MarkerRole) -> MarkerId {
        match role {
            MarkerRole::Tibia => self.tibia,
            MarkerRole::HipBase => self.hip_base,
            MarkerRole::HipTest => self.hip_test,
        }
    }

    /// Marker id to role lookup used to relabel the table
    #[must_use]
    pub fn mapping(&self) -> BTreeMap<MarkerId, MarkerRole> {
        MarkerRole::ALL
            .into_iter()
            .map(|role| (self.marker_for(role), role))
            .collect()
    }
}

/// A marker with its first valid position in the opening frames
#[derive(Debug, Clone, Copy)]
struct Candidate {
    marker: MarkerId,
    position: Point2,
}

/// Pick roles from the first `n_frames` rows of the table
///
/// # Errors
///
/// Returns [`Error::InsufficientMarkers`] if fewer than three markers have a
/// valid position within the window.
pub fn assign_roles(table: &FrameTable, n_frames: usize) -> Result<RoleAssignment> {
    let pool: Vec<Candidate> = table
        .marker_ids()
        .into_iter()
        .filter_map(|marker| {
            table
                .track(marker)
                .first_valid_within(n_frames)
                .map(|position| Candidate { marker, position })
        })
        .collect();

    debug!("Role candidates in first {} frames: {}", n_frames, pool.len());

    if pool.len() < REQUIRED_MARKERS {
        return Err(Error::InsufficientMarkers {
            required: REQUIRED_MARKERS,
            found: pool.len(),
            frames: n_frames,
        });
    }
    if pool.len() > REQUIRED_MARKERS {
        warn!(
            "{} markers visible in the first {} frames, only {} will receive a role",
            pool.len(),
            n_frames,
            REQUIRED_MARKERS
        );
    }

    // Strict comparisons keep the earliest candidate on ties.
    let tibia = pool
        .iter()
        .copied()
        .reduce(|best, c| if c.position.y > best.position.y { c } else { best })
        .ok_or_else(|| Error::InvalidInput("Empty role candidate pool".to_string()))?;

    let remaining: Vec<Candidate> = pool.iter().copied().filter(|c| c.marker != tibia.marker).collect();
    let distance = |c: &Candidate| (c.position.x - tibia.position.x).abs();
    let hip_test = remaining
        .iter()
        .copied()
        .reduce(|best, c| if distance(&c) < distance(&best) { c } else { best })
        .ok_or_else(|| Error::InvalidInput("No hip candidates left after tibia selection".to_string()))?;
    let hip_base = remaining
        .iter()
        .copied()
        .find(|c| c.marker != hip_test.marker)
        .ok_or_else(|| Error::InvalidInput("No hip base candidate left".to_string()))?;

    let assignment = RoleAssignment {
        tibia: tibia.marker,
        hip_base: hip_base.marker,
        hip_test: hip_test.marker,
    };
    info!(
        "Assigned roles: tibia={} hip_base={} hip_test={}",
        assignment.tibia, assignment.hip_base, assignment.hip_test
    );
    Ok(assignment)
}

/// Assign roles and relabel the table in one step
///
/// # Errors
///
/// Propagates [`assign_roles`] failures.
pub fn label_table(table: &FrameTable, n_frames: usize) -> Result<(RoleAssignment, RoleFrameTable)> {
    let assignment = assign_roles(table, n_frames)?;
    Ok((assignment, table.project(&assignment.mapping())))
}
