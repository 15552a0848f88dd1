//! Per-frame hip angle trend.

use crate::{
    geometry::slope_angle,
    roles::MarkerRole,
    table::RoleFrameTable,
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// One point of the hip angle trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    /// Seconds since the start of the video
    pub time: f64,
    /// Hip inclination in degrees
    pub angle: f64,
}

/// Raw hip inclination for every row, keyed by timestamp
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a row lacks a hip position and
/// [`Error::DegenerateGeometry`] if the hip markers are vertically aligned
/// in any row.
pub fn compute_hip_angles(table: &RoleFrameTable) -> Result<Vec<AngleSample>> {
    table
        .rows()
        .iter()
        .map(|row| {
            let (Some(base), Some(test)) = (row.position(MarkerRole::HipBase), row.position(MarkerRole::HipTest))
            else {
                return Err(Error::InvalidInput(format!(
                    "Frame {} has no complete hip positions",
                    row.source_index
                )));
            };
            let angle = slope_angle(base, test).map_err(|e| match e {
                Error::DegenerateGeometry(msg) => {
                    Error::DegenerateGeometry(format!("frame {}: {msg}", row.source_index))
                }
                other => other,
            })?;
            Ok(AngleSample { time: row.time, angle })
        })
        .collect()
}

/// Remove the calibration offset from every sample
#[must_use]
pub fn subtract_offset(samples: &[AngleSample], offset: f64) -> Vec<AngleSample> {
    samples
        .iter()
        .map(|s| AngleSample {
            time: s.time,
            angle: s.angle - offset,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Channel;
    use crate::table::RoleFrame;
    use approx::assert_abs_diff_eq;

    fn row(i: usize, base: (f64, f64), test: (f64, f64)) -> RoleFrame {
        RoleFrame::empty(i, i as f64 * 0.1)
            .with(Channel::x(MarkerRole::HipBase), Some(base.0))
            .with(Channel::y(MarkerRole::HipBase), Some(base.1))
            .with(Channel::x(MarkerRole::HipTest), Some(test.0))
            .with(Channel::y(MarkerRole::HipTest), Some(test.1))
    }

    #[test]
    fn test_angles_keyed_by_time() {
        let table = RoleFrameTable::from_rows(vec![
            row(0, (0.0, 0.0), (10.0, 0.0)),
            row(1, (0.0, 0.0), (10.0, 10.0)),
            row(2, (0.0, 0.0), (10.0, -10.0)),
        ]);
        let samples = compute_hip_angles(&table).unwrap();
        assert_eq!(samples.len(), 3);
        assert_abs_diff_eq!(samples[1].time, 0.1);
        assert_abs_diff_eq!(samples[1].angle, 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(samples[2].angle, -45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_offset_subtracted_from_every_sample() {
        let raw = vec![
            AngleSample { time: 0.0, angle: 3.0 },
            AngleSample { time: 0.1, angle: 12.5 },
            AngleSample { time: 0.2, angle: -7.0 },
        ];
        let corrected = subtract_offset(&raw, 3.0);
        for (r, c) in raw.iter().zip(&corrected) {
            assert_eq!(r.time, c.time);
            assert_abs_diff_eq!(c.angle, r.angle - 3.0);
        }
    }

    #[test]
    fn test_vertical_frame_is_degenerate() {
        let table = RoleFrameTable::from_rows(vec![row(0, (0.0, 0.0), (10.0, 1.0)), row(7, (5.0, 0.0), (5.0, 9.0))]);
        match compute_hip_angles(&table) {
            Err(Error::DegenerateGeometry(msg)) => assert!(msg.contains("frame 7")),
            other => panic!("Expected DegenerateGeometry, got {other:?}"),
        }
    }

    #[test]
    fn test_two_quadrant_wrap_near_vertical() {
        // The segment sweeps past vertical: the slope angle jumps from about
        // +89° to about -89° instead of continuing to 91°.
        let table = RoleFrameTable::from_rows(vec![
            row(0, (0.0, 0.0), (0.1, 10.0)),
            row(1, (0.0, 0.0), (-0.1, 10.0)),
        ]);
        let samples = compute_hip_angles(&table).unwrap();
        assert!(samples[0].angle > 89.0);
        assert!(samples[1].angle < -89.0);
    }

    #[test]
    fn test_missing_hip_is_rejected() {
        let incomplete = RoleFrame::empty(3, 0.3).with(Channel::x(MarkerRole::HipBase), Some(1.0));
        let table = RoleFrameTable::from_rows(vec![incomplete]);
        assert!(matches!(compute_hip_angles(&table), Err(Error::InvalidInput(_))));
    }
}
