//! Baseline tilt calibration.

use crate::{
    geometry::slope_angle,
    roles::MarkerRole,
    table::RoleFrameTable,
    Error, Result,
};
use log::info;

/// Hip segment inclination at rest, read from the first row
///
/// The result is subtracted from every later angle sample to cancel camera
/// or mounting tilt.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an empty table or a first row without
/// both hip positions, and [`Error::DegenerateGeometry`] when the hip
/// markers are vertically aligned.
pub fn compute_offset(table: &RoleFrameTable) -> Result<f64> {
    let first = table
        .first()
        .ok_or_else(|| Error::InvalidInput("Cannot calibrate an empty table".to_string()))?;
    let base = first
        .position(MarkerRole::HipBase)
        .ok_or_else(|| Error::InvalidInput("First frame has no hip_base position".to_string()))?;
    let test = first
        .position(MarkerRole::HipTest)
        .ok_or_else(|| Error::InvalidInput("First frame has no hip_test position".to_string()))?;

    let offset = slope_angle(base, test).map_err(|e| match e {
        Error::DegenerateGeometry(msg) => Error::DegenerateGeometry(format!("calibration frame: {msg}")),
        other => other,
    })?;
    info!("Calibration offset: {:.3}°", offset);
    Ok(offset)
}
