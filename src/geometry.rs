//! Planar angle helpers.
//!
//! Two conventions coexist:
//! - [`slope_angle`] measures the inclination of the hip segment with a
//!   two-quadrant arctangent, so a segment and its reverse give the same
//!   angle and the result jumps by 180° when the segment passes vertical.
//! - [`vector_angle`] measures the oriented direction of a vector with a
//!   four-quadrant arctangent in [-180°, 180°].

use crate::{constants::EPSILON, table::Point2, Error, Result};

/// Axis a [`vector_angle`] is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceAxis {
    /// Angle from the +x axis towards +y
    #[default]
    X,
    /// Angle from the +y axis towards +x
    Y,
}

impl std::str::FromStr for ReferenceAxis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            _ => Err(Error::InvalidInput(format!("Reference axis must be 'x' or 'y', got '{s}'"))),
        }
    }
}

/// Inclination in degrees of the segment `base -> test`, `atan(dy / dx)`
///
/// # Errors
///
/// Returns [`Error::DegenerateGeometry`] when the two points share the same x.
pub fn slope_angle(base: Point2, test: Point2) -> Result<f64> {
    let dx = test.x - base.x;
    let dy = test.y - base.y;
    if dx.abs() < EPSILON {
        return Err(Error::DegenerateGeometry(format!(
            "zero horizontal separation between hip markers at x = {}",
            base.x
        )));
    }
    Ok((dy / dx).atan().to_degrees())
}

/// Oriented angle in degrees of the vector `base -> test` against an axis
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a coordinate is not finite.
pub fn vector_angle(base: Point2, test: Point2, axis: ReferenceAxis) -> Result<f64> {
    if [base.x, base.y, test.x, test.y].iter().any(|c| !c.is_finite()) {
        return Err(Error::InvalidInput("Coordinates must be finite".to_string()));
    }
    let dx = test.x - base.x;
    let dy = test.y - base.y;
    let radians = match axis {
        ReferenceAxis::X => dy.atan2(dx),
        ReferenceAxis::Y => dx.atan2(dy),
    };
    let mut degrees = radians.to_degrees();
    if degrees > 180.0 {
        degrees -= 360.0;
    } else if degrees < -180.0 {
        degrees += 360.0;
    }
    Ok(degrees)
}
