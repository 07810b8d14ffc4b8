//! Explosion family: the fitted 1000 kg TNT reference blast curve.
//!
//! The surveyed dataset relates shock-wave overpressure to distance for a
//! 1000 kg TNT ground burst. Concrete explosion models rescale a query
//! distance by the cube-root blast-scaling law and then read this curve in
//! either direction. The survey only spans 5–75 m, so evaluation outside the
//! span is clamped to fixed policy values instead of trusting spline
//! extrapolation.

use tracing::debug;

use crate::error::{HazardError, Result};
use crate::interpolate::CubicSpline;

/// Material parameters the explosion family adds to the base declaration.
pub(crate) const EXPLOSION_MAT_PARAMS: &[&str] = &[];

/// Environment parameters the explosion family adds to the base declaration.
pub(crate) const EXPLOSION_ENV_PARAMS: &[&str] = &[];

/// Surveyed distances from the burst centre, m.
const REFERENCE_DISTANCE_M: [f64; 22] = [
    5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0,
    50.0, 55.0, 60.0, 65.0, 70.0, 75.0,
];

/// Surveyed shock-wave overpressure at each distance, MPa.
const REFERENCE_OVERPRESSURE_MPA: [f64; 22] = [
    2.94, 2.06, 1.67, 1.27, 0.95, 0.76, 0.50, 0.33, 0.235, 0.17, 0.126, 0.079, 0.057, 0.043,
    0.033, 0.027, 0.0235, 0.0205, 0.018, 0.016, 0.0143, 0.013,
];

/// Nearest and farthest surveyed distances, m.
const SURVEY_NEAR_M: f64 = 5.0;
const SURVEY_FAR_M: f64 = 75.0;

/// Overpressure ceiling reported inside the unsurveyed near field, MPa.
const NEAR_FIELD_OVERPRESSURE_MPA: f64 = 3.0;

/// Distance reported for overpressures above the ceiling, m.
const NEAR_FIELD_DISTANCE_M: f64 = 4.0;

/// Far-field floor: overpressures below this map to the distance cap, MPa.
const FAR_FIELD_OVERPRESSURE_MPA: f64 = 0.01;

/// Distance cap reported for far-field overpressures, m.
const FAR_FIELD_DISTANCE_M: f64 = 80.0;

/// Forward and inverse splines through the TNT reference dataset.
#[derive(Debug, Clone)]
pub struct TntBlastCurve {
    forward: CubicSpline,
    inverse: CubicSpline,
}

impl TntBlastCurve {
    /// Fit both directions of the reference curve.
    ///
    /// The forward spline runs over distance ascending; the inverse spline
    /// runs over the same pairs re-sorted by overpressure ascending.
    ///
    /// # Errors
    /// Returns a computation error when either spline system is singular
    /// (cannot happen for the fixed reference dataset, but the fit is not
    /// special-cased around it).
    pub fn fit() -> Result<Self> {
        let forward = CubicSpline::fit(&REFERENCE_DISTANCE_M, &REFERENCE_OVERPRESSURE_MPA)?;

        let mut pairs: Vec<(f64, f64)> = REFERENCE_OVERPRESSURE_MPA
            .iter()
            .copied()
            .zip(REFERENCE_DISTANCE_M.iter().copied())
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let pressures: Vec<f64> = pairs.iter().map(|(p, _)| *p).collect();
        let distances: Vec<f64> = pairs.iter().map(|(_, d)| *d).collect();
        let inverse = CubicSpline::fit(&pressures, &distances)?;

        debug!(
            points = REFERENCE_DISTANCE_M.len(),
            "fitted TNT reference blast curve"
        );
        Ok(Self { forward, inverse })
    }

    /// Shock-wave overpressure (MPa) at `distance_m` from a 1000 kg burst.
    ///
    /// Beyond 75 m the overpressure is reported as 0; inside 5 m the curve is
    /// unsurveyed and the fixed ceiling of 3.0 MPa is reported.
    ///
    /// # Errors
    /// Returns a validation error for a negative distance.
    pub fn overpressure_at(&self, distance_m: f64) -> Result<f64> {
        if !distance_m.is_finite() || distance_m < 0.0 {
            return Err(HazardError::invalid_value(
                "distance",
                distance_m,
                "must be finite and non-negative",
            ));
        }

        if distance_m > SURVEY_FAR_M {
            Ok(0.0)
        } else if distance_m < SURVEY_NEAR_M {
            Ok(NEAR_FIELD_OVERPRESSURE_MPA)
        } else {
            Ok(self.forward.eval(distance_m))
        }
    }

    /// Distance (m) from a 1000 kg burst at which `overpressure_mpa` occurs.
    ///
    /// Overpressures above the 3.0 MPa ceiling collapse to 4 m, just inside
    /// the surveyed range; overpressures below 0.01 MPa cap at 80 m.
    ///
    /// # Errors
    /// Returns a validation error for a negative overpressure.
    pub fn distance_at(&self, overpressure_mpa: f64) -> Result<f64> {
        if !overpressure_mpa.is_finite() || overpressure_mpa < 0.0 {
            return Err(HazardError::invalid_value(
                "overpressure",
                overpressure_mpa,
                "must be finite and non-negative",
            ));
        }

        if overpressure_mpa > NEAR_FIELD_OVERPRESSURE_MPA {
            Ok(NEAR_FIELD_DISTANCE_M)
        } else if overpressure_mpa < FAR_FIELD_OVERPRESSURE_MPA {
            Ok(FAR_FIELD_DISTANCE_M)
        } else {
            Ok(self.inverse.eval(overpressure_mpa))
        }
    }
}
