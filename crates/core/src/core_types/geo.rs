//! Site coordinates, great-ellipse distance, and area discretization.
//!
//! Coordinates are restricted to the north-eastern hemisphere (both
//! components non-negative); southern and western sites are out of scope for
//! the consuming models.

use serde::Serialize;

use crate::error::{HazardError, Result};
use crate::interpolate::linspace;

/// Equatorial radius of the reference ellipsoid, km.
const EQUATORIAL_RADIUS_KM: f64 = 6378.140;

/// Polar radius of the reference ellipsoid, km.
const POLAR_RADIUS_KM: f64 = 6356.755;

/// A `[longitude, latitude]` pair in decimal degrees, both non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    /// Longitude in decimal degrees, east of Greenwich.
    pub longitude: f64,
    /// Latitude in decimal degrees, north of the equator.
    pub latitude: f64,
}

impl GeoPoint {
    /// Validated constructor.
    ///
    /// # Errors
    /// Returns a validation error when either component is negative or not
    /// finite.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        if !longitude.is_finite() || longitude < 0.0 {
            return Err(HazardError::invalid_value(
                "longitude",
                longitude,
                "must be finite and non-negative",
            ));
        }
        if !latitude.is_finite() || latitude < 0.0 {
            return Err(HazardError::invalid_value(
                "latitude",
                latitude,
                "must be finite and non-negative",
            ));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }
}

/// Great-ellipse distance between two points, in metres.
///
/// Uses the flattening-corrected arc on the reference ellipsoid. Coincident
/// points give 0.0; a degenerate correction term (antipodal geometry) also
/// collapses to 0.0 rather than returning a non-finite value.
pub fn geodesic_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let flattening = (EQUATORIAL_RADIUS_KM - POLAR_RADIUS_KM) / EQUATORIAL_RADIUS_KM;
    let axis_ratio = POLAR_RADIUS_KM / EQUATORIAL_RADIUS_KM;

    let lon_a = a.longitude.to_radians();
    let lat_a = a.latitude.to_radians();
    let lon_b = b.longitude.to_radians();
    let lat_b = b.latitude.to_radians();

    // Reduced latitudes on the ellipsoid.
    let pa = (axis_ratio * lat_a.tan()).atan();
    let pb = (axis_ratio * lat_b.tan()).atan();

    let cos_arc = pa.sin() * pb.sin() + pa.cos() * pb.cos() * (lon_a - lon_b).cos();
    let arc = cos_arc.clamp(-1.0, 1.0).acos();
    if arc == 0.0 {
        return 0.0;
    }

    let half_cos = (arc / 2.0).cos();
    let c1 = (arc.sin() - arc) * (pa.sin() + pb.sin().powi(2) / half_cos).powi(2);
    let c2 = (arc.sin() + arc) * (pa.sin() - pb.sin().powi(2) / half_cos).powi(2);
    let correction = flattening / 8.0 * (c1 - c2);

    let distance = EQUATORIAL_RADIUS_KM * (arc + correction) * 1e3;
    if distance.is_finite() {
        distance
    } else {
        0.0
    }
}

/// Discretize the bounding box of four corner points into a regular grid.
///
/// `interval_m` is the approximate spacing between neighbouring grid points
/// in metres; the latitude axis is packed slightly denser to account for
/// meridian convergence. Points are returned row-major, south to north.
///
/// # Errors
/// Returns a validation error when the interval is not positive or a corner
/// sits outside the north-eastern hemisphere.
pub fn grid_area(corners: &[GeoPoint; 4], interval_m: f64) -> Result<Vec<GeoPoint>> {
    if !interval_m.is_finite() || interval_m <= 0.0 {
        return Err(HazardError::invalid_value(
            "interval",
            interval_m,
            "must be positive",
        ));
    }

    let mut lon_min = corners[0].longitude;
    let mut lon_max = corners[0].longitude;
    let mut lat_min = corners[0].latitude;
    let mut lat_max = corners[0].latitude;
    for corner in &corners[1..] {
        lon_min = lon_min.min(corner.longitude);
        lon_max = lon_max.max(corner.longitude);
        lat_min = lat_min.min(corner.latitude);
        lat_max = lat_max.max(corner.latitude);
    }
    if lon_min < 0.0 || lat_min < 0.0 {
        return Err(HazardError::invalid(
            "corners",
            "must all sit in the north-eastern hemisphere",
        ));
    }

    // One degree spans roughly 1e5 m, so interval metres map to 1e-5 degrees.
    let lon_steps = ((lon_max - lon_min) / (1e-5 * interval_m)).round() as usize;
    let lat_steps = ((lat_max - lat_min) / (1e-5 * interval_m / 1.1)).round() as usize;

    let lons = linspace(lon_min, lon_max, lon_steps);
    let lats = linspace(lat_min, lat_max, lat_steps);

    let mut grid = Vec::with_capacity(lons.len() * lats.len());
    for &latitude in &lats {
        for &longitude in &lons {
            grid.push(GeoPoint {
                longitude,
                latitude,
            });
        }
    }
    Ok(grid)
}
