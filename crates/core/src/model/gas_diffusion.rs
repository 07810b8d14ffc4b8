//! Gas-diffusion family: atmospheric classification and plume spread widths.
//!
//! Implements the GB/T 13201-91 classification chain: solar declination and
//! elevation from the accident timestamp and site coordinate, solar radiation
//! level from cloud cover, Pasquill-style atmospheric stability from wind
//! speed, and finally the power-law dispersion coefficients that give the
//! plume widths `sigma_y`/`sigma_z` at a downwind distance. Every step caches
//! its outcome in the result log, so repeated calls are idempotent and the
//! whole chain is auditable.
//!
//! # References
//! - GB/T 13201-91, "Technical methods for making local emission standards of
//!   air pollutants" (declination series, radiation level and stability
//!   tables, dispersion coefficient regressions).
//! - Pasquill, F. (1961). "The estimation of the dispersion of windborne
//!   material." Meteorological Magazine, 90, 33-49.

use std::fmt;

use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::debug;

use crate::core_types::geo::{geodesic_distance, GeoPoint};
use crate::core_types::params::ParamMap;
use crate::error::{HazardError, Result};
use crate::model::{compose_params, HazardModel, ModelState, BASE_ENV_PARAMS, BASE_MAT_PARAMS};

/// Material parameters the gas-diffusion family adds to the base declaration.
pub(crate) const GAS_DIFFUSION_MAT_PARAMS: &[&str] = &[];

/// Environment parameters the gas-diffusion family adds to the base
/// declaration.
pub(crate) const GAS_DIFFUSION_ENV_PARAMS: &[&str] = &[
    "center_longitude",
    "center_latitude",
    "total_cloudiness",
    "low_cloudiness",
    "wind_speed",
    "start_timestamp",
];

/// Default plume sampling interval, minutes.
pub const DEFAULT_SAMPLING_MINUTES: f64 = 30.0;

/// Valid sampling-interval range, minutes (inclusive low, exclusive high).
const SAMPLING_MINUTES_MIN: f64 = 30.0;
const SAMPLING_MINUTES_MAX: f64 = 6000.0;

/// Solar radiation level; row = cloud-cover category, column = elevation band.
const SOLAR_RADIATION_LEVELS: [[i8; 5]; 5] = [
    [-2, -1, 1, 2, 3],
    [-1, 0, 1, 2, 3],
    [-1, 0, 0, 1, 1],
    [0, 0, 0, 0, 1],
    [0, 0, 0, 0, 0],
];

/// Pasquill-style atmospheric stability rating, A (strongly unstable) through
/// F (strongly stable), including the intermediate transition classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StabilityClass {
    A,
    AToB,
    B,
    BToC,
    C,
    CToD,
    D,
    DToE,
    E,
    EToF,
    F,
}

impl StabilityClass {
    const ALL: [Self; 11] = [
        Self::A,
        Self::AToB,
        Self::B,
        Self::BToC,
        Self::C,
        Self::CToD,
        Self::D,
        Self::DToE,
        Self::E,
        Self::EToF,
        Self::F,
    ];

    /// Conventional label, e.g. `"A~B"` for the A-to-B transition class.
    pub fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AToB => "A~B",
            Self::B => "B",
            Self::BToC => "B~C",
            Self::C => "C",
            Self::CToD => "C~D",
            Self::D => "D",
            Self::DToE => "D~E",
            Self::E => "E",
            Self::EToF => "E~F",
            Self::F => "F",
        }
    }

    /// Numeric code used to memoize the class in the result log.
    pub(crate) fn code(self) -> f64 {
        self as usize as f64
    }

    /// Inverse of [`StabilityClass::code`].
    pub(crate) fn from_code(code: f64) -> Option<Self> {
        Self::ALL.iter().copied().find(|class| class.code() == code)
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Atmospheric stability; row = wind-speed band, column = radiation level
/// (3, 2, 1, 0, -1, -2).
const ATMOSPHERIC_STABILITY: [[StabilityClass; 6]; 5] = {
    use StabilityClass::{AToB, BToC, CToD, A, B, C, D, E, F};
    [
        [A, AToB, B, D, E, F],
        [AToB, B, C, D, E, F],
        [B, BToC, C, D, D, E],
        [C, CToD, D, D, D, D],
        [D, D, D, D, D, D],
    ]
};

// Dispersion-coefficient regression rows per stability class, in ascending
// distance-band order. Columns: alpha_y, gamma_y, alpha_z, gamma_z.
const ROWS_A: [[f64; 4]; 3] = [
    [0.000000, 0.000000, 1.12154, 0.079990],
    [0.901074, 0.425809, 1.51360, 0.008548],
    [0.850934, 0.602052, 2.10881, 0.000212],
];
const ROWS_A_TO_B: [[f64; 4]; 2] = [
    [0.907722, 0.353828, 1.19986, 0.071909],
    [0.857974, 0.499203, 1.60119, 0.028618],
];
const ROWS_B: [[f64; 4]; 2] = [
    [0.914370, 0.281846, 0.96444, 0.127190],
    [0.865014, 0.396353, 1.09356, 0.057025],
];
const ROWS_B_TO_C: [[f64; 4]; 2] = [
    [0.919325, 0.229500, 0.94102, 0.114682],
    [0.875086, 0.314238, 1.00770, 0.075718],
];
const ROWS_C: [[f64; 4]; 2] = [
    [0.924279, 0.177154, 0.00000, 0.000000],
    [0.885157, 0.232123, 0.91760, 0.106803],
];
const ROWS_C_TO_D: [[f64; 4]; 3] = [
    [0.000000, 0.000000, 0.83863, 0.126152],
    [0.926849, 0.143940, 0.75641, 0.235667],
    [0.886940, 0.189396, 0.81558, 0.136659],
];
const ROWS_D: [[f64; 4]; 3] = [
    [0.000000, 0.000000, 0.82621, 0.104634],
    [0.929418, 0.110726, 0.63202, 0.400167],
    [0.888723, 0.146669, 0.55536, 0.810763],
];
const ROWS_D_TO_E: [[f64; 4]; 3] = [
    [0.000000, 0.000000, 0.77686, 0.111771],
    [0.925118, 0.098563, 0.57235, 0.528992],
    [0.892794, 0.124308, 0.49915, 1.037100],
];
const ROWS_E: [[f64; 4]; 3] = [
    [0.000000, 0.000000, 0.78837, 0.092753],
    [0.920818, 0.086400, 0.56518, 0.433384],
    [0.896864, 0.101947, 0.41474, 1.732410],
];
const ROWS_E_TO_F: [[f64; 4]; 3] = [
    [0.000000, 0.000000, 0.78639, 0.077415],
    [0.925118, 0.070882, 0.54558, 0.401700],
    [0.892794, 0.087641, 0.36870, 2.069660],
];
const ROWS_F: [[f64; 4]; 3] = [
    [0.000000, 0.000000, 0.78440, 0.062077],
    [0.929418, 0.055363, 0.52597, 0.370015],
    [0.888723, 0.073335, 0.32266, 2.406910],
];

fn coefficient_rows(class: StabilityClass) -> &'static [[f64; 4]] {
    match class {
        StabilityClass::A => &ROWS_A,
        StabilityClass::AToB => &ROWS_A_TO_B,
        StabilityClass::B => &ROWS_B,
        StabilityClass::BToC => &ROWS_B_TO_C,
        StabilityClass::C => &ROWS_C,
        StabilityClass::CToD => &ROWS_C_TO_D,
        StabilityClass::D => &ROWS_D,
        StabilityClass::DToE => &ROWS_D_TO_E,
        StabilityClass::E => &ROWS_E,
        StabilityClass::EToF => &ROWS_E_TO_F,
        StabilityClass::F => &ROWS_F,
    }
}

/// Power-law regression coefficients selected for one downwind distance:
/// `sigma_y = gamma_y * x^alpha_y`, `sigma_z = gamma_z * x^alpha_z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DispersionCoefficients {
    /// Crosswind power-law exponent.
    pub alpha_y: f64,
    /// Crosswind power-law factor.
    pub gamma_y: f64,
    /// Vertical power-law exponent.
    pub alpha_z: f64,
    /// Vertical power-law factor.
    pub gamma_z: f64,
}

/// Plume widths resolved at one downwind distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DispersionParameters {
    /// Crosswind spread standard deviation, m.
    pub sigma_y: f64,
    /// Vertical spread standard deviation, m.
    pub sigma_z: f64,
    /// Downwind distance the widths were resolved at, m.
    pub downwind_m: f64,
}

/// Solar declination in degrees for a day of the year.
///
/// Seven-term trigonometric series from GB/T 13201-91; day 366 folds to 365
/// so leap years reuse the final day's value.
pub fn solar_declination(day_of_year: u32) -> f64 {
    let day = if day_of_year >= 366 { 365 } else { day_of_year };
    let theta = std::f64::consts::TAU * f64::from(day) / 365.0;

    (0.006918 - 0.399912 * theta.cos() + 0.070257 * theta.sin()
        - 0.006758 * (2.0 * theta).cos()
        + 0.000907 * (2.0 * theta).sin()
        - 0.002697 * (3.0 * theta).cos()
        + 0.00148 * (3.0 * theta).sin())
    .to_degrees()
}

/// Solar elevation angle in degrees.
///
/// `h = asin(sin(lat) sin(decl) + cos(lat) cos(decl) cos(15t + lon - 300))`,
/// with the hour angle in degrees before conversion.
pub fn solar_elevation(
    declination_deg: f64,
    hour_of_day: u32,
    latitude_deg: f64,
    longitude_deg: f64,
) -> f64 {
    let declination = declination_deg.to_radians();
    let latitude = latitude_deg.to_radians();
    let hour_angle = (15.0 * f64::from(hour_of_day) + longitude_deg - 300.0).to_radians();

    (latitude.sin() * declination.sin()
        + latitude.cos() * declination.cos() * hour_angle.cos())
    .asin()
    .to_degrees()
}

// Classification bands use inclusive lower / exclusive upper bounds
// throughout; the source drafts disagree at the edges and this convention is
// the one the tables are documented against.

fn cloud_cover_row(total: f64, low: f64) -> usize {
    if low < 5.0 {
        if total < 5.0 {
            0
        } else if total < 8.0 {
            1
        } else {
            2
        }
    } else if low < 8.0 {
        3
    } else {
        4
    }
}

fn elevation_column(angle_deg: f64) -> usize {
    if angle_deg < 15.0 {
        1
    } else if angle_deg < 35.0 {
        2
    } else if angle_deg < 65.0 {
        3
    } else {
        4
    }
}

fn wind_speed_band(speed: f64) -> usize {
    if speed < 1.9 {
        0
    } else if speed < 2.9 {
        1
    } else if speed < 4.9 {
        2
    } else if speed < 5.9 {
        3
    } else {
        4
    }
}

fn radiation_column(level: i8) -> Result<usize> {
    match level {
        3 => Ok(0),
        2 => Ok(1),
        1 => Ok(2),
        0 => Ok(3),
        -1 => Ok(4),
        -2 => Ok(5),
        _ => Err(HazardError::invalid(
            "solar_radiation_level",
            "is not a recognized category",
        )),
    }
}

/// Select the coefficient rows for `class` at a downwind distance.
///
/// Each class carries two or three regression rows; which row feeds the
/// crosswind pair and which feeds the vertical pair depends on the distance
/// band, and the band edges differ per class.
///
/// # Errors
/// Returns a validation error when the distance is not positive and finite.
pub fn dispersion_coefficients(
    class: StabilityClass,
    downwind_m: f64,
) -> Result<DispersionCoefficients> {
    if !downwind_m.is_finite() || downwind_m <= 0.0 {
        return Err(HazardError::invalid_value(
            "downwind distance",
            downwind_m,
            "must be finite and positive",
        ));
    }

    let x = downwind_m;
    let (horizontal, vertical) = match class {
        StabilityClass::A => {
            if x <= 300.0 {
                (1, 0)
            } else if x <= 500.0 {
                (1, 1)
            } else if x <= 1000.0 {
                (1, 2)
            } else {
                (2, 2)
            }
        }
        StabilityClass::AToB | StabilityClass::B | StabilityClass::BToC => {
            if x <= 500.0 {
                (0, 0)
            } else if x <= 1000.0 {
                (0, 1)
            } else {
                (1, 1)
            }
        }
        StabilityClass::C => {
            if x <= 1000.0 {
                (0, 1)
            } else {
                (1, 1)
            }
        }
        StabilityClass::D | StabilityClass::E | StabilityClass::EToF | StabilityClass::F => {
            if x <= 1000.0 {
                (1, 0)
            } else if x <= 10000.0 {
                (2, 1)
            } else {
                (2, 2)
            }
        }
        StabilityClass::CToD | StabilityClass::DToE => {
            if x <= 1000.0 {
                (1, 0)
            } else if x <= 2000.0 {
                (2, 1)
            } else {
                (2, 2)
            }
        }
    };

    let rows = coefficient_rows(class);
    Ok(DispersionCoefficients {
        alpha_y: rows[horizontal][0],
        gamma_y: rows[horizontal][1],
        alpha_z: rows[vertical][2],
        gamma_z: rows[vertical][3],
    })
}

/// Plume widths from selected coefficients, with the sampling-averaging-time
/// correction applied to the crosswind width.
///
/// # Errors
/// Returns a validation error when the sampling interval is outside
/// `[30, 6000)` minutes.
pub fn dispersion_sigmas(
    coefficients: DispersionCoefficients,
    downwind_m: f64,
    sampling_minutes: f64,
) -> Result<(f64, f64)> {
    if !(SAMPLING_MINUTES_MIN..SAMPLING_MINUTES_MAX).contains(&sampling_minutes) {
        return Err(HazardError::invalid_value(
            "sampling frequency",
            sampling_minutes,
            "must be at least 30 and below 6000 minutes",
        ));
    }

    let sigma_y = coefficients.gamma_y * downwind_m.powf(coefficients.alpha_y);
    let sigma_z = coefficients.gamma_z * downwind_m.powf(coefficients.alpha_z);

    let hours = sampling_minutes / 60.0;
    let exponent = if (0.5..1.0).contains(&hours) { 0.2 } else { 0.3 };
    Ok((sigma_y * (hours / 0.5).powf(exponent), sigma_z))
}

/// Stateful gas-diffusion model: the classification chain bound to one
/// accident scenario, memoizing each derived step in the result log.
#[derive(Debug, Clone)]
pub struct GasDispersion {
    state: ModelState,
    start_time: NaiveDateTime,
}

impl GasDispersion {
    /// Bind the classification chain to a material and its parameter maps.
    ///
    /// A missing or absent `start_timestamp` defaults to the current local
    /// time; the resolved timestamp is recorded for audit either way.
    ///
    /// # Errors
    /// Returns a validation error when a supplied `start_timestamp` is not a
    /// representable time.
    pub fn new(
        material: impl Into<String>,
        material_params: ParamMap,
        environment_params: ParamMap,
    ) -> Result<Self> {
        let mut state = ModelState::new(material, material_params, environment_params);

        let start_time = match state.environment_value("start_timestamp") {
            Some(seconds) => {
                if !seconds.is_finite() {
                    return Err(HazardError::invalid_value(
                        "start_timestamp",
                        seconds,
                        "must be a finite epoch second count",
                    ));
                }
                DateTime::from_timestamp(seconds as i64, 0)
                    .ok_or_else(|| {
                        HazardError::invalid_value(
                            "start_timestamp",
                            seconds,
                            "is not a representable timestamp",
                        )
                    })?
                    .naive_utc()
            }
            None => Local::now().naive_local(),
        };
        state.record("start_timestamp", start_time.and_utc().timestamp() as f64);

        Ok(Self { state, start_time })
    }

    /// Civil time of the accident start.
    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    /// Solar declination for the accident day, degrees.
    pub fn declination(&mut self) -> f64 {
        if let Some(cached) = self.state.cached("declination") {
            return cached;
        }
        let value = solar_declination(self.start_time.ordinal());
        self.state.record("declination", value);
        value
    }

    /// Solar elevation angle at the accident hour, degrees.
    ///
    /// # Errors
    /// Returns a validation error when the site coordinate is missing or
    /// either component is negative.
    pub fn solar_elevation_angle(&mut self) -> Result<f64> {
        if let Some(cached) = self.state.cached("solar_elevation") {
            return Ok(cached);
        }

        let longitude = self.state.require_environment("center_longitude")?;
        let latitude = self.state.require_environment("center_latitude")?;
        if longitude < 0.0 {
            return Err(HazardError::invalid_value(
                "center_longitude",
                longitude,
                "must be non-negative",
            ));
        }
        if latitude < 0.0 {
            return Err(HazardError::invalid_value(
                "center_latitude",
                latitude,
                "must be non-negative",
            ));
        }

        let declination = self.declination();
        let value = solar_elevation(declination, self.start_time.hour(), latitude, longitude);
        self.state.record("solar_elevation", value);
        Ok(value)
    }

    /// Solar radiation level, -2 through 3.
    ///
    /// Daytime hours (07:00-19:00) classify the elevation angle into the
    /// table column; night hours use the first column.
    ///
    /// # Errors
    /// Returns a validation error when cloud cover values are missing,
    /// negative, or the total is below the low cover.
    pub fn solar_radiation_level(&mut self) -> Result<i8> {
        if let Some(cached) = self.state.cached("solar_radiation_level") {
            return Ok(cached as i8);
        }

        let total = self.state.require_environment("total_cloudiness")?;
        let low = self.state.require_environment("low_cloudiness")?;
        if total < 0.0 {
            return Err(HazardError::invalid_value(
                "total_cloudiness",
                total,
                "must be non-negative",
            ));
        }
        if low < 0.0 {
            return Err(HazardError::invalid_value(
                "low_cloudiness",
                low,
                "must be non-negative",
            ));
        }
        if total < low {
            return Err(HazardError::invalid(
                "total_cloudiness",
                "must be at least the low cloud cover",
            ));
        }

        let row = cloud_cover_row(total, low);
        let hour = self.start_time.hour();
        let column = if (7..19).contains(&hour) {
            let elevation = self.solar_elevation_angle()?;
            elevation_column(elevation)
        } else {
            0
        };

        let level = SOLAR_RADIATION_LEVELS[row][column];
        debug!(row, column, level, "classified solar radiation level");
        self.state.record("solar_radiation_level", f64::from(level));
        Ok(level)
    }

    /// Atmospheric stability class from wind speed and radiation level.
    ///
    /// # Errors
    /// Returns a validation error when the wind speed is missing or not
    /// positive, or an upstream classification fails.
    pub fn stability_class(&mut self) -> Result<StabilityClass> {
        if let Some(code) = self.state.cached("atmospheric_stability") {
            if let Some(class) = StabilityClass::from_code(code) {
                return Ok(class);
            }
        }

        let wind_speed = self.state.require_environment("wind_speed")?;
        if !wind_speed.is_finite() || wind_speed <= 0.0 {
            return Err(HazardError::invalid_value(
                "wind_speed",
                wind_speed,
                "must be positive",
            ));
        }

        let level = self.solar_radiation_level()?;
        let row = wind_speed_band(wind_speed);
        let column = radiation_column(level)?;
        let class = ATMOSPHERIC_STABILITY[row][column];

        debug!(
            wind_speed,
            level,
            class = class.label(),
            "classified atmospheric stability"
        );
        self.state.record("atmospheric_stability", class.code());
        Ok(class)
    }

    /// Coefficient rows for the scenario's stability class at a downwind
    /// distance, plus the resolved distance itself.
    ///
    /// One of `point` or `downwind_m` must be given; an explicit distance
    /// wins, otherwise the distance is the geodesic separation between the
    /// site centre and `point`.
    ///
    /// # Errors
    /// Returns a validation error when neither locator is given, the
    /// resolved distance is not positive, or classification fails upstream.
    pub fn dispersion_param_coefficients(
        &mut self,
        point: Option<GeoPoint>,
        downwind_m: Option<f64>,
    ) -> Result<(DispersionCoefficients, f64)> {
        let distance = self.resolve_downwind(point, downwind_m)?;
        let class = self.stability_class()?;
        let coefficients = dispersion_coefficients(class, distance)?;

        self.state.record("alpha_y", coefficients.alpha_y);
        self.state.record("gamma_y", coefficients.gamma_y);
        self.state.record("alpha_z", coefficients.alpha_z);
        self.state.record("gamma_z", coefficients.gamma_z);
        Ok((coefficients, distance))
    }

    /// Plume widths at a downwind distance, with the sampling-interval
    /// correction applied to the crosswind width.
    ///
    /// # Errors
    /// Returns a validation error when the sampling interval is outside
    /// `[30, 6000)` minutes or the coefficient lookup fails.
    pub fn dispersion_parameters(
        &mut self,
        point: Option<GeoPoint>,
        downwind_m: Option<f64>,
        sampling_minutes: f64,
    ) -> Result<DispersionParameters> {
        if !(SAMPLING_MINUTES_MIN..SAMPLING_MINUTES_MAX).contains(&sampling_minutes) {
            return Err(HazardError::invalid_value(
                "sampling frequency",
                sampling_minutes,
                "must be at least 30 and below 6000 minutes",
            ));
        }

        let (coefficients, distance) = self.dispersion_param_coefficients(point, downwind_m)?;
        let (sigma_y, sigma_z) = dispersion_sigmas(coefficients, distance, sampling_minutes)?;

        self.state.record("sigma_y(m)", sigma_y);
        self.state.record("sigma_z(m)", sigma_z);
        Ok(DispersionParameters {
            sigma_y,
            sigma_z,
            downwind_m: distance,
        })
    }

    fn resolve_downwind(&self, point: Option<GeoPoint>, downwind_m: Option<f64>) -> Result<f64> {
        let distance = match (downwind_m, point) {
            (Some(distance), _) => distance,
            (None, Some(target)) => {
                let center = GeoPoint::new(
                    self.state.require_environment("center_longitude")?,
                    self.state.require_environment("center_latitude")?,
                )?;
                geodesic_distance(center, target)
            }
            (None, None) => {
                return Err(HazardError::Validation(
                    "either a GIS point or a downwind distance is required".into(),
                ))
            }
        };

        if !distance.is_finite() || distance <= 0.0 {
            return Err(HazardError::invalid_value(
                "downwind distance",
                distance,
                "must be finite and positive",
            ));
        }
        Ok(distance)
    }
}

impl HazardModel for GasDispersion {
    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }

    fn required_material_params() -> Vec<&'static str> {
        compose_params(&[BASE_MAT_PARAMS, GAS_DIFFUSION_MAT_PARAMS])
    }

    fn required_environment_params() -> Vec<&'static str> {
        compose_params(&[BASE_ENV_PARAMS, GAS_DIFFUSION_ENV_PARAMS])
    }
}
