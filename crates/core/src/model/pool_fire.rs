//! Pool-fire thermal radiation model.
//!
//! Burning rate from a Burgess-Hertzberg-style correlation (or a supplied
//! value), Thomas-style flame height from pool geometry, total radiative
//! output, and inverse-square incident flux at a target distance.
//!
//! # References
//! - Burgess, D., Strasser, A., Grumer, J. (1961). "Diffusive burning of
//!   liquid fuels in open trays." Fire Research Abstracts and Reviews, 3.
//! - Thomas, P.H. (1963). "The size of flames from natural fires."
//!   Symposium (International) on Combustion, 9(1), 844-859.

use std::f64::consts::PI;

use tracing::debug;

use crate::core_types::params::ParamMap;
use crate::error::{HazardError, Result};
use crate::model::fire::{FIRE_ENV_PARAMS, FIRE_MAT_PARAMS};
use crate::model::{compose_params, HazardModel, ModelState, BASE_ENV_PARAMS, BASE_MAT_PARAMS};

/// Material parameters the pool-fire model adds to its family's declaration.
pub(crate) const POOL_FIRE_MAT_PARAMS: &[&str] = &[
    "boiling_point",
    "combustion_heat",
    "specific_heat_capacity",
    "gasification_heat",
    "burning_speed",
];

/// Environment parameters the pool-fire model adds to its family's
/// declaration.
pub(crate) const POOL_FIRE_ENV_PARAMS: &[&str] = &["pool_radius", "env_temp", "air_density"];

/// Default combustion efficiency factor (valid range roughly 0.13-0.35).
pub const DEFAULT_COMBUSTION_EFFICIENCY: f64 = 0.24;

/// Default atmospheric transmissivity for incident-flux queries.
pub const DEFAULT_TRANSMISSIVITY: f64 = 1.0;

/// Liquid pool fire bound to one material and accident scenario.
#[derive(Debug, Clone)]
pub struct PoolFire {
    state: ModelState,
}

impl PoolFire {
    /// Bind the model to a material and its parameter maps.
    pub fn new(
        material: impl Into<String>,
        material_params: ParamMap,
        environment_params: ParamMap,
    ) -> Self {
        Self {
            state: ModelState::new(material, material_params, environment_params),
        }
    }

    /// Mass burning flux, kg/(m^2 s).
    ///
    /// A supplied positive `burning_speed` is returned unchanged without
    /// touching any other parameter. Otherwise the correlation needs
    /// combustion heat, specific heat capacity, gasification heat, boiling
    /// point, and ambient temperature; the sensible-heat term only enters
    /// when the boiling point sits above ambient.
    ///
    /// # Errors
    /// Returns a validation error when a correlation input is missing or not
    /// positive.
    pub fn burning_rate(&mut self) -> Result<f64> {
        if let Some(supplied) = self.state.material_value("burning_speed") {
            if supplied > 0.0 {
                return Ok(supplied);
            }
        }
        if let Some(cached) = self.state.cached("burning_speed") {
            return Ok(cached);
        }

        let combustion_heat = self.state.require_material("combustion_heat")?;
        let specific_heat = self.state.require_material("specific_heat_capacity")?;
        let gasification_heat = self.state.require_material("gasification_heat")?;
        if !combustion_heat.is_finite() || combustion_heat <= 0.0 {
            return Err(HazardError::invalid_value(
                "combustion_heat",
                combustion_heat,
                "must be positive",
            ));
        }
        if !specific_heat.is_finite() || specific_heat <= 0.0 {
            return Err(HazardError::invalid_value(
                "specific_heat_capacity",
                specific_heat,
                "must be positive",
            ));
        }
        if !gasification_heat.is_finite() || gasification_heat <= 0.0 {
            return Err(HazardError::invalid_value(
                "gasification_heat",
                gasification_heat,
                "must be positive",
            ));
        }
        let ambient = self.state.require_environment("env_temp")?;
        let boiling_point = self.state.require_material("boiling_point")?;

        let superheat = boiling_point - ambient;
        let rate = if superheat > 0.0 {
            1e-3 * combustion_heat / (specific_heat * superheat + gasification_heat)
        } else {
            // Boiling liquid: the sensible-heat term vanishes.
            1e-3 * combustion_heat / gasification_heat
        };

        debug!(rate, "derived burning rate from the heat-balance correlation");
        self.state.record("burning_speed", rate);
        Ok(rate)
    }

    /// Flame height above the pool, m.
    ///
    /// # Errors
    /// Returns a validation error when air density or pool radius is missing
    /// or not positive, or the burning-rate derivation fails.
    pub fn flame_height(&mut self) -> Result<f64> {
        if let Some(cached) = self.state.cached("flame_height") {
            return Ok(cached);
        }

        let air_density = self.state.require_environment("air_density")?;
        let pool_radius = self.state.require_environment("pool_radius")?;
        if !air_density.is_finite() || air_density <= 0.0 {
            return Err(HazardError::invalid_value(
                "air_density",
                air_density,
                "must be positive",
            ));
        }
        if !pool_radius.is_finite() || pool_radius <= 0.0 {
            return Err(HazardError::invalid_value(
                "pool_radius",
                pool_radius,
                "must be positive",
            ));
        }

        let rate = self.burning_rate()?;
        let scaled = rate / (air_density * (19.6 * pool_radius).sqrt());
        let height = 84.0 * pool_radius * scaled.powf(0.6);

        self.state.record("flame_height", height);
        Ok(height)
    }

    /// Total radiative output of the flame, W.
    ///
    /// `efficiency` is the combustion efficiency factor; the physical range
    /// is roughly 0.13-0.35 but only positivity is enforced.
    ///
    /// # Errors
    /// Returns a validation error when the efficiency is not positive, the
    /// combustion heat is missing or not positive, or an upstream derivation
    /// fails.
    pub fn heat_radiation(&mut self, efficiency: f64) -> Result<f64> {
        let label = format!("heat_radiation(eta={efficiency})");
        if let Some(cached) = self.state.cached(&label) {
            return Ok(cached);
        }

        if !efficiency.is_finite() || efficiency <= 0.0 {
            return Err(HazardError::invalid_value(
                "efficiency",
                efficiency,
                "must be positive",
            ));
        }
        let combustion_heat = self.state.require_material("combustion_heat")?;
        if !combustion_heat.is_finite() || combustion_heat <= 0.0 {
            return Err(HazardError::invalid_value(
                "combustion_heat",
                combustion_heat,
                "must be positive",
            ));
        }

        let pool_radius = self.state.require_environment("pool_radius")?;
        let rate = self.burning_rate()?;
        let height = self.flame_height()?;

        let emitting = PI * pool_radius * (pool_radius + 2.0 * height);
        let output =
            emitting * rate * efficiency * combustion_heat / (72.0 * rate.powf(0.6) + 1.0);

        self.state.record(label, output);
        Ok(output)
    }

    /// Incident radiant flux at `distance_m` from the pool centre, W/m^2.
    ///
    /// # Errors
    /// Returns a validation error when the distance or transmissivity is not
    /// positive, or the radiative-output derivation fails.
    pub fn heat_radiation_strength_at(
        &mut self,
        distance_m: f64,
        efficiency: f64,
        transmissivity: f64,
    ) -> Result<f64> {
        let label = format!("incident flux at {distance_m}m");
        if let Some(cached) = self.state.cached(&label) {
            return Ok(cached);
        }

        if !distance_m.is_finite() || distance_m <= 0.0 {
            return Err(HazardError::invalid_value(
                "distance",
                distance_m,
                "must be positive",
            ));
        }
        if !transmissivity.is_finite() || transmissivity <= 0.0 {
            return Err(HazardError::invalid_value(
                "transmissivity",
                transmissivity,
                "must be positive",
            ));
        }

        let output = self.heat_radiation(efficiency)?;
        let flux = output * transmissivity / (4.0 * PI * distance_m.powi(2));

        self.state.record(label, flux);
        Ok(flux)
    }

    /// Radius at which the incident flux falls to `strength_w_m2`, m.
    ///
    /// # Errors
    /// Returns a validation error when the target strength or transmissivity
    /// is not positive, or the radiative-output derivation fails.
    pub fn heat_radiation_radius_for(
        &mut self,
        strength_w_m2: f64,
        efficiency: f64,
        transmissivity: f64,
    ) -> Result<f64> {
        let label = format!("radius at {strength_w_m2}W/m^2");
        if let Some(cached) = self.state.cached(&label) {
            return Ok(cached);
        }

        if !strength_w_m2.is_finite() || strength_w_m2 <= 0.0 {
            return Err(HazardError::invalid_value(
                "strength",
                strength_w_m2,
                "must be positive",
            ));
        }
        if !transmissivity.is_finite() || transmissivity <= 0.0 {
            return Err(HazardError::invalid_value(
                "transmissivity",
                transmissivity,
                "must be positive",
            ));
        }

        let output = self.heat_radiation(efficiency)?;
        let radius = (transmissivity * output / (4.0 * PI * strength_w_m2)).sqrt();

        self.state.record(label, radius);
        Ok(radius)
    }
}

impl HazardModel for PoolFire {
    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }

    fn required_material_params() -> Vec<&'static str> {
        compose_params(&[BASE_MAT_PARAMS, FIRE_MAT_PARAMS, POOL_FIRE_MAT_PARAMS])
    }

    fn required_environment_params() -> Vec<&'static str> {
        compose_params(&[BASE_ENV_PARAMS, FIRE_ENV_PARAMS, POOL_FIRE_ENV_PARAMS])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::params::ParamValue;
    use approx::assert_relative_eq;

    /// Crude-oil style fixture: burning speed surveyed, correlation inputs
    /// deliberately absent.
    fn surveyed_rate_fixture() -> PoolFire {
        let material = ParamMap::from_pairs([
            ("boiling_point", ParamValue::Absent),
            ("combustion_heat", ParamValue::Value(41_030_000.0)),
            ("specific_heat_capacity", ParamValue::Absent),
            ("gasification_heat", ParamValue::Absent),
            ("burning_speed", ParamValue::Value(0.0781)),
        ])
        .unwrap();
        let environment = ParamMap::from_pairs([
            ("env_temp", 298.0),
            ("pool_radius", 24.7),
            ("air_density", 1.293),
        ])
        .unwrap();
        PoolFire::new("rawoil", material, environment)
    }

    fn correlation_fixture(boiling_point: f64) -> PoolFire {
        let material = ParamMap::from_pairs([
            ("boiling_point", ParamValue::Value(boiling_point)),
            ("combustion_heat", ParamValue::Value(45_000_000.0)),
            ("specific_heat_capacity", ParamValue::Value(2_200.0)),
            ("gasification_heat", ParamValue::Value(360_000.0)),
            ("burning_speed", ParamValue::Absent),
        ])
        .unwrap();
        let environment = ParamMap::from_pairs([
            ("env_temp", 298.0),
            ("pool_radius", 10.0),
            ("air_density", 1.293),
        ])
        .unwrap();
        PoolFire::new("gasoline", material, environment)
    }

    #[test]
    fn supplied_burning_speed_bypasses_the_correlation() {
        let mut fire = surveyed_rate_fixture();
        let rate = fire.burning_rate().unwrap();
        assert_relative_eq!(rate, 0.0781);
        // Absent boiling point was never consulted and nothing was derived.
        assert!(fire.state().results().is_empty());
    }

    #[test]
    fn correlation_includes_sensible_heat_above_ambient() {
        let mut fire = correlation_fixture(371.0);
        let rate = fire.burning_rate().unwrap();
        let expected = 1e-3 * 45_000_000.0 / (2_200.0 * (371.0 - 298.0) + 360_000.0);
        assert_relative_eq!(rate, expected, epsilon = 1e-12);
    }

    #[test]
    fn correlation_drops_sensible_heat_for_boiling_liquids() {
        let mut fire = correlation_fixture(250.0);
        let rate = fire.burning_rate().unwrap();
        assert_relative_eq!(rate, 1e-3 * 45_000_000.0 / 360_000.0, epsilon = 1e-12);
    }

    #[test]
    fn correlation_without_inputs_fails() {
        let material = ParamMap::from_pairs([
            ("burning_speed", ParamValue::Absent),
            ("combustion_heat", ParamValue::Value(45_000_000.0)),
        ])
        .unwrap();
        let environment = ParamMap::from_pairs([("pool_radius", 10.0)]).unwrap();
        let mut fire = PoolFire::new("gasoline", material, environment);
        assert!(fire.burning_rate().is_err());
    }

    #[test]
    fn flame_height_follows_the_power_law() {
        let mut fire = surveyed_rate_fixture();
        let height = fire.flame_height().unwrap();
        let scaled = 0.0781 / (1.293 * (19.6 * 24.7_f64).sqrt());
        assert_relative_eq!(height, 84.0 * 24.7 * scaled.powf(0.6), epsilon = 1e-9);
    }

    #[test]
    fn incident_flux_obeys_the_inverse_square_law() {
        let mut fire = surveyed_rate_fixture();
        let near = fire
            .heat_radiation_strength_at(50.0, 0.35, DEFAULT_TRANSMISSIVITY)
            .unwrap();
        let far = fire
            .heat_radiation_strength_at(100.0, 0.35, DEFAULT_TRANSMISSIVITY)
            .unwrap();
        assert_relative_eq!(near / far, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn radius_inverts_the_flux_relation() {
        let mut fire = surveyed_rate_fixture();
        let radius = fire
            .heat_radiation_radius_for(37_500.0, 0.35, DEFAULT_TRANSMISSIVITY)
            .unwrap();
        let flux = fire
            .heat_radiation_strength_at(radius, 0.35, DEFAULT_TRANSMISSIVITY)
            .unwrap();
        assert_relative_eq!(flux, 37_500.0, max_relative = 1e-9);
    }

    #[test]
    fn distinct_queries_coexist_in_the_result_log() {
        let mut fire = surveyed_rate_fixture();
        fire.heat_radiation_radius_for(37_500.0, 0.35, 1.0).unwrap();
        fire.heat_radiation_radius_for(25_000.0, 0.35, 1.0).unwrap();
        fire.heat_radiation_radius_for(12_500.0, 0.35, 1.0).unwrap();

        let results = fire.state().results();
        assert!(results.contains("radius at 37500W/m^2"));
        assert!(results.contains("radius at 25000W/m^2"));
        assert!(results.contains("radius at 12500W/m^2"));
    }

    #[test]
    fn repeated_queries_reuse_the_cached_value() {
        let mut fire = surveyed_rate_fixture();
        let first = fire.heat_radiation(0.35).unwrap();
        let count = fire.state().results().len();
        let second = fire.heat_radiation(0.35).unwrap();
        assert_relative_eq!(first, second);
        assert_eq!(fire.state().results().len(), count);
    }

    #[test]
    fn rejects_non_positive_query_inputs() {
        let mut fire = surveyed_rate_fixture();
        assert!(fire.heat_radiation(0.0).is_err());
        assert!(fire.heat_radiation_strength_at(0.0, 0.35, 1.0).is_err());
        assert!(fire.heat_radiation_radius_for(-1.0, 0.35, 1.0).is_err());
    }

    #[test]
    fn schema_composes_family_and_model_declarations() {
        let material = PoolFire::required_material_params();
        assert!(material.contains(&"boiling_point"));
        assert!(material.contains(&"burning_speed"));
        let environment = PoolFire::required_environment_params();
        assert_eq!(environment[0], "center_gis");
        assert!(environment.contains(&"pool_radius"));
    }
}
