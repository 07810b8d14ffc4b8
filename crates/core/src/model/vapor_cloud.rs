//! Vapor-cloud explosion model: TNT-equivalent blast scaling.
//!
//! Cloud mass, explosive energy, and the TNT-equivalent mass feed the
//! cube-root blast-scaling law; overpressure and radius queries then read the
//! fitted 1000 kg reference curve in the matching direction.

use tracing::debug;

use crate::core_types::params::ParamMap;
use crate::error::{HazardError, Result};
use crate::model::explosion::{TntBlastCurve, EXPLOSION_ENV_PARAMS, EXPLOSION_MAT_PARAMS};
use crate::model::{compose_params, HazardModel, ModelState, BASE_ENV_PARAMS, BASE_MAT_PARAMS};

/// Material parameters the vapor-cloud model adds to its family's
/// declaration.
pub(crate) const VAPOR_CLOUD_MAT_PARAMS: &[&str] = &["material_density", "combustion_heat"];

/// Environment parameters the vapor-cloud model adds to its family's
/// declaration.
pub(crate) const VAPOR_CLOUD_ENV_PARAMS: &[&str] =
    &["tnt_explosive_energy", "material_volume", "material_weight"];

/// Default TNT-equivalence yield factor (valid range roughly 0.0002-0.149).
pub const DEFAULT_YIELD_FACTOR: f64 = 0.04;

/// Default ground-reflection factor for a surface burst.
pub const DEFAULT_GROUND_REFLECTION: f64 = 1.8;

/// Blast energy of 1 kg TNT used when none is supplied, kJ/kg.
/// Physical range is 4230-4836 kJ/kg.
pub const DEFAULT_TNT_ENERGY_KJ_PER_KG: f64 = 4500.0;

/// Vapor-cloud explosion bound to one material and accident scenario.
#[derive(Debug, Clone)]
pub struct VaporCloudExplosion {
    state: ModelState,
    curve: TntBlastCurve,
}

impl VaporCloudExplosion {
    /// Bind the model to a material and its parameter maps, fitting the
    /// reference blast curve.
    ///
    /// # Errors
    /// Returns a computation error when the reference-curve fit fails.
    pub fn new(
        material: impl Into<String>,
        material_params: ParamMap,
        environment_params: ParamMap,
    ) -> Result<Self> {
        Ok(Self {
            state: ModelState::new(material, material_params, environment_params),
            curve: TntBlastCurve::fit()?,
        })
    }

    /// Shared reference blast curve fitted at construction.
    pub fn blast_curve(&self) -> &TntBlastCurve {
        &self.curve
    }

    /// Mass of the vapor cloud, kg.
    ///
    /// A supplied positive `material_weight` wins; otherwise the mass is
    /// volume times density, memoized for later calls.
    ///
    /// # Errors
    /// Returns a validation error when neither a usable weight nor both
    /// volume and density are available.
    pub fn material_weight(&mut self) -> Result<f64> {
        if let Some(supplied) = self.state.environment_value("material_weight") {
            if supplied > 0.0 {
                return Ok(supplied);
            }
        }
        if let Some(cached) = self.state.cached("material_weight") {
            return Ok(cached);
        }

        let volume = self.state.require_environment("material_volume")?;
        let density = self.state.require_material("material_density")?;
        if !volume.is_finite() || volume <= 0.0 {
            return Err(HazardError::invalid_value(
                "material_volume",
                volume,
                "must be positive",
            ));
        }
        if !density.is_finite() || density <= 0.0 {
            return Err(HazardError::invalid_value(
                "material_density",
                density,
                "must be positive",
            ));
        }

        let weight = volume * density;
        self.state.record("material_weight", weight);
        Ok(weight)
    }

    /// Explosive energy released by the cloud, kJ.
    ///
    /// `yield_factor` is the TNT-equivalence yield (roughly 0.0002-0.149),
    /// `ground_reflection` the surface-burst factor; both must be positive.
    ///
    /// # Errors
    /// Returns a validation error when a factor or the combustion heat is
    /// not positive, or the mass derivation fails.
    pub fn explosive_energy(&mut self, yield_factor: f64, ground_reflection: f64) -> Result<f64> {
        if !yield_factor.is_finite() || yield_factor <= 0.0 {
            return Err(HazardError::invalid_value(
                "yield factor",
                yield_factor,
                "must be positive",
            ));
        }
        if !ground_reflection.is_finite() || ground_reflection <= 0.0 {
            return Err(HazardError::invalid_value(
                "ground reflection factor",
                ground_reflection,
                "must be positive",
            ));
        }
        if let Some(cached) = self.state.cached("explosive_energy") {
            return Ok(cached);
        }

        let combustion_heat = self.state.require_material("combustion_heat")?;
        if !combustion_heat.is_finite() || combustion_heat <= 0.0 {
            return Err(HazardError::invalid_value(
                "combustion_heat",
                combustion_heat,
                "must be positive",
            ));
        }

        let weight = self.material_weight()?;
        let energy = yield_factor * ground_reflection * combustion_heat * weight;

        self.state.record("yield_factor", yield_factor);
        self.state.record("ground_reflection", ground_reflection);
        self.state.record("explosive_energy", energy);
        Ok(energy)
    }

    /// TNT mass releasing the same energy as the cloud, kg.
    ///
    /// Uses the supplied per-kilogram TNT energy when present, else the
    /// 4500 kJ/kg default.
    ///
    /// # Errors
    /// Returns a validation error when a supplied reference energy is not
    /// positive or the energy derivation fails.
    pub fn tnt_equivalent(&mut self, yield_factor: f64, ground_reflection: f64) -> Result<f64> {
        if let Some(cached) = self.state.cached("tnt_weight") {
            return Ok(cached);
        }

        let reference = match self.state.environment_value("tnt_explosive_energy") {
            Some(supplied) => {
                if !supplied.is_finite() || supplied <= 0.0 {
                    return Err(HazardError::invalid_value(
                        "tnt_explosive_energy",
                        supplied,
                        "must be positive",
                    ));
                }
                supplied
            }
            None => DEFAULT_TNT_ENERGY_KJ_PER_KG,
        };

        let energy = self.explosive_energy(yield_factor, ground_reflection)?;
        let tnt_weight = energy / reference;

        debug!(tnt_weight, reference, "converted cloud energy to TNT mass");
        self.state.record("tnt_weight", tnt_weight);
        Ok(tnt_weight)
    }

    /// Shock-wave overpressure at `distance_m` from the burst centre, MPa.
    ///
    /// The query distance is rescaled by the inverse cube root of the TNT
    /// mass before reading the reference curve; negative spline excursions
    /// clamp to zero.
    ///
    /// # Errors
    /// Returns a validation error when the distance is not positive or an
    /// upstream derivation fails.
    pub fn wave_overpressure_at(
        &mut self,
        distance_m: f64,
        yield_factor: f64,
        ground_reflection: f64,
    ) -> Result<f64> {
        let label = format!("overpressure at {distance_m}m");
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

        let tnt_weight = self.tnt_equivalent(yield_factor, ground_reflection)?;
        let scaled = distance_m / (0.1 * tnt_weight.cbrt());
        let overpressure = self.curve.overpressure_at(scaled)?.max(0.0);

        self.state
            .record(format!("scaled distance at {distance_m}m"), scaled);
        self.state.record(label, overpressure);
        Ok(overpressure)
    }

    /// Radius at which the shock wave carries `overpressure_mpa`, m.
    ///
    /// # Errors
    /// Returns a validation error when the overpressure is not positive or
    /// an upstream derivation fails.
    pub fn wave_radius_for(
        &mut self,
        overpressure_mpa: f64,
        yield_factor: f64,
        ground_reflection: f64,
    ) -> Result<f64> {
        let label = format!("radius at {overpressure_mpa}MPa");
        if let Some(cached) = self.state.cached(&label) {
            return Ok(cached);
        }

        if !overpressure_mpa.is_finite() || overpressure_mpa <= 0.0 {
            return Err(HazardError::invalid_value(
                "overpressure",
                overpressure_mpa,
                "must be positive",
            ));
        }

        let tnt_weight = self.tnt_equivalent(yield_factor, ground_reflection)?;
        let scaled = self.curve.distance_at(overpressure_mpa)?;
        let radius = (0.1 * tnt_weight.cbrt() * scaled).max(0.0);

        self.state
            .record(format!("scaled distance at {overpressure_mpa}MPa"), scaled);
        self.state.record(label, radius);
        Ok(radius)
    }
}

impl HazardModel for VaporCloudExplosion {
    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }

    fn required_material_params() -> Vec<&'static str> {
        compose_params(&[
            BASE_MAT_PARAMS,
            EXPLOSION_MAT_PARAMS,
            VAPOR_CLOUD_MAT_PARAMS,
        ])
    }

    fn required_environment_params() -> Vec<&'static str> {
        compose_params(&[
            BASE_ENV_PARAMS,
            EXPLOSION_ENV_PARAMS,
            VAPOR_CLOUD_ENV_PARAMS,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::params::ParamValue;
    use approx::assert_relative_eq;

    /// Gasoline leak fixture from a surveyed release: mass known directly.
    fn gasoline_fixture() -> VaporCloudExplosion {
        let material = ParamMap::from_pairs([
            ("material_density", ParamValue::Value(790.0)),
            ("combustion_heat", ParamValue::Value(45_980.0)),
        ])
        .unwrap();
        let environment = ParamMap::from_pairs([
            ("tnt_explosive_energy", ParamValue::Absent),
            ("material_volume", ParamValue::Absent),
            ("material_weight", ParamValue::Value(23_700.0)),
        ])
        .unwrap();
        VaporCloudExplosion::new("gasoline", material, environment).unwrap()
    }

    #[test]
    fn supplied_weight_wins_over_the_volume_product() {
        let mut cloud = gasoline_fixture();
        assert_relative_eq!(cloud.material_weight().unwrap(), 23_700.0);
    }

    #[test]
    fn weight_falls_back_to_volume_times_density() {
        let material =
            ParamMap::from_pairs([("material_density", 790.0), ("combustion_heat", 45_980.0)])
                .unwrap();
        let environment = ParamMap::from_pairs([("material_volume", 30.0)]).unwrap();
        let mut cloud = VaporCloudExplosion::new("gasoline", material, environment).unwrap();

        assert_relative_eq!(cloud.material_weight().unwrap(), 23_700.0);
        // Derived mass is memoized, not written back into the inputs.
        assert_relative_eq!(
            cloud.state().results().get("material_weight").unwrap(),
            23_700.0
        );
        assert_eq!(cloud.state().environment_value("material_weight"), None);
    }

    #[test]
    fn weight_without_volume_or_mass_fails() {
        let material = ParamMap::from_pairs([("material_density", 790.0)]).unwrap();
        let mut cloud =
            VaporCloudExplosion::new("gasoline", material, ParamMap::new()).unwrap();
        assert!(cloud.material_weight().is_err());
    }

    #[test]
    fn energy_follows_the_yield_product() {
        let mut cloud = gasoline_fixture();
        let energy = cloud
            .explosive_energy(DEFAULT_YIELD_FACTOR, DEFAULT_GROUND_REFLECTION)
            .unwrap();
        assert_relative_eq!(energy, 0.04 * 1.8 * 45_980.0 * 23_700.0, epsilon = 1e-6);
    }

    #[test]
    fn tnt_equivalent_uses_the_default_reference_when_absent() {
        let mut cloud = gasoline_fixture();
        let tnt = cloud
            .tnt_equivalent(DEFAULT_YIELD_FACTOR, DEFAULT_GROUND_REFLECTION)
            .unwrap();
        let energy = 0.04 * 1.8 * 45_980.0 * 23_700.0;
        assert_relative_eq!(tnt, energy / 4500.0, epsilon = 1e-9);
    }

    #[test]
    fn tnt_equivalent_prefers_a_supplied_reference() {
        let material = ParamMap::from_pairs([
            ("material_density", 790.0),
            ("combustion_heat", 45_980.0),
        ])
        .unwrap();
        let environment = ParamMap::from_pairs([
            ("tnt_explosive_energy", 4675.0),
            ("material_weight", 23_700.0),
        ])
        .unwrap();
        let mut cloud = VaporCloudExplosion::new("gasoline", material, environment).unwrap();

        let tnt = cloud
            .tnt_equivalent(DEFAULT_YIELD_FACTOR, DEFAULT_GROUND_REFLECTION)
            .unwrap();
        let energy = 0.04 * 1.8 * 45_980.0 * 23_700.0;
        assert_relative_eq!(tnt, energy / 4675.0, epsilon = 1e-9);
    }

    #[test]
    fn wave_radius_for_survey_pressure_is_positive_and_finite() {
        let mut cloud = gasoline_fixture();
        let radius = cloud
            .wave_radius_for(0.1, DEFAULT_YIELD_FACTOR, DEFAULT_GROUND_REFLECTION)
            .unwrap();
        assert!(radius.is_finite());
        assert!(
            (20.0..120.0).contains(&radius),
            "expected a tens-of-metres radius, got {radius} m"
        );
    }

    #[test]
    fn overpressure_and_radius_are_mutually_consistent() {
        let mut cloud = gasoline_fixture();
        let radius = cloud
            .wave_radius_for(0.1, DEFAULT_YIELD_FACTOR, DEFAULT_GROUND_REFLECTION)
            .unwrap();
        let overpressure = cloud
            .wave_overpressure_at(radius, DEFAULT_YIELD_FACTOR, DEFAULT_GROUND_REFLECTION)
            .unwrap();
        assert_relative_eq!(overpressure, 0.1, max_relative = 0.05);
    }

    #[test]
    fn distant_queries_clamp_to_zero_overpressure() {
        let mut cloud = gasoline_fixture();
        let overpressure = cloud
            .wave_overpressure_at(10_000.0, DEFAULT_YIELD_FACTOR, DEFAULT_GROUND_REFLECTION)
            .unwrap();
        assert_relative_eq!(overpressure, 0.0);
    }

    #[test]
    fn queries_reject_non_positive_inputs() {
        let mut cloud = gasoline_fixture();
        assert!(cloud.wave_overpressure_at(0.0, 0.04, 1.8).is_err());
        assert!(cloud.wave_radius_for(0.0, 0.04, 1.8).is_err());
        assert!(cloud.explosive_energy(0.0, 1.8).is_err());
        assert!(cloud.explosive_energy(0.04, -1.0).is_err());
    }

    #[test]
    fn energy_is_memoized_across_calls() {
        let mut cloud = gasoline_fixture();
        let first = cloud.explosive_energy(0.04, 1.8).unwrap();
        let count = cloud.state().results().len();
        let second = cloud.explosive_energy(0.04, 1.8).unwrap();
        assert_relative_eq!(first, second);
        assert_eq!(cloud.state().results().len(), count);
    }

    #[test]
    fn schema_lists_the_blast_inputs() {
        let material = VaporCloudExplosion::required_material_params();
        assert_eq!(material, ["material_density", "combustion_heat"]);
        let environment = VaporCloudExplosion::required_environment_params();
        assert_eq!(
            environment,
            [
                "center_gis",
                "tnt_explosive_energy",
                "material_volume",
                "material_weight"
            ]
        );
    }
}
