//! Hazard models: shared state plus one module per model family.
//!
//! Models are composed rather than inherited: every model
//! owns a [`ModelState`] (material, the two parameter maps, the result log),
//! family modules contribute their physics as plain functions and wrapper
//! structs, and each concrete model assembles its required-parameter schema
//! by concatenating its family's declarations with its own.

pub mod explosion;
pub mod fire;
pub mod gas_diffusion;
pub mod point_source;
pub mod pool_fire;
pub mod vapor_cloud;

pub use explosion::TntBlastCurve;
pub use gas_diffusion::{
    DispersionCoefficients, DispersionParameters, GasDispersion, StabilityClass,
};
pub use point_source::{
    PlumeDistribution, PlumeQuery, PlumeRegion, PointSourceDiffusion, TargetRegion,
};
pub use pool_fire::PoolFire;
pub use vapor_cloud::VaporCloudExplosion;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::core_types::params::{ParamMap, ParamValue, ResultLog};
use crate::error::Result;

/// Material parameters every model requires, regardless of family.
pub(crate) const BASE_MAT_PARAMS: &[&str] = &[];

/// Environment parameters every model requires: the accident site coordinate.
pub(crate) const BASE_ENV_PARAMS: &[&str] = &["center_gis"];

/// Shared bookkeeping owned by every hazard model instance.
///
/// Inputs are copied in at construction and stay immutable afterwards; every
/// derived value is memoized into the result log under a descriptive label so
/// the full derivation chain can be audited or serialized for a report.
#[derive(Debug, Clone, Serialize)]
pub struct ModelState {
    material: String,
    material_params: ParamMap,
    environment_params: ParamMap,
    results: ResultLog,
    #[serde(skip)]
    absent: FxHashSet<String>,
}

impl ModelState {
    /// Bind a material name and its parameter maps to a fresh instance.
    ///
    /// Duplicate keys are already rejected by [`ParamMap::from_pairs`];
    /// here the explicitly absent names are snapshotted for later fallback
    /// decisions.
    pub fn new(
        material: impl Into<String>,
        material_params: ParamMap,
        environment_params: ParamMap,
    ) -> Self {
        let absent = material_params
            .absent_names()
            .chain(environment_params.absent_names())
            .map(str::to_owned)
            .collect();
        Self {
            material: material.into(),
            material_params,
            environment_params,
            results: ResultLog::new(),
            absent,
        }
    }

    /// Name of the modeled material.
    pub fn material(&self) -> &str {
        &self.material
    }

    /// Defensive copy of the material parameters.
    pub fn material_params(&self) -> ParamMap {
        self.material_params.clone()
    }

    /// Defensive copy of the environment parameters.
    pub fn environment_params(&self) -> ParamMap {
        self.environment_params.clone()
    }

    /// Defensive copy of the accumulated results.
    pub fn results(&self) -> ResultLog {
        self.results.clone()
    }

    /// Concrete material-parameter value; `None` when missing or absent.
    pub fn material_value(&self, name: &str) -> Option<f64> {
        self.material_params.value(name)
    }

    /// Concrete environment-parameter value; `None` when missing or absent.
    pub fn environment_value(&self, name: &str) -> Option<f64> {
        self.environment_params.value(name)
    }

    /// Concrete material-parameter value.
    ///
    /// # Errors
    /// Returns a validation error when the parameter is missing or absent.
    pub fn require_material(&self, name: &str) -> Result<f64> {
        self.material_params.require(name)
    }

    /// Concrete environment-parameter value.
    ///
    /// # Errors
    /// Returns a validation error when the parameter is missing or absent.
    pub fn require_environment(&self, name: &str) -> Result<f64> {
        self.environment_params.require(name)
    }

    /// Whether `name` was supplied as an explicit gap at construction.
    pub fn is_absent(&self, name: &str) -> bool {
        self.absent.contains(name)
    }

    /// Record a derived result under `label` (overwrites an existing label).
    pub fn record(&mut self, label: impl Into<String>, value: f64) {
        self.results.record(label, value);
    }

    /// Previously recorded result for `label`, if any.
    pub fn cached(&self, label: &str) -> Option<f64> {
        self.results.get(label)
    }

    /// Fixed-width text report of the material, both parameter sections, and
    /// every accumulated result, for audit display.
    pub fn report(&self, title: &str) -> String {
        const WIDTH: usize = 80;
        const VALUE_WIDTH: usize = 40;
        const LABEL_WIDTH: usize = WIDTH - VALUE_WIDTH;

        fn row(out: &mut String, label: &str, value: &str) {
            out.push_str(&format!(
                "{label:<LABEL_WIDTH$}{value:>VALUE_WIDTH$}\n"
            ));
        }

        fn rule(out: &mut String, ch: &str) {
            out.push_str(&ch.repeat(WIDTH));
            out.push('\n');
        }

        fn param_text(value: ParamValue) -> String {
            match value {
                ParamValue::Value(v) => v.to_string(),
                ParamValue::Absent => "-".to_string(),
            }
        }

        let mut out = String::new();
        out.push_str(&format!("{title:^WIDTH$}\n"));
        rule(&mut out, "=");
        row(&mut out, "Material", &self.material);
        rule(&mut out, "=");

        row(&mut out, "Material Parameter", "Value");
        rule(&mut out, "-");
        for (name, value) in self.material_params.iter() {
            row(&mut out, name, &param_text(value));
        }
        rule(&mut out, "=");

        row(&mut out, "Environment Parameter", "Value");
        rule(&mut out, "-");
        for (name, value) in self.environment_params.iter() {
            row(&mut out, name, &param_text(value));
        }
        rule(&mut out, "=");

        row(&mut out, "Result", "Value");
        rule(&mut out, "-");
        for (label, value) in self.results.iter() {
            row(&mut out, label, &value.to_string());
        }
        rule(&mut out, "=");

        out
    }

    /// Serialize the audit state (parameters plus accumulated results) for
    /// the boundary layer's structured response.
    ///
    /// # Errors
    /// Returns an error when serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Capability surface shared by every hazard model.
///
/// `fit` and `plot` are extensibility hooks kept as no-ops here: regional
/// curve fitting and heat-map rendering live outside this core, and a model
/// only overrides them when it has something meaningful to do.
pub trait HazardModel {
    /// Shared bookkeeping state.
    fn state(&self) -> &ModelState;

    /// Mutable access to the shared bookkeeping state.
    fn state_mut(&mut self) -> &mut ModelState;

    /// Fit hook; default is a no-op.
    ///
    /// # Errors
    /// Implementations may fail; the default never does.
    fn fit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Plot hook; default is a no-op.
    ///
    /// # Errors
    /// Implementations may fail; the default never does.
    fn plot(&mut self) -> Result<()> {
        Ok(())
    }

    /// Material-parameter names this model type requires, composed from its
    /// family's declarations.
    fn required_material_params() -> Vec<&'static str>
    where
        Self: Sized,
    {
        compose_params(&[BASE_MAT_PARAMS])
    }

    /// Environment-parameter names this model type requires, composed from
    /// its family's declarations.
    fn required_environment_params() -> Vec<&'static str>
    where
        Self: Sized,
    {
        compose_params(&[BASE_ENV_PARAMS])
    }
}

/// Concatenate family parameter declarations in order, dropping repeats.
pub(crate) fn compose_params(declarations: &[&[&'static str]]) -> Vec<&'static str> {
    let mut seen = FxHashSet::default();
    let mut composed = Vec::new();
    for declaration in declarations {
        for &name in *declaration {
            if seen.insert(name) {
                composed.push(name);
            }
        }
    }
    composed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::params::ParamValue;

    fn sample_state() -> ModelState {
        let material = ParamMap::from_pairs([
            ("combustion_heat", ParamValue::Value(45980.0)),
            ("boiling_point", ParamValue::Absent),
        ])
        .unwrap();
        let environment =
            ParamMap::from_pairs([("wind_speed", ParamValue::Value(1.5))]).unwrap();
        ModelState::new("gasoline", material, environment)
    }

    #[test]
    fn absent_names_are_snapshotted_at_construction() {
        let state = sample_state();
        assert!(state.is_absent("boiling_point"));
        assert!(!state.is_absent("combustion_heat"));
        assert!(!state.is_absent("never_supplied"));
        assert_eq!(state.material_value("boiling_point"), None);
    }

    #[test]
    fn accessors_return_defensive_copies() {
        let state = sample_state();
        let mut copy = state.material_params();
        copy.insert("combustion_heat", 0.0);
        assert_eq!(state.material_value("combustion_heat"), Some(45980.0));
    }

    #[test]
    fn compose_params_unions_in_declaration_order() {
        let composed = compose_params(&[
            &["center_gis"],
            &["wind_speed", "source_strength"],
            &["source_strength", "wind_speed"],
        ]);
        assert_eq!(composed, ["center_gis", "wind_speed", "source_strength"]);
    }

    #[test]
    fn report_lists_every_section() {
        let mut state = sample_state();
        state.record("flame_height", 31.9);
        let report = state.report("pool fire model reports");

        assert!(report.contains("Material"));
        assert!(report.contains("gasoline"));
        assert!(report.contains("Environment Parameter"));
        assert!(report.contains("flame_height"));
        // Absent parameters render as a dash, not a number.
        assert!(report.lines().any(|l| l.starts_with("boiling_point") && l.ends_with('-')));
    }

    #[test]
    fn state_serializes_for_the_boundary_layer() {
        let mut state = sample_state();
        state.record("flame_height", 31.9);
        let json = state.to_json().unwrap();
        assert!(json.contains("flame_height"));
        assert!(json.contains("gasoline"));
    }
}
