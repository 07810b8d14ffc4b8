//! Continuous point-source Gaussian plume model.
//!
//! Evaluates the steady-state double-reflection plume formula at a point,
//! inverts it for the crosswind half-width at a target concentration, and
//! bounds the downwind region exceeding a set of targets by sampling the
//! axis profile. Axis sampling is a pure per-point evaluation once the
//! stability class is resolved, so the sweep fans out across threads.

use std::f64::consts::PI;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::core_types::geo::GeoPoint;
use crate::core_types::params::ParamMap;
use crate::error::{HazardError, Result};
use crate::interpolate::linspace;
use crate::model::gas_diffusion::{
    dispersion_coefficients, dispersion_sigmas, GasDispersion, StabilityClass,
    DEFAULT_SAMPLING_MINUTES, GAS_DIFFUSION_ENV_PARAMS, GAS_DIFFUSION_MAT_PARAMS,
};
use crate::model::{compose_params, HazardModel, ModelState, BASE_ENV_PARAMS, BASE_MAT_PARAMS};

/// Material parameters the point-source model adds to its family's
/// declaration.
pub(crate) const POINT_SOURCE_MAT_PARAMS: &[&str] = &[];

/// Environment parameters the point-source model adds to its family's
/// declaration.
pub(crate) const POINT_SOURCE_ENV_PARAMS: &[&str] = &["source_strength", "wind_speed"];

/// Concentrations below this floor are reported as zero, mg/m^3.
const CONCENTRATION_FLOOR: f64 = 1e-6;

/// Query geometry for a single concentration evaluation. Distances in
/// metres; `downwind` may be omitted in favour of a GIS point.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlumeQuery {
    /// Target position as a GIS point, resolved against the site centre.
    pub point: Option<GeoPoint>,
    /// Downwind distance from the source; wins over `point` when both given.
    pub downwind: Option<f64>,
    /// Crosswind offset from the plume centreline.
    pub crosswind: f64,
    /// Ground height of the receptor.
    pub ground: f64,
    /// Effective source height.
    pub source_height: f64,
}

/// Bounded region exceeding one target concentration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlumeRegion {
    /// Downwind semi-axis of the bounded region, m.
    pub semi_major: f64,
    /// Crosswind semi-axis solved from the plume cross-section, m.
    pub semi_minor: f64,
    /// Downwind start of the region, m.
    pub start: f64,
    /// Downwind end of the region, m.
    pub end: f64,
}

/// Per-target outcome of the distribution search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetRegion {
    /// Requested concentration, mg/m^3.
    pub target: f64,
    /// Bounded region, absent when the target is never reached on the axis.
    pub region: Option<PlumeRegion>,
}

/// Result of sampling the downwind axis against a set of target
/// concentrations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlumeDistribution {
    /// One entry per requested target, in request order.
    pub regions: Vec<TargetRegion>,
    /// Downwind distance of the sampled axis maximum, m.
    pub peak_downwind: f64,
    /// Sampled axis maximum concentration, mg/m^3.
    pub peak_concentration: f64,
    /// Sampled `(distance, concentration)` profile, when requested.
    pub axis_profile: Option<Vec<(f64, f64)>>,
}

/// Steady-state plume concentration at one receptor, mg/m^3.
///
/// The zero/nonzero pattern of (crosswind offset, ground height, source
/// height) selects one of four algebraic simplifications; the full
/// double-reflection form only applies when all three are nonzero. Values
/// below 1e-6 clamp to zero.
fn plume_concentration(
    emission_g_s: f64,
    wind_speed: f64,
    sigma_y: f64,
    sigma_z: f64,
    crosswind: f64,
    ground: f64,
    source_height: f64,
) -> Result<f64> {
    if sigma_y <= 0.0 || sigma_z <= 0.0 {
        return Err(HazardError::computation(
            "dispersion coefficient collapsed to zero in the plume denominator",
        ));
    }

    let a1 = emission_g_s / (PI * wind_speed * sigma_y * sigma_z);
    let a2 = -0.5 * (crosswind / sigma_y).powi(2);
    let a3 = -0.5 * ((ground - source_height) / sigma_z).powi(2);
    let a4 = -0.5 * ((ground + source_height) / sigma_z).powi(2);

    let concentration = if (source_height == 0.0 || ground == 0.0) && crosswind != 0.0 {
        a1 * (a2 + a4).exp()
    } else if crosswind == 0.0 && ground == 0.0 && source_height != 0.0 {
        a1 * a4.exp()
    } else if crosswind == 0.0 && ground == 0.0 && source_height == 0.0 {
        a1
    } else {
        0.5 * a1 * ((a2 + a3).exp() + (a2 + a4).exp())
    };

    if concentration < CONCENTRATION_FLOOR {
        Ok(0.0)
    } else {
        Ok(concentration)
    }
}

/// Point-source plume bound to one material and accident scenario.
#[derive(Debug, Clone)]
pub struct PointSourceDiffusion {
    dispersion: GasDispersion,
}

impl PointSourceDiffusion {
    /// Bind the model to a material and its parameter maps.
    ///
    /// # Errors
    /// Returns a validation error when a supplied `start_timestamp` is not a
    /// representable time.
    pub fn new(
        material: impl Into<String>,
        material_params: ParamMap,
        environment_params: ParamMap,
    ) -> Result<Self> {
        Ok(Self {
            dispersion: GasDispersion::new(material, material_params, environment_params)?,
        })
    }

    /// Underlying classification chain.
    pub fn dispersion(&self) -> &GasDispersion {
        &self.dispersion
    }

    /// Mutable access to the underlying classification chain.
    pub fn dispersion_mut(&mut self) -> &mut GasDispersion {
        &mut self.dispersion
    }

    /// Supplied emission rate (g/s), or `None` when not configured.
    ///
    /// A missing source strength is a configuration error surfaced by the
    /// calculations that need it; there is no default.
    pub fn source_strength(&self) -> Option<f64> {
        self.state()
            .environment_value("source_strength")
            .filter(|rate| *rate > 0.0)
    }

    fn require_source_strength(&self) -> Result<f64> {
        self.source_strength()
            .ok_or_else(|| HazardError::missing("source_strength"))
    }

    fn require_wind_speed(&self) -> Result<f64> {
        let wind_speed = self.state().require_environment("wind_speed")?;
        if !wind_speed.is_finite() || wind_speed <= 0.0 {
            return Err(HazardError::invalid_value(
                "wind_speed",
                wind_speed,
                "must be positive",
            ));
        }
        Ok(wind_speed)
    }

    /// Concentration at the queried receptor, mg/m^3.
    ///
    /// # Errors
    /// Returns a validation error when the geometry is negative, no locator
    /// is given, or a required parameter is missing; a computation error
    /// when a dispersion width collapses to zero.
    pub fn concentration_at(&mut self, query: &PlumeQuery) -> Result<f64> {
        if query.crosswind < 0.0 {
            return Err(HazardError::invalid_value(
                "crosswind offset",
                query.crosswind,
                "must be non-negative",
            ));
        }
        if query.ground < 0.0 {
            return Err(HazardError::invalid_value(
                "ground height",
                query.ground,
                "must be non-negative",
            ));
        }
        if query.source_height < 0.0 {
            return Err(HazardError::invalid_value(
                "source height",
                query.source_height,
                "must be non-negative",
            ));
        }

        let wind_speed = self.require_wind_speed()?;
        let emission = self.require_source_strength()?;
        let widths = self.dispersion.dispersion_parameters(
            query.point,
            query.downwind,
            DEFAULT_SAMPLING_MINUTES,
        )?;

        let concentration = plume_concentration(
            emission,
            wind_speed,
            widths.sigma_y,
            widths.sigma_z,
            query.crosswind,
            query.ground,
            query.source_height,
        )?;

        self.dispersion.state_mut().record(
            format!(
                "concentration at ({}m, {}m, {}m, {}m)",
                widths.downwind_m, query.crosswind, query.ground, query.source_height
            ),
            concentration,
        );
        Ok(concentration)
    }

    /// Crosswind half-width at which the concentration falls to
    /// `target_mg_m3`, for a release of `source_strength * elapsed_s` grams.
    ///
    /// # Errors
    /// Returns a validation error when the target is negative, the elapsed
    /// time is not positive, or a required parameter is missing; a
    /// computation error when the target exceeds the centreline
    /// concentration at this distance.
    pub fn crosswind_half_width(
        &mut self,
        target_mg_m3: f64,
        elapsed_s: f64,
        downwind_m: f64,
        source_height: f64,
    ) -> Result<f64> {
        if target_mg_m3 < 0.0 {
            return Err(HazardError::invalid_value(
                "target concentration",
                target_mg_m3,
                "must be non-negative",
            ));
        }
        if !elapsed_s.is_finite() || elapsed_s <= 0.0 {
            return Err(HazardError::invalid_value(
                "elapsed time",
                elapsed_s,
                "must be positive",
            ));
        }

        let wind_speed = self.require_wind_speed()?;
        let emission = self.require_source_strength()?;
        let released_g = emission * elapsed_s;
        let widths = self.dispersion.dispersion_parameters(
            None,
            Some(downwind_m),
            DEFAULT_SAMPLING_MINUTES,
        )?;

        // Epsilon floor keeps the logarithm finite for a zero target.
        let target = target_mg_m3.max(1e-32);
        let bracket = (1e6 * released_g
            / (wind_speed * target * PI * widths.sigma_y * widths.sigma_z))
            .ln()
            - 0.5 * (source_height / widths.sigma_z).powi(2);
        if bracket < 0.0 {
            return Err(HazardError::computation(
                "target concentration is unreachable at this downwind distance",
            ));
        }

        let half_width = (2.0 * widths.sigma_y.powi(2) * bracket).sqrt();
        self.dispersion
            .state_mut()
            .record(format!("half width at {target_mg_m3}mg/m^3"), half_width);
        Ok(half_width)
    }

    /// Bound the downwind region exceeding each target concentration.
    ///
    /// The axis profile is sampled from the source to `wind * elapsed` at
    /// `step_m` spacing; each target below the sampled maximum is bracketed
    /// by thresholding the profile, and its crosswind semi-axis is solved at
    /// the semi-major distance. Targets at or above the maximum yield no
    /// bounded region; the peak location and value are always reported.
    ///
    /// # Errors
    /// Returns a validation error when a geometry or step input is out of
    /// domain or a required parameter is missing; a computation error when a
    /// dispersion width collapses to zero.
    pub fn distribution_for(
        &mut self,
        targets_mg_m3: &[f64],
        elapsed_s: f64,
        ground: f64,
        source_height: f64,
        step_m: f64,
        include_axis_profile: bool,
    ) -> Result<PlumeDistribution> {
        if ground < 0.0 {
            return Err(HazardError::invalid_value(
                "ground height",
                ground,
                "must be non-negative",
            ));
        }
        if source_height < 0.0 {
            return Err(HazardError::invalid_value(
                "source height",
                source_height,
                "must be non-negative",
            ));
        }
        if !elapsed_s.is_finite() || elapsed_s <= 0.0 {
            return Err(HazardError::invalid_value(
                "elapsed time",
                elapsed_s,
                "must be positive",
            ));
        }

        let wind_speed = self.require_wind_speed()?;
        let emission = self.require_source_strength()?;
        let reach = (wind_speed * elapsed_s).ceil();
        if !step_m.is_finite() || step_m <= 0.0 || step_m >= reach {
            return Err(HazardError::invalid_value(
                "step",
                step_m,
                "must be positive and below the plume reach",
            ));
        }

        let class = self.dispersion.stability_class()?;
        let samples = (reach / step_m).floor() as usize;
        let axis = linspace(0.0, reach, samples + 1);
        info!(
            samples = axis.len(),
            reach, "sampling downwind concentration profile"
        );

        let profile: Vec<(f64, f64)> = axis
            .par_iter()
            .map(|&x| axis_concentration(emission, wind_speed, class, x, ground, source_height))
            .collect::<Result<Vec<_>>>()?;

        // First strict maximum, matching a left-to-right scan of the axis.
        let (mut peak_downwind, mut peak_concentration) = (0.0, f64::NEG_INFINITY);
        for &(x, c) in &profile {
            if c > peak_concentration {
                peak_downwind = x;
                peak_concentration = c;
            }
        }

        let mut regions = Vec::with_capacity(targets_mg_m3.len());
        for &target in targets_mg_m3 {
            if target < 0.0 {
                return Err(HazardError::invalid_value(
                    "target concentration",
                    target,
                    "must be non-negative",
                ));
            }
            if target >= peak_concentration {
                regions.push(TargetRegion {
                    target,
                    region: None,
                });
                continue;
            }

            let mut start = f64::NAN;
            let mut end = f64::NAN;
            for &(x, c) in &profile {
                if c >= target {
                    if start.is_nan() {
                        start = x;
                    }
                    end = x;
                }
            }

            let semi_major = (end - start) / 2.0;
            self.dispersion.state_mut().record(
                format!("downwind semi-axis at {target}mg/m^3"),
                semi_major,
            );
            // A single-sample region has no downwind extent to solve across.
            let semi_minor = if semi_major > 0.0 {
                self.crosswind_half_width(target, elapsed_s, semi_major, source_height)?
            } else {
                0.0
            };

            regions.push(TargetRegion {
                target,
                region: Some(PlumeRegion {
                    semi_major,
                    semi_minor,
                    start,
                    end,
                }),
            });
        }

        self.dispersion
            .state_mut()
            .record("peak downwind(m)", peak_downwind);
        self.dispersion
            .state_mut()
            .record("peak concentration(mg/m^3)", peak_concentration);

        Ok(PlumeDistribution {
            regions,
            peak_downwind,
            peak_concentration,
            axis_profile: include_axis_profile.then_some(profile),
        })
    }
}

/// Centreline-axis concentration at `downwind_m`, pure in the precomputed
/// stability class. Upwind of the source (x <= 0) there is no plume.
fn axis_concentration(
    emission_g_s: f64,
    wind_speed: f64,
    class: StabilityClass,
    downwind_m: f64,
    ground: f64,
    source_height: f64,
) -> Result<(f64, f64)> {
    if downwind_m <= 0.0 {
        return Ok((downwind_m, 0.0));
    }
    let coefficients = dispersion_coefficients(class, downwind_m)?;
    let (sigma_y, sigma_z) =
        dispersion_sigmas(coefficients, downwind_m, DEFAULT_SAMPLING_MINUTES)?;
    let concentration = plume_concentration(
        emission_g_s,
        wind_speed,
        sigma_y,
        sigma_z,
        0.0,
        ground,
        source_height,
    )?;
    Ok((downwind_m, concentration))
}

impl HazardModel for PointSourceDiffusion {
    fn state(&self) -> &ModelState {
        self.dispersion.state()
    }

    fn state_mut(&mut self) -> &mut ModelState {
        self.dispersion.state_mut()
    }

    fn required_material_params() -> Vec<&'static str> {
        compose_params(&[
            BASE_MAT_PARAMS,
            GAS_DIFFUSION_MAT_PARAMS,
            POINT_SOURCE_MAT_PARAMS,
        ])
    }

    fn required_environment_params() -> Vec<&'static str> {
        compose_params(&[
            BASE_ENV_PARAMS,
            GAS_DIFFUSION_ENV_PARAMS,
            POINT_SOURCE_ENV_PARAMS,
        ])
    }
}
