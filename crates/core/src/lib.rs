//! Hazard-Consequence Modeling Core
//!
//! Computes consequence metrics for industrial accident scenarios: blast
//! overpressure and radius from vapor-cloud explosions, thermal radiation
//! from pool fires, and ground-level concentration fields from toxic-gas
//! plumes.
//!
//! A model instance binds a material name and two ordered parameter maps
//! (material properties and ambient conditions) to one scenario, then exposes
//! calculation methods that memoize every derived quantity into an
//! append-only result log for audit. The three model families share that
//! bookkeeping through [`model::ModelState`] and the [`model::HazardModel`]
//! capability trait:
//!
//! - explosion: a fitted 1000 kg TNT reference blast curve read through the
//!   cube-root scaling law ([`model::VaporCloudExplosion`])
//! - fire: burning rate, flame geometry and inverse-square incident flux
//!   ([`model::PoolFire`])
//! - gas diffusion: the GB/T 13201-91 atmospheric classification chain and
//!   the steady Gaussian plume it parameterizes
//!   ([`model::PointSourceDiffusion`])
//!
//! Transport, request validation, and presentation live outside this crate;
//! the boundary layer hands in plain parameter maps and reads back scalars
//! or the serialized result log.

pub mod core_types;
pub mod error;
pub mod interpolate;
pub mod model;

// Re-export the core surface
pub use core_types::geo::{geodesic_distance, grid_area, GeoPoint};
pub use core_types::params::{ParamMap, ParamValue, ResultLog};
pub use error::{HazardError, Result};
pub use interpolate::CubicSpline;
pub use model::{
    DispersionCoefficients, DispersionParameters, GasDispersion, HazardModel, ModelState,
    PlumeDistribution, PlumeQuery, PlumeRegion, PointSourceDiffusion, PoolFire, StabilityClass,
    TargetRegion, TntBlastCurve, VaporCloudExplosion,
};
