//! Error taxonomy shared by every hazard model.
//!
//! Two failure classes cover the whole core: bad inputs (`Validation`) and
//! derived quantities that make a formula impossible to evaluate
//! (`Computation`). Both carry a human-readable message; the boundary layer
//! maps them into its failure envelope.

use std::fmt;

/// Error returned by hazard-model construction and calculation methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HazardError {
    /// Missing or duplicated required parameter, or an out-of-domain numeric
    /// input (negative distance, zero wind speed, unrecognized category code).
    Validation(String),

    /// A derived quantity made the computation impossible: zero dispersion
    /// coefficient in a denominator, singular spline system, non-positive
    /// logarithm argument. Surfaced instead of silently producing infinity.
    Computation(String),
}

impl HazardError {
    /// Error for a required parameter that is missing or explicitly absent.
    pub fn missing(param: &str) -> Self {
        Self::Validation(format!("parameter '{param}' is missing or absent"))
    }

    /// Error for a parameter supplied more than once.
    pub fn duplicate(param: &str) -> Self {
        Self::Validation(format!("parameter '{param}' is supplied more than once"))
    }

    /// Error for a parameter that violates a stated constraint.
    pub fn invalid(param: &str, detail: &str) -> Self {
        Self::Validation(format!("parameter '{param}' {detail}"))
    }

    /// Error for a numeric parameter that violates a stated constraint.
    pub fn invalid_value(param: &str, value: f64, constraint: &str) -> Self {
        Self::Validation(format!("parameter '{param}' {constraint}, got {value}"))
    }

    /// Error for a derived quantity that broke the calculation.
    pub fn computation(detail: impl Into<String>) -> Self {
        Self::Computation(detail.into())
    }
}

impl fmt::Display for HazardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
            Self::Computation(msg) => write!(f, "computation error: {msg}"),
        }
    }
}

impl std::error::Error for HazardError {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HazardError>;
