//! Core types and utilities

pub mod geo;
pub mod params;

pub use geo::GeoPoint;
pub use params::{ParamMap, ParamValue, ResultLog};
