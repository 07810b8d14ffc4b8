//! Ordered parameter and result bookkeeping shared by every hazard model.
//!
//! Parameter maps preserve the caller's insertion order so audit reports read
//! in the order the payload was written, and every value is either a concrete
//! number or an explicit gap. Maps are small (a handful of entries per model),
//! so lookups scan linearly.

use serde::{Deserialize, Serialize};

use crate::error::{HazardError, Result};

/// A supplied model parameter: a concrete value or an explicit gap.
///
/// Absence is part of the data model, not a numeric sentinel; fallback
/// branches match on it instead of probing for NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// A concrete numeric value.
    Value(f64),
    /// The caller named the parameter but could not supply a value.
    Absent,
}

impl ParamValue {
    /// The concrete value, if one was supplied.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent => None,
        }
    }

    /// Whether this entry is an explicit gap.
    pub fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

impl From<Option<f64>> for ParamValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Value)
    }
}

/// Insertion-ordered mapping from parameter name to [`ParamValue`].
///
/// Duplicate keys are rejected at construction; later writes through
/// [`ParamMap::insert`] overwrite in place without disturbing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamMap {
    entries: Vec<(String, ParamValue)>,
}

impl ParamMap {
    /// Empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(name, value)` pairs, keeping their order.
    ///
    /// # Errors
    /// Returns a validation error when the same name appears twice.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let mut map = Self::new();
        for (name, value) in pairs {
            let name = name.into();
            if map.contains(&name) {
                return Err(HazardError::duplicate(&name));
            }
            map.entries.push((name, value.into()));
        }
        Ok(map)
    }

    /// Entry for `name`, if present.
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    /// Concrete value for `name`; `None` when missing or absent.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::value)
    }

    /// Concrete value for `name`.
    ///
    /// # Errors
    /// Returns a validation error when the parameter is missing or absent.
    pub fn require(&self, name: &str) -> Result<f64> {
        self.value(name).ok_or_else(|| HazardError::missing(name))
    }

    /// Whether `name` was supplied at all (value or explicit gap).
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Append a new entry, or overwrite an existing one in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), *value))
    }

    /// Names of entries supplied as explicit gaps, in insertion order.
    pub fn absent_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, value)| value.is_absent())
            .map(|(key, _)| key.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Insertion-ordered, append-or-overwrite-by-key log of derived results.
///
/// Labels may encode the producing input ("radius at 0.1MPa") so distinct
/// queries against the same method coexist.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultLog {
    entries: Vec<(String, f64)>,
}

impl ResultLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result, or overwrite an existing label in place.
    pub fn record(&mut self, label: impl Into<String>, value: f64) {
        let label = label.into();
        match self.entries.iter_mut().find(|(key, _)| *key == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    /// Recorded value for `label`, if any.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| *value)
    }

    /// Whether `label` has been recorded.
    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == label)
    }

    /// Entries in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), *value))
    }

    /// Number of recorded results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_rejects_duplicate_names() {
        let result = ParamMap::from_pairs([("wind_speed", 1.0), ("wind_speed", 2.0)]);
        assert!(matches!(result, Err(HazardError::Validation(_))));
    }

    #[test]
    fn from_pairs_preserves_insertion_order() {
        let map = ParamMap::from_pairs([
            ("pool_radius", ParamValue::Value(24.7)),
            ("env_temp", ParamValue::Value(298.0)),
            ("air_density", ParamValue::Absent),
        ])
        .unwrap();

        let names: Vec<&str> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["pool_radius", "env_temp", "air_density"]);
        assert_eq!(map.value("env_temp"), Some(298.0));
        assert_eq!(map.value("air_density"), None);
        assert!(map.contains("air_density"));
    }

    #[test]
    fn require_distinguishes_absent_from_supplied() {
        let map = ParamMap::from_pairs([("boiling_point", ParamValue::Absent)]).unwrap();
        assert!(map.require("boiling_point").is_err());
        assert!(map.require("never_supplied").is_err());

        let absent: Vec<&str> = map.absent_names().collect();
        assert_eq!(absent, ["boiling_point"]);
    }

    #[test]
    fn result_log_overwrites_by_label_without_reordering() {
        let mut log = ResultLog::new();
        log.record("flame_height", 10.0);
        log.record("heat_radiation", 5.0e6);
        log.record("flame_height", 12.0);

        assert_eq!(log.len(), 2);
        assert_eq!(log.get("flame_height"), Some(12.0));
        let labels: Vec<&str> = log.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, ["flame_height", "heat_radiation"]);
    }
}
