use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::number::Number;
use crate::registry::DiseaseRegistry;

pub const NO_RULES: &str = "No validation rules found for this model.";
pub const ALL_VALID: &str = "All inputs are valid.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
}

impl ValidationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("missing model input '{0}'")]
pub struct MissingInput(pub String);

/// Named feature values in the order they were entered.
///
/// Inserting an existing name replaces its value without moving it. Values
/// remember whether they were entered as integers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Map<String, serde_json::Value>", into = "serde_json::Map<String, serde_json::Value>")]
pub struct InputVector {
    entries: Vec<(String, Number)>,
}

impl InputVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Number>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Number>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.value())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.value()))
    }

    /// Entries with their values as entered.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Number)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values laid out in `order`, the schema a classifier expects.
    pub fn to_row(&self, order: &[String]) -> Result<Vec<f64>, MissingInput> {
        order
            .iter()
            .map(|name| self.get(name).ok_or_else(|| MissingInput(name.clone())))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Number>> FromIterator<(K, V)> for InputVector {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut v = InputVector::new();
        for (k, x) in iter {
            v.insert(k, x);
        }
        v
    }
}

// Non-numeric JSON values are skipped; they have no range to check and no
// classifier input to feed.
impl From<serde_json::Map<String, serde_json::Value>> for InputVector {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter()
            .filter_map(|(k, v)| Number::from_json(&v).map(|x| (k, x)))
            .collect()
    }
}

impl From<InputVector> for serde_json::Map<String, serde_json::Value> {
    fn from(input: InputVector) -> Self {
        input
            .entries
            .into_iter()
            .map(|(k, v)| (k, v.to_json()))
            .collect()
    }
}

/// Check `input` against the inclusive ranges registered for `disease`.
///
/// Unknown diseases are accepted as-is. Input names without a range are
/// ignored and ranged features missing from the input are not required.
/// The first violation in input order is reported.
pub fn validate(registry: &DiseaseRegistry, disease: &str, input: &InputVector) -> ValidationResult {
    let Some(profile) = registry.get(disease) else {
        log::debug!("no validation rules for '{disease}'");
        return ValidationResult::ok(NO_RULES);
    };

    for (feature, value) in input.iter() {
        if let Some(range) = profile.range(feature) {
            if !range.contains(value) {
                let (min, max) = range.bounds();
                return ValidationResult::rejected(format!(
                    "Invalid value for '{feature}'. Please enter a value between {min} and {max}."
                ));
            }
        }
    }

    ValidationResult::ok(ALL_VALID)
}
