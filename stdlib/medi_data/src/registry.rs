//! Disease profiles and the registry that holds them.
//!
//! A [`DiseaseProfile`] carries everything the pipeline needs to know about one
//! prediction task: the inclusive clinical ranges used to screen user input,
//! the ordered feature schema the classifier was trained with, where its
//! benchmark dataset lives and how to phrase the diagnosis.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diseases;
use crate::number::Number;
use crate::validate::{self, InputVector, ValidationResult};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid range for '{feature}': min {min} is greater than max {max}")]
    InvalidRange { feature: String, min: f64, max: f64 },
    #[error("duplicate disease key: {0}")]
    DuplicateDisease(String),
    #[error("unknown disease: {0}")]
    UnknownDisease(String),
    #[error("profile '{key}': {count} dataset columns for {inputs} model inputs")]
    ColumnCountMismatch {
        key: String,
        count: usize,
        inputs: usize,
    },
    #[error("failed to read profiles: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse profiles: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Inclusive `[min, max]` bounds for one named feature. Bounds print the way
/// they were written, so an integer bound reads `1` and a float one `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    name: String,
    min: Number,
    max: Number,
}

impl FeatureRange {
    pub fn new(
        name: impl Into<String>,
        min: impl Into<Number>,
        max: impl Into<Number>,
    ) -> Result<Self, RegistryError> {
        let range = Self {
            name: name.into(),
            min: min.into(),
            max: max.into(),
        };
        range.check()?;
        Ok(range)
    }

    /// Built-in tables are checked by the registry tests instead of at runtime.
    pub(crate) fn from_table(name: &str, min: Number, max: Number) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
        }
    }

    fn check(&self) -> Result<(), RegistryError> {
        // NaN bounds fail this comparison too
        if self.min() <= self.max() {
            Ok(())
        } else {
            Err(RegistryError::InvalidRange {
                feature: self.name.clone(),
                min: self.min(),
                max: self.max(),
            })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> f64 {
        self.min.value()
    }

    pub fn max(&self) -> f64 {
        self.max.value()
    }

    /// Bounds as written in the table.
    pub fn bounds(&self) -> (Number, Number) {
        (self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min() <= value && value <= self.max()
    }
}

/// Location and layout of the benchmark CSV for a disease.
///
/// `feature_columns` lines up positionally with the profile's `model_inputs`:
/// column `i` of the CSV feeds model input `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetLayout {
    pub file: String,
    pub feature_columns: Vec<String>,
    pub target_column: String,
}

/// Diagnosis sentences. `{p}` is replaced by the probability as a percentage
/// with one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisText {
    pub positive: String,
    pub negative: String,
}

impl DiagnosisText {
    pub fn render(&self, positive: bool, probability: f64) -> String {
        let template = if positive {
            &self.positive
        } else {
            &self.negative
        };
        template.replace("{p}", &format!("{:.1}", probability * 100.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseProfile {
    pub key: String,
    pub title: String,
    pub ranges: Vec<FeatureRange>,
    pub model_inputs: Vec<String>,
    pub dataset: DatasetLayout,
    pub diagnosis: DiagnosisText,
}

impl DiseaseProfile {
    pub fn range(&self, feature: &str) -> Option<&FeatureRange> {
        self.ranges.iter().find(|r| r.name == feature)
    }
}

/// Ordered, read-only collection of disease profiles.
#[derive(Debug, Clone, Default)]
pub struct DiseaseRegistry {
    profiles: Vec<DiseaseProfile>,
}

static BUILTIN: OnceLock<DiseaseRegistry> = OnceLock::new();

impl DiseaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five built-in diseases, constructed on first use.
    pub fn builtin() -> &'static DiseaseRegistry {
        BUILTIN.get_or_init(|| DiseaseRegistry {
            profiles: diseases::builtin_profiles(),
        })
    }

    pub fn register(&mut self, profile: DiseaseProfile) -> Result<(), RegistryError> {
        for r in &profile.ranges {
            r.check()?;
        }
        if profile.dataset.feature_columns.len() != profile.model_inputs.len() {
            return Err(RegistryError::ColumnCountMismatch {
                key: profile.key.clone(),
                count: profile.dataset.feature_columns.len(),
                inputs: profile.model_inputs.len(),
            });
        }
        if self.get(&profile.key).is_some() {
            return Err(RegistryError::DuplicateDisease(profile.key));
        }
        log::debug!("registered disease profile '{}'", profile.key);
        self.profiles.push(profile);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&DiseaseProfile> {
        self.profiles.iter().find(|p| p.key == key)
    }

    pub fn require(&self, key: &str) -> Result<&DiseaseProfile, RegistryError> {
        self.get(key)
            .ok_or_else(|| RegistryError::UnknownDisease(key.to_string()))
    }

    /// Case-insensitive lookup by key or by menu title ("Heart Disease Prediction").
    pub fn find(&self, name: &str) -> Option<&DiseaseProfile> {
        let name = name.trim();
        self.profiles
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(name) || p.title.eq_ignore_ascii_case(name))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.key.as_str())
    }

    pub fn profiles(&self) -> &[DiseaseProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn validate(&self, key: &str, input: &InputVector) -> ValidationResult {
        validate::validate(self, key, input)
    }
}

/// Build a registry from a JSON array of profiles.
pub fn load_profiles_from_str(s: &str) -> Result<DiseaseRegistry, RegistryError> {
    let profiles: Vec<DiseaseProfile> = serde_json::from_str(s)?;
    let mut registry = DiseaseRegistry::new();
    for p in profiles {
        registry.register(p)?;
    }
    Ok(registry)
}

pub fn load_profiles_from_file(path: impl AsRef<Path>) -> Result<DiseaseRegistry, RegistryError> {
    let s = fs::read_to_string(path)?;
    load_profiles_from_str(&s)
}
