//! Loaded classifiers keyed by disease.
//!
//! Built once at startup from a model directory, read-only afterwards. A
//! missing or broken artifact only disables its own disease.

use std::collections::HashMap;
use std::path::Path;

use medi_data::DiseaseRegistry;

use crate::artifact::{ArtifactError, ModelArtifact};
use crate::classifier::ClassifierHandle;
use crate::model::Algorithm;

#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub disease: String,
    pub algorithm: Algorithm,
    pub feature_names: Vec<String>,
    pub class_names: Option<Vec<String>>,
    pub handle: ClassifierHandle,
}

#[derive(Debug, Default)]
pub struct ClassifierRegistry {
    models: HashMap<String, LoadedModel>,
}

/// Per-disease outcome of [`ClassifierRegistry::load_dir`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<(String, ArtifactError)>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact after checking its structure and its schema
    /// against `expected_inputs`.
    pub fn insert(
        &mut self,
        artifact: ModelArtifact,
        expected_inputs: &[String],
    ) -> Result<(), ArtifactError> {
        let disease = artifact.disease.clone();
        artifact.check_schema(&disease, expected_inputs)?;
        artifact.validate()?;
        let algorithm = artifact.model.algorithm();
        let loaded = LoadedModel {
            disease: disease.clone(),
            algorithm,
            feature_names: artifact.feature_names,
            class_names: artifact.class_names,
            handle: artifact.model.into_handle(),
        };
        self.models.insert(disease, loaded);
        Ok(())
    }

    /// Load `<dir>/<disease>.json` for every disease in `diseases`.
    pub fn load_dir(dir: impl AsRef<Path>, diseases: &DiseaseRegistry) -> (Self, LoadReport) {
        let dir = dir.as_ref();
        let mut registry = Self::new();
        let mut report = LoadReport::default();
        for profile in diseases.profiles() {
            let path = dir.join(ModelArtifact::file_name(&profile.key));
            let result = ModelArtifact::load(&path).and_then(|artifact| {
                artifact.check_schema(&profile.key, &profile.model_inputs)?;
                registry.insert(artifact, &profile.model_inputs)
            });
            match result {
                Ok(()) => {
                    log::info!("loaded model for '{}' from {}", profile.key, path.display());
                    report.loaded.push(profile.key.clone());
                }
                Err(e) => {
                    log::warn!("model for '{}' unavailable: {e}", profile.key);
                    report.failed.push((profile.key.clone(), e));
                }
            }
        }
        (registry, report)
    }

    pub fn get(&self, disease: &str) -> Option<&LoadedModel> {
        self.models.get(disease)
    }

    pub fn diseases(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.models.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
