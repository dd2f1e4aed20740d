//! Model artifacts: a fitted model together with the ordered feature schema
//! it was trained on.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::ModelError;
use crate::model::FittedModel;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt model {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("model for '{disease}' is malformed: {source}")]
    Malformed {
        disease: String,
        source: ModelError,
    },
    #[error("model file is for '{found}', expected '{expected}'")]
    WrongDisease { expected: String, found: String },
    #[error("feature schema of '{disease}' does not match: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        disease: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub disease: String,
    pub feature_names: Vec<String>,
    /// Original strings of a label-encoded target, indexed like the model classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_names: Option<Vec<String>>,
    pub model: FittedModel,
}

impl ModelArtifact {
    pub fn file_name(disease: &str) -> String {
        format!("{disease}.json")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&s).map_err(|source| ArtifactError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let write_err = |source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let data = serde_json::to_vec(self).map_err(|source| ArtifactError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, data).map_err(write_err)
    }

    /// Structural checks on the stored model: its internal indices are in
    /// range and it expects exactly `feature_names.len()` inputs.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let malformed = |source| ArtifactError::Malformed {
            disease: self.disease.clone(),
            source,
        };
        let width = self.model.validate().map_err(malformed)?;
        if width != self.feature_names.len() {
            return Err(malformed(ModelError::FeatureCount {
                expected: self.feature_names.len(),
                found: width,
            }));
        }
        if let Some(names) = &self.class_names {
            if names.len() != 2 {
                return Err(malformed(ModelError::Malformed(format!(
                    "{} class names for a binary model",
                    names.len()
                ))));
            }
        }
        Ok(())
    }

    /// Fails unless the artifact belongs to `disease` and its feature order
    /// equals `expected`.
    pub fn check_schema(&self, disease: &str, expected: &[String]) -> Result<(), ArtifactError> {
        if self.disease != disease {
            return Err(ArtifactError::WrongDisease {
                expected: disease.to_string(),
                found: self.disease.clone(),
            });
        }
        if self.feature_names != expected {
            return Err(ArtifactError::SchemaMismatch {
                disease: disease.to_string(),
                expected: expected.to_vec(),
                found: self.feature_names.clone(),
            });
        }
        Ok(())
    }
}
