//! Predictions for a single submitted form.
//!
//! [`positive_probability`] reads the positive-class probability from
//! whatever capability a classifier has and never fails; [`Predictor`]
//! chains validation, the model call and the diagnosis text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use medi_data::dataset::positive_class;
use medi_data::{
    validate, DiseaseRegistry, InputVector, MissingInput, RegistryError, ValidationResult,
};
use medi_model::classifier::sigmoid;
use medi_model::{ClassifierHandle, ClassifierRegistry, ModelError};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("no model is loaded for '{0}'")]
    ModelUnavailable(String),
    #[error(transparent)]
    MissingInput(#[from] MissingInput),
    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),
}

/// Probability of the positive class for one row, or `None` when the model
/// cannot provide one.
///
/// Probabilistic models report the column of label `1`, or column 1 when
/// there is no such label. Scoring models have their decision score mapped
/// through the logistic function. Label-only models, failures and values
/// outside `[0, 1]` give `None`.
pub fn positive_probability(handle: &ClassifierHandle, row: &[f64]) -> Option<f64> {
    let rows = [row.to_vec()];
    let p = match handle {
        ClassifierHandle::Probabilistic(m) => {
            let dist = m.predict_proba(&rows).ok()?.into_iter().next()?;
            let idx = m.classes().iter().position(|&c| c == 1.0).unwrap_or(1);
            *dist.get(idx)?
        }
        ClassifierHandle::Scoring(m) => {
            let score = m.decision_function(&rows).ok()?.into_iter().next()?;
            let classes = m.classes();
            let p = sigmoid(score);
            if classes.first() == Some(&positive_class(classes)) {
                1.0 - p
            } else {
                p
            }
        }
        ClassifierHandle::LabelOnly(_) => return None,
    };
    (p.is_finite() && (0.0..=1.0).contains(&p)).then_some(p)
}

/// [`positive_probability`], or 1.0 / 0.0 from the hard `label` when absent.
pub fn displayed_probability(handle: &ClassifierHandle, row: &[f64], label: f64) -> f64 {
    positive_probability(handle, row).unwrap_or_else(|| {
        if label == positive_class(handle.classes()) {
            1.0
        } else {
            0.0
        }
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub disease: String,
    pub label: f64,
    /// Original target string when the training target was text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_name: Option<String>,
    pub positive: bool,
    pub probability: f64,
    /// False when `probability` was derived from the hard label.
    pub estimated: bool,
    pub diagnosis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Input failed validation; no model was called.
    Rejected(ValidationResult),
    Predicted(Prediction),
}

/// Validates, predicts and phrases the result for one disease page.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    diseases: &'a DiseaseRegistry,
    models: &'a ClassifierRegistry,
}

impl<'a> Predictor<'a> {
    pub fn new(diseases: &'a DiseaseRegistry, models: &'a ClassifierRegistry) -> Self {
        Self { diseases, models }
    }

    /// `disease` is a key or a page title, matched case-insensitively.
    pub fn predict(&self, disease: &str, input: &InputVector) -> Result<Outcome, PredictError> {
        let profile = self
            .diseases
            .find(disease)
            .ok_or_else(|| RegistryError::UnknownDisease(disease.to_string()))?;

        let verdict = validate(self.diseases, &profile.key, input);
        if !verdict.valid {
            log::info!("rejected input for '{}': {}", profile.key, verdict.message);
            return Ok(Outcome::Rejected(verdict));
        }

        let model = self
            .models
            .get(&profile.key)
            .ok_or_else(|| PredictError::ModelUnavailable(profile.key.clone()))?;
        let row = input.to_row(&model.feature_names)?;
        let label = model
            .handle
            .predict(std::slice::from_ref(&row))?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Numerical("model returned no prediction".into()))?;

        let positive = label == positive_class(model.handle.classes());
        let estimate = positive_probability(&model.handle, &row);
        let probability = estimate.unwrap_or(if positive { 1.0 } else { 0.0 });
        let label_name = model.class_names.as_ref().and_then(|names| {
            let idx = model.handle.classes().iter().position(|&c| c == label)?;
            names.get(idx).cloned()
        });
        log::debug!(
            "{} via {}: label {} p={:.3}{}",
            profile.key,
            model.algorithm,
            label,
            probability,
            if estimate.is_none() { " (fallback)" } else { "" }
        );

        Ok(Outcome::Predicted(Prediction {
            disease: profile.key.clone(),
            label,
            label_name,
            positive,
            probability,
            estimated: estimate.is_some(),
            diagnosis: profile.diagnosis.render(positive, probability),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medi_model::{Classifier, ProbabilisticClassifier, ScoringClassifier};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct FixedProba {
        classes: Vec<f64>,
        dist: Vec<f64>,
    }

    impl Classifier for FixedProba {
        fn classes(&self) -> &[f64] {
            &self.classes
        }
        fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            Ok(vec![self.classes[1]; rows.len()])
        }
    }

    impl ProbabilisticClassifier for FixedProba {
        fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
            Ok(vec![self.dist.clone(); rows.len()])
        }
    }

    struct FixedScore {
        classes: Vec<f64>,
        score: f64,
    }

    impl Classifier for FixedScore {
        fn classes(&self) -> &[f64] {
            &self.classes
        }
        fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            let label = if self.score > 0.0 { self.classes[1] } else { self.classes[0] };
            Ok(vec![label; rows.len()])
        }
    }

    impl ScoringClassifier for FixedScore {
        fn decision_function(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            Ok(vec![self.score; rows.len()])
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn classes(&self) -> &[f64] {
            &[0.0, 1.0]
        }
        fn predict(&self, _: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            Ok(vec![0.0])
        }
    }

    impl ProbabilisticClassifier for Broken {
        fn predict_proba(&self, _: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
            Err(ModelError::Numerical("boom".into()))
        }
    }

    fn proba(classes: &[f64], dist: &[f64]) -> ClassifierHandle {
        ClassifierHandle::Probabilistic(Arc::new(FixedProba {
            classes: classes.to_vec(),
            dist: dist.to_vec(),
        }))
    }

    #[test]
    fn reads_the_column_of_label_one() {
        assert_eq!(positive_probability(&proba(&[0.0, 1.0], &[0.3, 0.7]), &[1.0]), Some(0.7));
        assert_eq!(positive_probability(&proba(&[1.0, 2.0], &[0.2, 0.8]), &[1.0]), Some(0.2));
    }

    #[test]
    fn falls_back_to_the_second_column() {
        assert_eq!(positive_probability(&proba(&[0.0, 2.0], &[0.4, 0.6]), &[1.0]), Some(0.6));
    }

    #[test]
    fn bad_distributions_give_none() {
        assert_eq!(positive_probability(&proba(&[0.0, 1.0], &[-0.2, 1.2]), &[1.0]), None);
        assert_eq!(positive_probability(&proba(&[0.0, 2.0], &[1.0]), &[1.0]), None);
        let broken = ClassifierHandle::Probabilistic(Arc::new(Broken));
        assert_eq!(positive_probability(&broken, &[1.0]), None);
        assert_eq!(displayed_probability(&broken, &[1.0], 0.0), 0.0);
    }

    #[test]
    fn scores_map_through_the_logistic_function() {
        let zero = ClassifierHandle::Scoring(Arc::new(FixedScore {
            classes: vec![0.0, 1.0],
            score: 0.0,
        }));
        assert_eq!(positive_probability(&zero, &[1.0]), Some(0.5));

        let strong = ClassifierHandle::Scoring(Arc::new(FixedScore {
            classes: vec![0.0, 1.0],
            score: 3.0,
        }));
        let p = positive_probability(&strong, &[1.0]).unwrap();
        assert!(p > 0.95 && p <= 1.0);

        // label 1 is classes[0] here, so a score favouring classes[1] lowers it
        let flipped = ClassifierHandle::Scoring(Arc::new(FixedScore {
            classes: vec![1.0, 2.0],
            score: 3.0,
        }));
        let q = positive_probability(&flipped, &[1.0]).unwrap();
        assert!((p + q - 1.0).abs() < 1e-12);
    }

    #[test]
    fn label_only_models_use_the_hard_label() {
        let handle = ClassifierHandle::LabelOnly(Arc::new(FixedScore {
            classes: vec![0.0, 1.0],
            score: 1.0,
        }));
        assert_eq!(positive_probability(&handle, &[1.0]), None);
        assert_eq!(displayed_probability(&handle, &[1.0], 1.0), 1.0);
        assert_eq!(displayed_probability(&handle, &[1.0], 0.0), 0.0);
    }
}
