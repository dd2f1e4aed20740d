//! Classifier capabilities.
//!
//! Every fitted model predicts labels. Some can also estimate class
//! probabilities, others only produce a signed decision score. Callers learn
//! which by matching on [`ClassifierHandle`] instead of probing at runtime.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("{rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("expected {expected} features, found {found}")]
    FeatureCount { expected: usize, found: usize },
    #[error("non-finite value in row {row}, feature {feature}")]
    NonFinite { row: usize, feature: usize },
    #[error("binary classification needs exactly 2 classes, found {0}")]
    NotBinary(usize),
    #[error("n_neighbors = {k} exceeds the {n} training rows")]
    TooFewSamples { k: usize, n: usize },
    #[error("{0} does not estimate probabilities")]
    NoProbabilities(&'static str),
    #[error("numerical failure: {0}")]
    Numerical(String),
    #[error("malformed model: {0}")]
    Malformed(String),
}

/// Label prediction, the capability every model has.
pub trait Classifier: Send + Sync {
    /// Sorted class labels.
    fn classes(&self) -> &[f64];

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}

pub trait ProbabilisticClassifier: Classifier {
    /// One distribution per row, indexed like [`Classifier::classes`].
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError>;
}

pub trait ScoringClassifier: Classifier {
    /// Signed confidence per row; positive values favour `classes()[1]`.
    fn decision_function(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Probabilistic,
    Scoring,
    LabelOnly,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Probabilistic => "probabilities",
            Capability::Scoring => "decision scores",
            Capability::LabelOnly => "labels only",
        };
        f.write_str(s)
    }
}

/// A shared, read-only fitted classifier tagged with its strongest capability.
#[derive(Clone)]
pub enum ClassifierHandle {
    Probabilistic(Arc<dyn ProbabilisticClassifier>),
    Scoring(Arc<dyn ScoringClassifier>),
    LabelOnly(Arc<dyn Classifier>),
}

impl ClassifierHandle {
    pub fn capability(&self) -> Capability {
        match self {
            ClassifierHandle::Probabilistic(_) => Capability::Probabilistic,
            ClassifierHandle::Scoring(_) => Capability::Scoring,
            ClassifierHandle::LabelOnly(_) => Capability::LabelOnly,
        }
    }

    pub fn classes(&self) -> &[f64] {
        match self {
            ClassifierHandle::Probabilistic(m) => m.classes(),
            ClassifierHandle::Scoring(m) => m.classes(),
            ClassifierHandle::LabelOnly(m) => m.classes(),
        }
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        match self {
            ClassifierHandle::Probabilistic(m) => m.predict(rows),
            ClassifierHandle::Scoring(m) => m.predict(rows),
            ClassifierHandle::LabelOnly(m) => m.predict(rows),
        }
    }
}

impl fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("capability", &self.capability())
            .field("classes", &self.classes())
            .finish()
    }
}

/// Checks a training matrix and returns `(n_features, sorted classes)`.
pub(crate) fn check_training(x: &[Vec<f64>], y: &[f64]) -> Result<(usize, Vec<f64>), ModelError> {
    if x.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(ModelError::LengthMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }
    let d = x[0].len();
    check_rows(x, d)?;
    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite { row, feature: d });
    }
    let classes = medi_data::dataset::distinct_sorted(y);
    if classes.len() != 2 {
        return Err(ModelError::NotBinary(classes.len()));
    }
    Ok((d, classes))
}

pub(crate) fn check_rows(rows: &[Vec<f64>], d: usize) -> Result<(), ModelError> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != d {
            return Err(ModelError::FeatureCount {
                expected: d,
                found: row.len(),
            });
        }
        if let Some(j) = row.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite { row: i, feature: j });
        }
    }
    Ok(())
}

/// Structural checks for a deserialised model whose fields were never
/// produced by `fit`.
pub(crate) fn check_classes(classes: &[f64]) -> Result<(), ModelError> {
    if classes.len() != 2 {
        return Err(ModelError::Malformed(format!(
            "expected 2 classes, found {}",
            classes.len()
        )));
    }
    Ok(())
}

/// Width shared by every row of a stored matrix; `what` names it in errors.
pub(crate) fn check_matrix(rows: &[Vec<f64>], what: &str) -> Result<usize, ModelError> {
    let Some(first) = rows.first() else {
        return Err(ModelError::Malformed(format!("{what} is empty")));
    };
    let d = first.len();
    if let Some(i) = rows.iter().position(|r| r.len() != d) {
        return Err(ModelError::Malformed(format!(
            "{what} row {i} has {} values, expected {d}",
            rows[i].len()
        )));
    }
    Ok(d)
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Logistic function, evaluated without overflow for large `|z|`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl Classifier for Fixed {
        fn classes(&self) -> &[f64] {
            &[0.0, 1.0]
        }

        fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            Ok(vec![1.0; rows.len()])
        }
    }

    #[test]
    fn handle_reports_capability_and_delegates() {
        let h = ClassifierHandle::LabelOnly(Arc::new(Fixed));
        assert_eq!(h.capability(), Capability::LabelOnly);
        assert_eq!(h.classes(), &[0.0, 1.0]);
        assert_eq!(h.predict(&[vec![0.0]]).unwrap(), vec![1.0]);
    }

    #[test]
    fn training_checks() {
        assert_eq!(check_training(&[], &[]), Err(ModelError::EmptyTrainingSet));
        assert_eq!(
            check_training(&[vec![1.0], vec![f64::NAN]], &[0.0, 1.0]),
            Err(ModelError::NonFinite { row: 1, feature: 0 })
        );
        assert_eq!(
            check_training(&[vec![1.0], vec![2.0]], &[1.0, 1.0]),
            Err(ModelError::NotBinary(1))
        );
        assert_eq!(
            check_training(&[vec![1.0], vec![2.0]], &[0.0, 1.0]),
            Ok((1, vec![0.0, 1.0]))
        );
    }

    #[test]
    fn stored_shapes_are_checked() {
        assert!(check_classes(&[0.0, 1.0]).is_ok());
        assert!(matches!(check_classes(&[1.0]), Err(ModelError::Malformed(_))));
        assert_eq!(check_matrix(&[vec![1.0, 2.0], vec![3.0, 4.0]], "rows"), Ok(2));
        assert_eq!(
            check_matrix(&[], "centroids"),
            Err(ModelError::Malformed("centroids is empty".into()))
        );
        assert!(check_matrix(&[vec![1.0], vec![1.0, 2.0]], "rows").is_err());
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.2, 0.8]), 1);
    }
}
