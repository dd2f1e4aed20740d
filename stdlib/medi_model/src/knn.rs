use serde::{Deserialize, Serialize};

use crate::classifier::{
    argmax, check_classes, check_matrix, check_rows, check_training, squared_distance,
    Classifier, ModelError, ProbabilisticClassifier,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnConfig {
    pub k: usize,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self { k: 5 }
    }
}

/// Uniform-vote k-nearest-neighbours under Euclidean distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNearestNeighbors {
    k: usize,
    classes: Vec<f64>,
    rows: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl KNearestNeighbors {
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &KnnConfig) -> Result<Self, ModelError> {
        let (_, classes) = check_training(x, y)?;
        if config.k == 0 || config.k > x.len() {
            return Err(ModelError::TooFewSamples {
                k: config.k,
                n: x.len(),
            });
        }
        Ok(Self {
            k: config.k,
            labels: crate::tree::encode_labels(y, &classes),
            classes,
            rows: x.to_vec(),
        })
    }

    pub(crate) fn validate(&self) -> Result<usize, ModelError> {
        check_classes(&self.classes)?;
        let d = check_matrix(&self.rows, "training rows")?;
        if self.labels.len() != self.rows.len() {
            return Err(ModelError::Malformed(format!(
                "{} labels for {} training rows",
                self.labels.len(),
                self.rows.len()
            )));
        }
        if let Some(l) = self.labels.iter().find(|&&l| l >= self.classes.len()) {
            return Err(ModelError::Malformed(format!(
                "label index {l} out of {} classes",
                self.classes.len()
            )));
        }
        if self.k == 0 || self.k > self.rows.len() {
            return Err(ModelError::TooFewSamples {
                k: self.k,
                n: self.rows.len(),
            });
        }
        Ok(d)
    }

    fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    fn votes(&self, row: &[f64]) -> Vec<f64> {
        let mut dist: Vec<(f64, usize)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (squared_distance(r, row), i))
            .collect();
        // ties resolved by training order
        dist.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut votes = vec![0.0; self.classes.len()];
        for &(_, i) in dist.iter().take(self.k) {
            votes[self.labels[i]] += 1.0;
        }
        votes.iter_mut().for_each(|v| *v /= self.k as f64);
        votes
    }
}

impl Classifier for KNearestNeighbors {
    fn classes(&self) -> &[f64] {
        &self.classes
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        check_rows(rows, self.width())?;
        Ok(rows
            .iter()
            .map(|r| self.classes[argmax(&self.votes(r))])
            .collect())
    }
}

impl ProbabilisticClassifier for KNearestNeighbors {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        check_rows(rows, self.width())?;
        Ok(rows.iter().map(|r| self.votes(r)).collect())
    }
}
