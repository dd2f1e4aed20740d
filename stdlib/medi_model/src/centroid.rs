use serde::{Deserialize, Serialize};

use crate::classifier::{
    check_classes, check_matrix, check_rows, check_training, squared_distance, Classifier,
    ModelError,
};

/// Assigns each row to the class with the nearest mean. Produces labels only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroid {
    classes: Vec<f64>,
    centroids: Vec<Vec<f64>>,
}

impl NearestCentroid {
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self, ModelError> {
        let (d, classes) = check_training(x, y)?;
        let mut centroids = vec![vec![0.0; d]; classes.len()];
        let mut counts = vec![0usize; classes.len()];
        for (row, label) in x.iter().zip(y) {
            let c = classes.iter().position(|k| k == label).unwrap_or(0);
            counts[c] += 1;
            for (acc, v) in centroids[c].iter_mut().zip(row) {
                *acc += v;
            }
        }
        for (centroid, n) in centroids.iter_mut().zip(&counts) {
            centroid.iter_mut().for_each(|v| *v /= *n as f64);
        }
        Ok(Self { classes, centroids })
    }
}

impl NearestCentroid {
    pub(crate) fn validate(&self) -> Result<usize, ModelError> {
        check_classes(&self.classes)?;
        let d = check_matrix(&self.centroids, "centroids")?;
        if self.centroids.len() != self.classes.len() {
            return Err(ModelError::Malformed(format!(
                "{} centroids for {} classes",
                self.centroids.len(),
                self.classes.len()
            )));
        }
        Ok(d)
    }
}

impl Classifier for NearestCentroid {
    fn classes(&self) -> &[f64] {
        &self.classes
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        check_rows(rows, self.centroids.first().map_or(0, Vec::len))?;
        Ok(rows
            .iter()
            .map(|r| {
                let mut best = 0;
                let mut best_d = f64::INFINITY;
                for (i, c) in self.centroids.iter().enumerate() {
                    let d = squared_distance(c, r);
                    if d < best_d {
                        best = i;
                        best_d = d;
                    }
                }
                self.classes[best]
            })
            .collect())
    }
}
