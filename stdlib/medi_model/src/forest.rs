//! Bagged CART ensemble.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classifier::{
    argmax, check_classes, check_rows, check_training, Classifier, ModelError,
    ProbabilisticClassifier,
};
use crate::tree::{encode_labels, DecisionTree, TreeConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub bootstrap: bool,
    /// Features examined per split; `None` uses `floor(sqrt(d))`.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            bootstrap: true,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    classes: Vec<f64>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Trees are grown in parallel. Each draws from its own generator seeded
    /// from `config.seed`, so the forest does not depend on scheduling.
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &ForestConfig) -> Result<Self, ModelError> {
        let (d, classes) = check_training(x, y)?;
        let labels = encode_labels(y, &classes);
        let max_features = config
            .max_features
            .unwrap_or_else(|| (d as f64).sqrt().floor() as usize)
            .max(1);

        let mut master = ChaCha8Rng::seed_from_u64(config.seed);
        let seeds: Vec<u64> = (0..config.n_trees.max(1)).map(|_| master.gen()).collect();

        let n = x.len();
        let trees: Vec<DecisionTree> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut indices: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                let tree_config = TreeConfig {
                    max_features: Some(max_features),
                    seed,
                    ..TreeConfig::default()
                };
                DecisionTree::grow(x, &labels, &classes, d, &mut indices, &tree_config, &mut rng)
            })
            .collect();

        log::debug!(
            "grew {} trees on {} rows ({} features, {} per split)",
            trees.len(),
            n,
            d,
            max_features
        );
        Ok(Self {
            classes,
            n_features: d,
            trees,
        })
    }

    pub(crate) fn validate(&self) -> Result<usize, ModelError> {
        check_classes(&self.classes)?;
        if self.trees.is_empty() {
            return Err(ModelError::Malformed("forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            let d = tree.validate()?;
            if d != self.n_features || tree.classes() != self.classes.as_slice() {
                return Err(ModelError::Malformed(format!(
                    "tree {i} does not match the forest's classes or {} features",
                    self.n_features
                )));
            }
        }
        Ok(self.n_features)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn mean_distribution(&self, row: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.distribution(row)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }
}

impl Classifier for RandomForest {
    fn classes(&self) -> &[f64] {
        &self.classes
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        check_rows(rows, self.n_features)?;
        Ok(rows
            .iter()
            .map(|r| self.classes[argmax(&self.mean_distribution(r))])
            .collect())
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        check_rows(rows, self.n_features)?;
        Ok(rows.par_iter().map(|r| self.mean_distribution(r)).collect())
    }
}
