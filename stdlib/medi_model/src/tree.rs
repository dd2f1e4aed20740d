//! CART decision tree with Gini impurity.
//!
//! Nodes live in a flat arena. Leaves keep the class distribution of the
//! training rows that reached them, which is what `predict_proba` returns.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::classifier::{
    argmax, check_classes, check_rows, check_training, Classifier, ModelError,
    ProbabilisticClassifier,
};

/// Values closer than this are treated as equal when searching thresholds.
const FEATURE_THRESHOLD: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features examined per split; `None` examines all of them.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    classes: Vec<f64>,
    n_features: usize,
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &TreeConfig) -> Result<Self, ModelError> {
        let (d, classes) = check_training(x, y)?;
        let labels = encode_labels(y, &classes);
        let mut indices: Vec<usize> = (0..x.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self::grow(x, &labels, &classes, d, &mut indices, config, &mut rng))
    }

    /// Grow on a (possibly repeated) subset of rows. Inputs are already checked.
    pub(crate) fn grow(
        x: &[Vec<f64>],
        labels: &[usize],
        classes: &[f64],
        n_features: usize,
        indices: &mut [usize],
        config: &TreeConfig,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut builder = Builder {
            x,
            labels,
            n_classes: classes.len(),
            n_features,
            max_features: config
                .max_features
                .unwrap_or(n_features)
                .clamp(1, n_features.max(1)),
            config,
            nodes: Vec::new(),
        };
        builder.build(indices, 0, rng);
        Self {
            classes: classes.to_vec(),
            n_features,
            nodes: builder.nodes,
        }
    }

    pub(crate) fn distribution(&self, row: &[f64]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Checks a deserialised tree and returns its input width. Children
    /// must come after their parent, so every walk from the root ends.
    pub(crate) fn validate(&self) -> Result<usize, ModelError> {
        check_classes(&self.classes)?;
        if self.nodes.is_empty() {
            return Err(ModelError::Malformed("tree has no nodes".into()));
        }
        let n = self.nodes.len();
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { distribution } => {
                    if distribution.len() != self.classes.len() {
                        return Err(ModelError::Malformed(format!(
                            "leaf {id} holds {} probabilities for {} classes",
                            distribution.len(),
                            self.classes.len()
                        )));
                    }
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= self.n_features {
                        return Err(ModelError::Malformed(format!(
                            "node {id} splits on feature {feature} of {}",
                            self.n_features
                        )));
                    }
                    if let Some(child) = [*left, *right].into_iter().find(|&c| c <= id || c >= n) {
                        return Err(ModelError::Malformed(format!(
                            "node {id} points at child {child} of {n} nodes"
                        )));
                    }
                }
            }
        }
        Ok(self.n_features)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Classifier for DecisionTree {
    fn classes(&self) -> &[f64] {
        &self.classes
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        check_rows(rows, self.n_features)?;
        Ok(rows
            .iter()
            .map(|r| self.classes[argmax(self.distribution(r))])
            .collect())
    }
}

impl ProbabilisticClassifier for DecisionTree {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        check_rows(rows, self.n_features)?;
        Ok(rows.iter().map(|r| self.distribution(r).to_vec()).collect())
    }
}

pub(crate) fn encode_labels(y: &[f64], classes: &[f64]) -> Vec<usize> {
    y.iter()
        .map(|v| classes.iter().position(|c| c == v).unwrap_or(0))
        .collect()
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
    config: &'a TreeConfig,
    nodes: Vec<Node>,
}

struct BestSplit {
    weighted_gini: f64,
    feature: usize,
    threshold: f64,
}

impl Builder<'_> {
    fn counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += 1;
        }
        counts
    }

    fn build(&mut self, indices: &mut [usize], depth: usize, rng: &mut ChaCha8Rng) -> usize {
        let counts = self.counts(indices);
        let n = indices.len();
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.config.max_depth.is_some_and(|m| depth >= m);

        let split = if pure || depth_reached || n < self.config.min_samples_split.max(2) {
            None
        } else {
            self.best_split(indices, &counts, rng)
        };

        let Some(split) = split else {
            let distribution = counts.iter().map(|&c| c as f64 / n as f64).collect();
            self.nodes.push(Node::Leaf { distribution });
            return self.nodes.len() - 1;
        };

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });

        let mut mid = 0;
        for k in 0..n {
            if self.x[indices[k]][split.feature] <= split.threshold {
                indices.swap(k, mid);
                mid += 1;
            }
        }
        let (lo, hi) = indices.split_at_mut(mid);
        let left = self.build(lo, depth + 1, rng);
        let right = self.build(hi, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(
        &self,
        indices: &[usize],
        parent: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);

        let mut best: Option<BestSplit> = None;
        let mut examined = 0;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);
        for feature in features {
            if examined >= self.max_features {
                break;
            }
            sorted.clear();
            sorted.extend(indices.iter().map(|&i| (self.x[i][feature], self.labels[i])));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
            if sorted[n - 1].0 <= sorted[0].0 + FEATURE_THRESHOLD {
                // constant features do not count towards max_features
                continue;
            }
            examined += 1;

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent.to_vec();
            for p in 0..n - 1 {
                let (value, class) = sorted[p];
                left[class] += 1;
                right[class] -= 1;
                let next = sorted[p + 1].0;
                if next <= value + FEATURE_THRESHOLD {
                    continue;
                }
                let n_left = p + 1;
                let score = weighted_gini(&left, n_left) + weighted_gini(&right, n - n_left);
                if best.as_ref().map_or(true, |b| score < b.weighted_gini) {
                    let mut threshold = value / 2.0 + next / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(BestSplit {
                        weighted_gini: score,
                        feature,
                        threshold,
                    });
                }
            }
        }
        best
    }
}

/// `n * gini(counts)`, so child impurities add up without renormalising.
fn weighted_gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = counts.iter().map(|&c| (c * c) as f64).sum();
    n as f64 - sum_sq / n as f64
}
