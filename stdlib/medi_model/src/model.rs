//! Fitted models, trainers and the default algorithm panel.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::centroid::NearestCentroid;
use crate::classifier::{ClassifierHandle, ModelError};
use crate::forest::{ForestConfig, RandomForest};
use crate::knn::{KNearestNeighbors, KnnConfig};
use crate::logistic::{LogisticConfig, LogisticRegression};
use crate::svm::{SupportVectorMachine, SvmConfig};
use crate::tree::{DecisionTree, TreeConfig};

/// Training rows plus what is known about how they were encoded.
#[derive(Debug, Clone, Copy)]
pub struct TrainingSet<'a> {
    pub x: &'a [Vec<f64>],
    pub y: &'a [f64],
    /// No feature column needed label encoding.
    pub all_numeric: bool,
}

impl<'a> TrainingSet<'a> {
    pub fn new(x: &'a [Vec<f64>], y: &'a [f64]) -> Self {
        Self {
            x,
            y,
            all_numeric: true,
        }
    }
}

/// Any fitted model, serialisable into an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
    Svm(SupportVectorMachine),
    DecisionTree(DecisionTree),
    Knn(KNearestNeighbors),
    NearestCentroid(NearestCentroid),
}

impl FittedModel {
    pub fn into_handle(self) -> ClassifierHandle {
        match self {
            FittedModel::RandomForest(m) => ClassifierHandle::Probabilistic(Arc::new(m)),
            FittedModel::LogisticRegression(m) => ClassifierHandle::Probabilistic(Arc::new(m)),
            FittedModel::Svm(m) if m.has_probabilities() => {
                ClassifierHandle::Probabilistic(Arc::new(m))
            }
            FittedModel::Svm(m) => ClassifierHandle::Scoring(Arc::new(m)),
            FittedModel::DecisionTree(m) => ClassifierHandle::Probabilistic(Arc::new(m)),
            FittedModel::Knn(m) => ClassifierHandle::Probabilistic(Arc::new(m)),
            FittedModel::NearestCentroid(m) => ClassifierHandle::LabelOnly(Arc::new(m)),
        }
    }

    /// Structural check of a model read from disk; returns the number of
    /// input features it expects.
    pub fn validate(&self) -> Result<usize, ModelError> {
        match self {
            FittedModel::RandomForest(m) => m.validate(),
            FittedModel::LogisticRegression(m) => m.validate(),
            FittedModel::Svm(m) => m.validate(),
            FittedModel::DecisionTree(m) => m.validate(),
            FittedModel::Knn(m) => m.validate(),
            FittedModel::NearestCentroid(m) => m.validate(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            FittedModel::RandomForest(_) => Algorithm::RandomForest,
            FittedModel::LogisticRegression(_) => Algorithm::LogisticRegression,
            FittedModel::Svm(_) => Algorithm::SupportVectorMachine,
            FittedModel::DecisionTree(_) => Algorithm::DecisionTree,
            FittedModel::Knn(_) => Algorithm::KNearestNeighbors,
            FittedModel::NearestCentroid(_) => Algorithm::NearestCentroid,
        }
    }
}

/// Something that turns a training set into a fitted model.
pub trait Trainer: Send + Sync {
    fn name(&self) -> &str;

    fn fit(&self, data: &TrainingSet<'_>) -> Result<FittedModel, ModelError>;
}

impl Trainer for ForestConfig {
    fn name(&self) -> &str {
        Algorithm::RandomForest.name()
    }

    fn fit(&self, data: &TrainingSet<'_>) -> Result<FittedModel, ModelError> {
        RandomForest::fit(data.x, data.y, self).map(FittedModel::RandomForest)
    }
}

/// Logistic regression standardises its inputs only when every feature
/// column was numeric to begin with.
impl Trainer for LogisticConfig {
    fn name(&self) -> &str {
        Algorithm::LogisticRegression.name()
    }

    fn fit(&self, data: &TrainingSet<'_>) -> Result<FittedModel, ModelError> {
        let config = LogisticConfig {
            standardize: self.standardize || data.all_numeric,
            ..self.clone()
        };
        LogisticRegression::fit(data.x, data.y, &config).map(FittedModel::LogisticRegression)
    }
}

impl Trainer for SvmConfig {
    fn name(&self) -> &str {
        Algorithm::SupportVectorMachine.name()
    }

    fn fit(&self, data: &TrainingSet<'_>) -> Result<FittedModel, ModelError> {
        SupportVectorMachine::fit(data.x, data.y, self).map(FittedModel::Svm)
    }
}

impl Trainer for TreeConfig {
    fn name(&self) -> &str {
        Algorithm::DecisionTree.name()
    }

    fn fit(&self, data: &TrainingSet<'_>) -> Result<FittedModel, ModelError> {
        DecisionTree::fit(data.x, data.y, self).map(FittedModel::DecisionTree)
    }
}

impl Trainer for KnnConfig {
    fn name(&self) -> &str {
        Algorithm::KNearestNeighbors.name()
    }

    fn fit(&self, data: &TrainingSet<'_>) -> Result<FittedModel, ModelError> {
        KNearestNeighbors::fit(data.x, data.y, self).map(FittedModel::Knn)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CentroidConfig;

impl Trainer for CentroidConfig {
    fn name(&self) -> &str {
        Algorithm::NearestCentroid.name()
    }

    fn fit(&self, data: &TrainingSet<'_>) -> Result<FittedModel, ModelError> {
        NearestCentroid::fit(data.x, data.y).map(FittedModel::NearestCentroid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    RandomForest,
    LogisticRegression,
    SupportVectorMachine,
    DecisionTree,
    KNearestNeighbors,
    NearestCentroid,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::RandomForest,
        Algorithm::LogisticRegression,
        Algorithm::SupportVectorMachine,
        Algorithm::DecisionTree,
        Algorithm::KNearestNeighbors,
        Algorithm::NearestCentroid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::RandomForest => "Random Forest",
            Algorithm::LogisticRegression => "Logistic Regression",
            Algorithm::SupportVectorMachine => "Support Vector Machine",
            Algorithm::DecisionTree => "Decision Tree",
            Algorithm::KNearestNeighbors => "K-Nearest Neighbors",
            Algorithm::NearestCentroid => "Nearest Centroid",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Algorithm::RandomForest => "random-forest",
            Algorithm::LogisticRegression => "logistic-regression",
            Algorithm::SupportVectorMachine => "svm",
            Algorithm::DecisionTree => "decision-tree",
            Algorithm::KNearestNeighbors => "knn",
            Algorithm::NearestCentroid => "nearest-centroid",
        }
    }

    /// Trainer with the panel's default hyperparameters.
    pub fn trainer(self, seed: u64) -> Box<dyn Trainer> {
        match self {
            Algorithm::RandomForest => Box::new(ForestConfig {
                seed,
                ..ForestConfig::default()
            }),
            Algorithm::LogisticRegression => Box::new(LogisticConfig::default()),
            Algorithm::SupportVectorMachine => Box::new(SvmConfig::default()),
            Algorithm::DecisionTree => Box::new(TreeConfig {
                seed,
                ..TreeConfig::default()
            }),
            Algorithm::KNearestNeighbors => Box::new(KnnConfig::default()),
            Algorithm::NearestCentroid => Box::new(CentroidConfig),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown algorithm '{0}'")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Algorithm::ALL
            .into_iter()
            .find(|a| a.slug().eq_ignore_ascii_case(wanted) || a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

/// Random forest, logistic regression, SVM, decision tree and 5-NN, in that order.
pub fn default_panel(seed: u64) -> Vec<Box<dyn Trainer>> {
    [
        Algorithm::RandomForest,
        Algorithm::LogisticRegression,
        Algorithm::SupportVectorMachine,
        Algorithm::DecisionTree,
        Algorithm::KNearestNeighbors,
    ]
    .into_iter()
    .map(|a| a.trainer(seed))
    .collect()
}
