//! Classical binary classifiers for Medi
//!
//! Provides the five learners used for disease screening (random forest,
//! logistic regression, RBF support vector machine, CART decision tree and
//! k-nearest neighbours) plus a label-only nearest-centroid model. Fitted
//! models are exposed through [`ClassifierHandle`], which states whether a
//! model yields probabilities, decision scores or labels only, and are stored
//! as JSON [`ModelArtifact`]s carrying their feature schema.
//!
//! ```
//! use medi_model::{Algorithm, ClassifierHandle, ProbabilisticClassifier, TrainingSet};
//! let x = vec![vec![0.0], vec![1.0], vec![9.0], vec![10.0]];
//! let y = vec![0.0, 0.0, 1.0, 1.0];
//! let model = Algorithm::DecisionTree.trainer(42).fit(&TrainingSet::new(&x, &y)).unwrap();
//! match model.into_handle() {
//!     ClassifierHandle::Probabilistic(m) => {
//!         let p = m.predict_proba(&[vec![9.5]]).unwrap();
//!         assert_eq!(p[0], vec![0.0, 1.0]);
//!     }
//!     _ => unreachable!(),
//! }
//! ```

pub mod artifact;
pub mod calibration;
pub mod centroid;
pub mod classifier;
pub mod forest;
pub mod knn;
pub mod logistic;
pub mod model;
pub mod registry;
pub mod scaler;
pub mod svm;
pub mod tree;

pub use artifact::{ArtifactError, ModelArtifact};
pub use calibration::PlattScaling;
pub use classifier::{
    Capability, Classifier, ClassifierHandle, ModelError, ProbabilisticClassifier,
    ScoringClassifier,
};
pub use model::{default_panel, Algorithm, FittedModel, Trainer, TrainingSet, UnknownAlgorithm};
pub use registry::{ClassifierRegistry, LoadReport, LoadedModel};
pub use scaler::StandardScaler;
