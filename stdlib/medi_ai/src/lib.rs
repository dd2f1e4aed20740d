//! Disease screening services built on `medi_data` and `medi_model`.
//!
//! - [`predict`]: positive-class probability extraction and the
//!   validate/predict/diagnose flow for one form submission
//! - [`bench`]: the five-algorithm benchmark per dataset and its
//!   cross-disease aggregation
//! - [`metrics`]: confusion matrix, F1, ROC curve and ROC-AUC
//! - [`report`]: PDF result reports with a plain-text fallback
//! - [`assistant`] and [`session`]: the rule-based chat assistant and the
//!   per-user state it works with
//!
//! ```
//! use medi_ai::metrics::{roc_auc, ConfusionMatrix};
//! let m = ConfusionMatrix::from_labels(&[1.0, 0.0, 1.0], &[1.0, 0.0, 0.0], 1.0).unwrap();
//! assert_eq!(m.rows(), [[1, 0], [1, 1]]);
//! assert_eq!(roc_auc(&[true, false], &[0.8, 0.2]).unwrap(), Some(1.0));
//! ```

pub mod assistant;
pub mod bench;
pub mod metrics;
pub mod predict;
pub mod report;
pub mod session;

pub use assistant::{reply, AssistantState, Conversation, Role, Topic, Turn};
pub use bench::{
    aggregate, best_by_f1, AlgorithmBench, AlgorithmSummary, BenchError, BenchRun, DiseaseBench,
    MetricRecord,
};
pub use metrics::{ConfusionMatrix, MetricError};
pub use predict::{
    displayed_probability, positive_probability, Outcome, PredictError, Prediction, Predictor,
};
pub use report::{render_report, RenderError, Report, ReportKind};
pub use session::{Session, SessionError, SessionUser};
