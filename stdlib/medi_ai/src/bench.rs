//! Cross-algorithm benchmarking on disease datasets.
//!
//! [`AlgorithmBench::evaluate`] loads a CSV, label-encodes text columns and
//! makes one seeded stratified split. The returned [`BenchRun`] then fits and
//! scores one panel entry per `next()`; an entry that fails is logged and
//! skipped.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use medi_data::split::{DEFAULT_SEED, DEFAULT_TEST_FRACTION};
use medi_data::{stratified_split, DataError, Dataset, DiseaseProfile, DiseaseRegistry, Table};
use medi_model::{default_panel, ClassifierHandle, ModelError, Trainer, TrainingSet};

use crate::metrics::{roc_auc, roc_curve, trapezoid, ConfusionMatrix, MetricError};

/// Scores of one algorithm on one test split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub algorithm: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: Option<f64>,
    pub confusion_matrix: ConfusionMatrix,
    /// `(fpr, tpr)` points; absent when only hard labels were available.
    pub roc_curve: Option<Vec<(f64, f64)>>,
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Metric(#[from] MetricError),
}

/// A fixed panel of trainers plus the split settings shared by every run.
pub struct AlgorithmBench {
    panel: Vec<Box<dyn Trainer>>,
    seed: u64,
    test_fraction: f64,
}

impl Default for AlgorithmBench {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl AlgorithmBench {
    /// The default five-algorithm panel, split and models seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_panel(default_panel(seed), seed)
    }

    pub fn with_panel(panel: Vec<Box<dyn Trainer>>, seed: u64) -> Self {
        Self {
            panel,
            seed,
            test_fraction: DEFAULT_TEST_FRACTION,
        }
    }

    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn panel_names(&self) -> Vec<&str> {
        self.panel.iter().map(|t| t.name()).collect()
    }

    /// Load `path` and prepare a run over `features` against `target`.
    ///
    /// Errors here (unreadable file, missing column, non-binary target, a
    /// class too small to stratify) are fatal for the whole call.
    pub fn evaluate(
        &self,
        path: impl AsRef<Path>,
        features: &[String],
        target: &str,
    ) -> Result<BenchRun<'_>, DataError> {
        let data = Dataset::load(path, features, target)?;
        self.evaluate_dataset(&data)
    }

    /// Like [`evaluate`](Self::evaluate) for a disease profile, keeping only
    /// the profile's feature columns that exist in the file.
    pub fn evaluate_profile(
        &self,
        data_dir: impl AsRef<Path>,
        profile: &DiseaseProfile,
    ) -> Result<BenchRun<'_>, DataError> {
        let path = data_dir.as_ref().join(&profile.dataset.file);
        let table = Table::from_path(&path)?;
        let features: Vec<String> = profile
            .dataset
            .feature_columns
            .iter()
            .filter(|c| {
                let present = table.has_column(c);
                if !present {
                    log::debug!("{}: column '{}' not in {}", profile.key, c, path.display());
                }
                present
            })
            .cloned()
            .collect();
        let data = Dataset::from_table(&table, &features, &profile.dataset.target_column)?;
        self.evaluate_dataset(&data)
    }

    pub fn evaluate_dataset(&self, data: &Dataset) -> Result<BenchRun<'_>, DataError> {
        let split = stratified_split(&data.target, self.test_fraction, self.seed)?;
        let (train_x, train_y) = data.select(&split.train);
        let (test_x, test_y) = data.select(&split.test);
        log::info!(
            "benchmarking {} algorithms on {} train / {} test rows",
            self.panel.len(),
            train_y.len(),
            test_y.len()
        );
        Ok(BenchRun {
            panel: self.panel.iter(),
            train_x,
            train_y,
            test_x,
            test_y,
            positive: data.positive_class(),
            all_numeric: data.all_numeric,
            failures: Vec::new(),
        })
    }

    /// Run the bench on every disease in `registry` whose dataset is in `data_dir`.
    pub fn evaluate_all(
        &self,
        registry: &DiseaseRegistry,
        data_dir: impl AsRef<Path>,
    ) -> Vec<DiseaseBench> {
        let data_dir = data_dir.as_ref();
        registry
            .profiles()
            .iter()
            .map(|profile| {
                let outcome = self.evaluate_profile(data_dir, profile).map(|mut run| {
                    let records: Vec<MetricRecord> = run.by_ref().collect();
                    let failures = run
                        .failures()
                        .iter()
                        .map(|(name, e)| (name.clone(), e.to_string()))
                        .collect();
                    (records, failures)
                });
                let (outcome, failures) = match outcome {
                    Ok((records, failures)) => (Ok(records), failures),
                    Err(e) => {
                        log::warn!("{}: dataset unavailable: {e}", profile.key);
                        (Err(e), Vec::new())
                    }
                };
                DiseaseBench {
                    disease: profile.key.clone(),
                    title: profile.title.clone(),
                    outcome,
                    failures,
                }
            })
            .collect()
    }
}

/// A benchmark in progress: yields one [`MetricRecord`] per panel entry that
/// trains and scores successfully, in panel order.
pub struct BenchRun<'a> {
    panel: std::slice::Iter<'a, Box<dyn Trainer>>,
    train_x: Vec<Vec<f64>>,
    train_y: Vec<f64>,
    test_x: Vec<Vec<f64>>,
    test_y: Vec<f64>,
    positive: f64,
    all_numeric: bool,
    failures: Vec<(String, BenchError)>,
}

impl BenchRun<'_> {
    pub fn test_size(&self) -> usize {
        self.test_y.len()
    }

    pub fn train_size(&self) -> usize {
        self.train_y.len()
    }

    pub fn test_labels(&self) -> &[f64] {
        &self.test_y
    }

    /// Algorithms skipped so far, with the reason.
    pub fn failures(&self) -> &[(String, BenchError)] {
        &self.failures
    }

    fn score(&self, trainer: &dyn Trainer) -> Result<MetricRecord, BenchError> {
        let data = TrainingSet {
            x: &self.train_x,
            y: &self.train_y,
            all_numeric: self.all_numeric,
        };
        let handle = trainer.fit(&data)?.into_handle();
        let predicted = handle.predict(&self.test_x)?;
        let cm = ConfusionMatrix::from_labels(&self.test_y, &predicted, self.positive)?;

        let truth: Vec<bool> = self.test_y.iter().map(|&y| y == self.positive).collect();
        let (roc_auc, roc_curve) = match self.ranking_scores(&handle) {
            Ranking::Scores(scores) => match roc_curve(&truth, &scores) {
                Ok(Some(curve)) => (Some(trapezoid(&curve)), Some(curve)),
                Ok(None) => (None, None),
                Err(e) => {
                    log::debug!("{}: no ROC curve: {e}", trainer.name());
                    (None, None)
                }
            },
            Ranking::Labels => {
                let hard: Vec<f64> = predicted
                    .iter()
                    .map(|&p| if p == self.positive { 1.0 } else { 0.0 })
                    .collect();
                (roc_auc(&truth, &hard).ok().flatten(), None)
            }
            Ranking::Unavailable => (None, None),
        };

        Ok(MetricRecord {
            algorithm: trainer.name().to_string(),
            accuracy: cm.accuracy(),
            precision: cm.precision(),
            recall: cm.recall(),
            f1: cm.f1(),
            roc_auc,
            confusion_matrix: cm,
            roc_curve,
        })
    }

    /// Positive-class probabilities, else decision scores oriented towards
    /// the positive class, else a signal to rank by hard labels.
    fn ranking_scores(&self, handle: &ClassifierHandle) -> Ranking {
        let classes = handle.classes();
        match handle {
            ClassifierHandle::Probabilistic(m) => {
                let Some(col) = classes.iter().position(|&c| c == self.positive) else {
                    return Ranking::Unavailable;
                };
                match m.predict_proba(&self.test_x) {
                    Ok(dist) => dist
                        .iter()
                        .map(|d| d.get(col).copied())
                        .collect::<Option<Vec<f64>>>()
                        .map_or(Ranking::Unavailable, Ranking::Scores),
                    Err(e) => {
                        log::debug!("predict_proba failed: {e}");
                        Ranking::Unavailable
                    }
                }
            }
            ClassifierHandle::Scoring(m) => match m.decision_function(&self.test_x) {
                Ok(mut scores) => {
                    if classes.first() == Some(&self.positive) {
                        scores.iter_mut().for_each(|s| *s = -*s);
                    }
                    Ranking::Scores(scores)
                }
                Err(e) => {
                    log::debug!("decision_function failed: {e}");
                    Ranking::Unavailable
                }
            },
            ClassifierHandle::LabelOnly(_) => Ranking::Labels,
        }
    }
}

enum Ranking {
    Scores(Vec<f64>),
    Labels,
    Unavailable,
}

impl Iterator for BenchRun<'_> {
    type Item = MetricRecord;

    fn next(&mut self) -> Option<MetricRecord> {
        loop {
            let trainer = self.panel.next()?;
            match self.score(trainer.as_ref()) {
                Ok(record) => {
                    log::info!(
                        "{}: accuracy {:.4}, f1 {:.4}",
                        record.algorithm,
                        record.accuracy,
                        record.f1
                    );
                    return Some(record);
                }
                Err(e) => {
                    log::warn!("{} failed: {e}", trainer.name());
                    self.failures.push((trainer.name().to_string(), e));
                }
            }
        }
    }
}

/// Bench outcome for one disease.
#[derive(Debug)]
pub struct DiseaseBench {
    pub disease: String,
    pub title: String,
    pub outcome: Result<Vec<MetricRecord>, DataError>,
    /// Skipped algorithms and why.
    pub failures: Vec<(String, String)>,
}

/// Per-algorithm means across diseases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSummary {
    pub algorithm: String,
    pub diseases: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Mean over the diseases that produced a ROC-AUC.
    pub roc_auc: Option<f64>,
}

/// Average each metric per algorithm over all successful disease runs,
/// sorted by algorithm name.
pub fn aggregate(results: &[DiseaseBench]) -> Vec<AlgorithmSummary> {
    let mut groups: std::collections::BTreeMap<&str, Vec<&MetricRecord>> = Default::default();
    for records in results.iter().filter_map(|r| r.outcome.as_ref().ok()) {
        for record in records {
            groups.entry(record.algorithm.as_str()).or_default().push(record);
        }
    }
    groups
        .into_iter()
        .map(|(algorithm, records)| {
            let n = records.len() as f64;
            let mean = |f: fn(&MetricRecord) -> f64| records.iter().map(|r| f(r)).sum::<f64>() / n;
            let aucs: Vec<f64> = records.iter().filter_map(|r| r.roc_auc).collect();
            AlgorithmSummary {
                algorithm: algorithm.to_string(),
                diseases: records.len(),
                accuracy: mean(|r| r.accuracy),
                precision: mean(|r| r.precision),
                recall: mean(|r| r.recall),
                f1: mean(|r| r.f1),
                roc_auc: (!aucs.is_empty()).then(|| aucs.iter().sum::<f64>() / aucs.len() as f64),
            }
        })
        .collect()
}

/// Highest mean F1; ties keep the alphabetically first algorithm.
pub fn best_by_f1(summaries: &[AlgorithmSummary]) -> Option<&AlgorithmSummary> {
    summaries
        .iter()
        .fold(None, |best: Option<&AlgorithmSummary>, s| match best {
            Some(b) if b.f1 >= s.f1 => Some(b),
            _ => Some(s),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    fn record(algorithm: &str, f1: f64, roc_auc: Option<f64>) -> MetricRecord {
        MetricRecord {
            algorithm: algorithm.to_string(),
            accuracy: f1,
            precision: f1,
            recall: f1,
            f1,
            roc_auc,
            confusion_matrix: ConfusionMatrix::default(),
            roc_curve: None,
        }
    }

    fn disease(key: &str, records: Vec<MetricRecord>) -> DiseaseBench {
        DiseaseBench {
            disease: key.to_string(),
            title: key.to_string(),
            outcome: Ok(records),
            failures: Vec::new(),
        }
    }

    #[test]
    fn aggregate_averages_per_algorithm() {
        let results = vec![
            disease(
                "a",
                vec![
                    record("Random Forest", 0.9, Some(0.95)),
                    record("K-Nearest Neighbors", 0.6, None),
                ],
            ),
            disease(
                "b",
                vec![
                    record("Random Forest", 0.7, None),
                    record("K-Nearest Neighbors", 0.8, Some(0.7)),
                ],
            ),
            DiseaseBench {
                disease: "c".into(),
                title: "c".into(),
                outcome: Err(DataError::Empty),
                failures: Vec::new(),
            },
        ];
        let summary = aggregate(&results);
        let names: Vec<&str> = summary.iter().map(|s| s.algorithm.as_str()).collect();
        assert_eq!(names, vec!["K-Nearest Neighbors", "Random Forest"]);
        assert_abs_diff_eq!(summary[1].f1, 0.8);
        assert_eq!(summary[1].diseases, 2);
        assert_eq!(summary[1].roc_auc, Some(0.95));
        assert_abs_diff_eq!(summary[0].roc_auc.unwrap(), 0.7);
        assert_eq!(best_by_f1(&summary).map(|s| s.algorithm.as_str()), Some("Random Forest"));
    }

    #[test]
    fn best_prefers_the_first_on_ties() {
        let summary = aggregate(&[disease(
            "a",
            vec![record("Decision Tree", 1.0, None), record("Random Forest", 1.0, None)],
        )]);
        assert_eq!(best_by_f1(&summary).map(|s| s.algorithm.as_str()), Some("Decision Tree"));
        assert!(best_by_f1(&[]).is_none());
    }

    #[test]
    fn metric_record_serializes_with_matrix_rows() {
        let mut r = record("Decision Tree", 1.0, Some(1.0));
        r.confusion_matrix = ConfusionMatrix { tn: 3, fp: 0, fn_: 0, tp: 2 };
        r.roc_curve = Some(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["confusion_matrix"], serde_json::json!([[3, 0], [0, 2]]));
        assert_eq!(v["roc_curve"][1], serde_json::json!([0.0, 1.0]));
    }
}
