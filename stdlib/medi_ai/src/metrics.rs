//! Binary classification metrics for benchmark runs.
//!
//! Provides the confusion matrix with accuracy, precision, recall and F1
//! (zero division scores 0), the ROC curve and ROC-AUC.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("{truth} labels but {scores} predictions")]
    LengthMismatch { truth: usize, scores: usize },
    #[error("no samples to score")]
    Empty,
    #[error("score at position {0} is not finite")]
    NonFinite(usize),
}

fn check_lengths(truth: usize, scores: usize) -> Result<(), MetricError> {
    if truth != scores {
        return Err(MetricError::LengthMismatch { truth, scores });
    }
    if truth == 0 {
        return Err(MetricError::Empty);
    }
    Ok(())
}

/// 2x2 counts. Rows are the actual class (negative, positive), columns the
/// predicted class; serialized as `[[tn, fp], [fn, tp]]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[[usize; 2]; 2]", into = "[[usize; 2]; 2]")]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl From<[[usize; 2]; 2]> for ConfusionMatrix {
    fn from(m: [[usize; 2]; 2]) -> Self {
        Self {
            tn: m[0][0],
            fp: m[0][1],
            fn_: m[1][0],
            tp: m[1][1],
        }
    }
}

impl From<ConfusionMatrix> for [[usize; 2]; 2] {
    fn from(m: ConfusionMatrix) -> Self {
        m.rows()
    }
}

impl ConfusionMatrix {
    /// Count outcomes, treating every label equal to `positive` as positive
    /// and anything else as negative.
    pub fn from_labels(
        truth: &[f64],
        predicted: &[f64],
        positive: f64,
    ) -> Result<Self, MetricError> {
        check_lengths(truth.len(), predicted.len())?;
        let mut m = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t == positive, p == positive) {
                (false, false) => m.tn += 1,
                (false, true) => m.fp += 1,
                (true, false) => m.fn_ += 1,
                (true, true) => m.tp += 1,
            }
        }
        Ok(m)
    }

    pub fn rows(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// ROC curve as `(fpr, tpr)` points, one per distinct score threshold,
/// starting at `(0, 0)`. Points lying on a straight line between their
/// neighbours are dropped. `None` when `truth` holds a single class.
pub fn roc_curve(truth: &[bool], scores: &[f64]) -> Result<Option<Vec<(f64, f64)>>, MetricError> {
    check_lengths(truth.len(), scores.len())?;
    if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
        return Err(MetricError::NonFinite(i));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // cumulative counts at the last position of each distinct score
    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &i) in order.iter().enumerate() {
        if truth[i] {
            tp += 1;
        } else {
            fp += 1;
        }
        let last = pos + 1 == order.len() || scores[order[pos + 1]] != scores[i];
        if last {
            tps.push(tp);
            fps.push(fp);
        }
    }
    if tp == 0 || fp == 0 {
        return Ok(None);
    }

    let n = tps.len();
    let bend = |v: &[usize], k: usize| v[k + 1] as i64 - 2 * v[k] as i64 + v[k - 1] as i64 != 0;
    let (tps, fps): (Vec<usize>, Vec<usize>) = (0..n)
        .filter(|&k| n <= 2 || k == 0 || k == n - 1 || bend(&fps, k) || bend(&tps, k))
        .map(|k| (tps[k], fps[k]))
        .unzip();

    let mut points = Vec::with_capacity(tps.len() + 1);
    points.push((0.0, 0.0));
    points.extend(
        fps.iter()
            .zip(&tps)
            .map(|(&f, &t)| (f as f64 / fp as f64, t as f64 / tp as f64)),
    );
    Ok(Some(points))
}

/// Trapezoidal area under a curve given in increasing x order.
pub fn trapezoid(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].0 - w[0].0) * (w[1].1 + w[0].1) / 2.0)
        .sum()
}

/// Area under the ROC curve; `None` when `truth` holds a single class.
pub fn roc_auc(truth: &[bool], scores: &[f64]) -> Result<Option<f64>, MetricError> {
    Ok(roc_curve(truth, scores)?.map(|c| trapezoid(&c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn confusion_matrix_counts_and_scores() {
        let truth = [1.0, 1.0, 0.0, 1.0, 0.0];
        let pred = [1.0, 1.0, 1.0, 0.0, 0.0];
        let m = ConfusionMatrix::from_labels(&truth, &pred, 1.0).unwrap();
        assert_eq!(m.rows(), [[1, 1], [1, 2]]);
        assert_eq!(m.total(), 5);
        assert_abs_diff_eq!(m.accuracy(), 0.6);
        assert_abs_diff_eq!(m.precision(), 2.0 / 3.0);
        assert_abs_diff_eq!(m.recall(), 2.0 / 3.0);
        assert_abs_diff_eq!(m.f1(), 2.0 / 3.0);
    }

    #[test]
    fn zero_division_scores_zero() {
        let m = ConfusionMatrix::from_labels(&[0.0, 0.0], &[0.0, 0.0], 1.0).unwrap();
        assert_eq!(m.precision(), 0.0);
        assert_eq!(m.recall(), 0.0);
        assert_eq!(m.f1(), 0.0);
        assert_eq!(m.accuracy(), 1.0);
    }

    #[test]
    fn mismatched_lengths_are_errors() {
        assert_eq!(
            ConfusionMatrix::from_labels(&[1.0], &[1.0, 0.0], 1.0),
            Err(MetricError::LengthMismatch { truth: 1, scores: 2 })
        );
        assert_eq!(roc_auc(&[], &[]), Err(MetricError::Empty));
    }

    #[test]
    fn serializes_as_nested_rows() {
        let m = ConfusionMatrix {
            tn: 4,
            fp: 1,
            fn_: 2,
            tp: 3,
        };
        let s = serde_json::to_string(&m).unwrap();
        assert_eq!(s, "[[4,1],[2,3]]");
        let back: ConfusionMatrix = serde_json::from_str(&s).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn perfect_ranking() {
        let truth = [true, true, false, false];
        let scores = [0.9, 0.8, 0.2, 0.1];
        let curve = roc_curve(&truth, &scores).unwrap().unwrap();
        assert_eq!(curve, vec![(0.0, 0.0), (0.0, 0.5), (0.0, 1.0), (1.0, 1.0)]);
        assert_abs_diff_eq!(roc_auc(&truth, &scores).unwrap().unwrap(), 1.0);
    }

    #[test]
    fn known_curve() {
        // y = [0, 0, 1, 1], scores = [0.1, 0.4, 0.35, 0.8]
        let truth = [false, false, true, true];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let curve = roc_curve(&truth, &scores).unwrap().unwrap();
        assert_eq!(
            curve,
            vec![(0.0, 0.0), (0.0, 0.5), (0.5, 0.5), (0.5, 1.0), (1.0, 1.0)]
        );
        assert_abs_diff_eq!(roc_auc(&truth, &scores).unwrap().unwrap(), 0.75);
    }

    #[test]
    fn ties_share_a_threshold() {
        let truth = [true, false, true, false];
        let scores = [0.5; 4];
        let curve = roc_curve(&truth, &scores).unwrap().unwrap();
        assert_eq!(curve, vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_abs_diff_eq!(roc_auc(&truth, &scores).unwrap().unwrap(), 0.5);
    }

    #[test]
    fn single_class_has_no_curve() {
        assert_eq!(roc_curve(&[true, true], &[0.1, 0.2]).unwrap(), None);
        assert_eq!(roc_auc(&[false, false], &[0.1, 0.2]).unwrap(), None);
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        assert_eq!(
            roc_auc(&[true, false], &[0.3, f64::NAN]),
            Err(MetricError::NonFinite(1))
        );
    }

    #[test]
    fn hard_predictions_give_balanced_accuracy() {
        // AUC of 0/1 scores equals (tpr + tnr) / 2
        let truth = [true, true, false, false];
        let hard = [1.0, 0.0, 0.0, 0.0];
        assert_abs_diff_eq!(roc_auc(&truth, &hard).unwrap().unwrap(), 0.75);
    }

    fn labelled() -> impl Strategy<Value = Vec<(bool, u8)>> {
        // few distinct scores so ties are common
        prop::collection::vec((any::<bool>(), 0u8..8), 1..60)
    }

    proptest! {
        #[test]
        fn matrix_accounts_for_every_sample(pairs in prop::collection::vec((any::<bool>(), any::<bool>()), 1..60)) {
            let truth: Vec<f64> = pairs.iter().map(|p| if p.0 { 1.0 } else { 0.0 }).collect();
            let pred: Vec<f64> = pairs.iter().map(|p| if p.1 { 1.0 } else { 0.0 }).collect();
            let m = ConfusionMatrix::from_labels(&truth, &pred, 1.0).unwrap();
            prop_assert_eq!(m.total(), pairs.len());
            for score in [m.accuracy(), m.precision(), m.recall(), m.f1()] {
                prop_assert!((0.0..=1.0).contains(&score), "{}", score);
            }
        }

        #[test]
        fn roc_runs_monotonically_from_origin_to_corner(samples in labelled()) {
            let truth: Vec<bool> = samples.iter().map(|s| s.0).collect();
            let scores: Vec<f64> = samples.iter().map(|s| f64::from(s.1) / 7.0).collect();
            let Some(curve) = roc_curve(&truth, &scores).unwrap() else {
                // a single class has no curve
                return Ok(());
            };
            prop_assert_eq!(curve.first().copied(), Some((0.0, 0.0)));
            prop_assert_eq!(curve.last().copied(), Some((1.0, 1.0)));
            for w in curve.windows(2) {
                prop_assert!(w[1].0 >= w[0].0 && w[1].1 >= w[0].1, "{:?}", w);
            }
            let auc = roc_auc(&truth, &scores).unwrap().unwrap();
            prop_assert!((-1e-12..=1.0 + 1e-12).contains(&auc), "{}", auc);
        }
    }
}
