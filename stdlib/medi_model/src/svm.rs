//! C-SVC with an RBF kernel, solved by SMO with second-order working set
//! selection (Fan, Chen & Lin 2005), optionally Platt-calibrated.

use serde::{Deserialize, Serialize};

use crate::calibration::PlattScaling;
use crate::classifier::{
    check_classes, check_matrix, check_rows, check_training, squared_distance, Classifier,
    ModelError, ProbabilisticClassifier, ScoringClassifier,
};
use crate::scaler::StandardScaler;

const TAU: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmConfig {
    pub c: f64,
    /// RBF width; `None` uses `1 / (d * Var(X))`.
    pub gamma: Option<f64>,
    pub tol: f64,
    pub max_iter: usize,
    pub probability: bool,
    pub standardize: bool,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: None,
            tol: 1e-3,
            max_iter: 10_000_000,
            probability: true,
            standardize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorMachine {
    classes: Vec<f64>,
    scaler: Option<StandardScaler>,
    gamma: f64,
    support_vectors: Vec<Vec<f64>>,
    /// `alpha_i * y_i` per support vector.
    dual_coef: Vec<f64>,
    rho: f64,
    platt: Option<PlattScaling>,
}

impl SupportVectorMachine {
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &SvmConfig) -> Result<Self, ModelError> {
        let (d, classes) = check_training(x, y)?;
        let scaler = config.standardize.then(|| StandardScaler::fit(x));
        let xs = match &scaler {
            Some(s) => s.transform(x),
            None => x.to_vec(),
        };
        let gamma = config.gamma.unwrap_or_else(|| scale_gamma(&xs, d));
        let signs: Vec<f64> = y
            .iter()
            .map(|v| if *v == classes[1] { 1.0 } else { -1.0 })
            .collect();

        let kernel = KernelMatrix::new(&xs, gamma);
        let (alpha, rho) = smo(&kernel, &signs, config.c, config.tol, config.max_iter);

        let mut support_vectors = Vec::new();
        let mut dual_coef = Vec::new();
        for (i, a) in alpha.iter().enumerate() {
            if *a > 0.0 {
                support_vectors.push(xs[i].clone());
                dual_coef.push(a * signs[i]);
            }
        }
        log::debug!(
            "svm: {} support vectors of {} rows, gamma = {gamma:.6}",
            support_vectors.len(),
            xs.len()
        );

        let mut model = Self {
            classes,
            scaler,
            gamma,
            support_vectors,
            dual_coef,
            rho,
            platt: None,
        };
        if config.probability {
            let scores: Vec<f64> = xs.iter().map(|r| model.raw_decision(r)).collect();
            let labels: Vec<bool> = signs.iter().map(|s| *s > 0.0).collect();
            model.platt = Some(PlattScaling::fit(&scores, &labels));
        }
        Ok(model)
    }

    pub(crate) fn validate(&self) -> Result<usize, ModelError> {
        check_classes(&self.classes)?;
        let d = check_matrix(&self.support_vectors, "support vectors")?;
        if self.dual_coef.len() != self.support_vectors.len() {
            return Err(ModelError::Malformed(format!(
                "{} dual coefficients for {} support vectors",
                self.dual_coef.len(),
                self.support_vectors.len()
            )));
        }
        if let Some(s) = &self.scaler {
            if s.mean.len() != d || s.std.len() != d {
                return Err(ModelError::Malformed(format!(
                    "scaler width differs from the {d} support vector features"
                )));
            }
        }
        Ok(d)
    }

    pub fn has_probabilities(&self) -> bool {
        self.platt.is_some()
    }

    pub fn n_support(&self) -> usize {
        self.support_vectors.len()
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    fn raw_decision(&self, scaled: &[f64]) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, c)| c * (-self.gamma * squared_distance(sv, scaled)).exp())
            .sum::<f64>()
            - self.rho
    }

    fn decision(&self, row: &[f64]) -> f64 {
        match &self.scaler {
            Some(s) => self.raw_decision(&s.transform_row(row)),
            None => self.raw_decision(row),
        }
    }
}

impl Classifier for SupportVectorMachine {
    fn classes(&self) -> &[f64] {
        &self.classes
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        Ok(self
            .decision_function(rows)?
            .into_iter()
            .map(|s| if s > 0.0 { self.classes[1] } else { self.classes[0] })
            .collect())
    }
}

impl ScoringClassifier for SupportVectorMachine {
    fn decision_function(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let d = self.scaler.as_ref().map_or_else(
            || self.support_vectors.first().map_or(0, Vec::len),
            |s| s.mean.len(),
        );
        check_rows(rows, d)?;
        Ok(rows.iter().map(|r| self.decision(r)).collect())
    }
}

impl ProbabilisticClassifier for SupportVectorMachine {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        let platt = self
            .platt
            .ok_or(ModelError::NoProbabilities("svm without probability calibration"))?;
        Ok(self
            .decision_function(rows)?
            .into_iter()
            .map(|s| {
                let p = platt.transform(s);
                vec![1.0 - p, p]
            })
            .collect())
    }
}

fn scale_gamma(x: &[Vec<f64>], d: usize) -> f64 {
    let n = (x.len() * d) as f64;
    if n == 0.0 {
        return 1.0;
    }
    let mean = x.iter().flatten().sum::<f64>() / n;
    let var = x.iter().flatten().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    if var > 0.0 {
        1.0 / (d as f64 * var)
    } else {
        1.0
    }
}

struct KernelMatrix {
    n: usize,
    values: Vec<f64>,
}

impl KernelMatrix {
    fn new(x: &[Vec<f64>], gamma: f64) -> Self {
        let n = x.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in i + 1..n {
                let k = (-gamma * squared_distance(&x[i], &x[j])).exp();
                values[i * n + j] = k;
                values[j * n + i] = k;
            }
        }
        Self { n, values }
    }

    fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }
}

/// Solves the C-SVC dual and returns `(alpha, rho)`.
fn smo(kernel: &KernelMatrix, y: &[f64], c: f64, eps: f64, max_iter: usize) -> (Vec<f64>, f64) {
    let n = y.len();
    let mut alpha = vec![0.0; n];
    // gradient of 0.5 a'Qa - e'a with Q_ij = y_i y_j K_ij
    let mut grad = vec![-1.0; n];
    let upper = |a: f64| a >= c;
    let lower = |a: f64| a <= 0.0;

    let mut iter = 0;
    while iter < max_iter {
        let Some((i, j)) = select_working_set(kernel, y, &alpha, &grad, c, eps) else {
            break;
        };
        iter += 1;

        let ki = kernel.row(i);
        let kj = kernel.row(j);
        let q_ij = y[i] * y[j] * ki[j];
        let (old_i, old_j) = (alpha[i], alpha[j]);

        if y[i] != y[j] {
            let mut quad = ki[i] + kj[j] + 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (-grad[i] - grad[j]) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;
            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            if diff > 0.0 {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else if alpha[j] > c {
                alpha[j] = c;
                alpha[i] = c + diff;
            }
        } else {
            let mut quad = ki[i] + kj[j] - 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (grad[i] - grad[j]) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;
            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > c {
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let di = alpha[i] - old_i;
        let dj = alpha[j] - old_j;
        for k in 0..n {
            grad[k] += y[k] * (y[i] * ki[k] * di + y[j] * kj[k] * dj);
        }
    }
    if iter >= max_iter {
        log::warn!("svm solver reached max_iter = {max_iter}");
    }

    let mut ub = f64::INFINITY;
    let mut lb = f64::NEG_INFINITY;
    let mut free = 0usize;
    let mut sum_free = 0.0;
    for k in 0..n {
        let yg = y[k] * grad[k];
        if upper(alpha[k]) {
            if y[k] < 0.0 {
                ub = ub.min(yg);
            } else {
                lb = lb.max(yg);
            }
        } else if lower(alpha[k]) {
            if y[k] > 0.0 {
                ub = ub.min(yg);
            } else {
                lb = lb.max(yg);
            }
        } else {
            free += 1;
            sum_free += yg;
        }
    }
    let rho = if free > 0 {
        sum_free / free as f64
    } else {
        (ub + lb) / 2.0
    };
    (alpha, rho)
}

fn select_working_set(
    kernel: &KernelMatrix,
    y: &[f64],
    alpha: &[f64],
    grad: &[f64],
    c: f64,
    eps: f64,
) -> Option<(usize, usize)> {
    let n = y.len();
    let mut gmax = f64::NEG_INFINITY;
    let mut i = None;
    for t in 0..n {
        if y[t] > 0.0 {
            if alpha[t] < c && -grad[t] >= gmax {
                gmax = -grad[t];
                i = Some(t);
            }
        } else if alpha[t] > 0.0 && grad[t] >= gmax {
            gmax = grad[t];
            i = Some(t);
        }
    }
    let i = i?;
    let ki = kernel.row(i);

    let mut gmax2 = f64::NEG_INFINITY;
    let mut j = None;
    let mut best = f64::INFINITY;
    for t in 0..n {
        let kt = kernel.row(t)[t];
        let (eligible, grad_diff, yg) = if y[t] > 0.0 {
            (alpha[t] > 0.0, gmax + grad[t], grad[t])
        } else {
            (alpha[t] < c, gmax - grad[t], -grad[t])
        };
        if !eligible {
            continue;
        }
        if yg >= gmax2 {
            gmax2 = yg;
        }
        if grad_diff > 0.0 {
            let mut quad = ki[i] + kt - 2.0 * ki[t];
            if quad <= 0.0 {
                quad = TAU;
            }
            let obj = -(grad_diff * grad_diff) / quad;
            if obj <= best {
                best = obj;
                j = Some(t);
            }
        }
    }

    if gmax + gmax2 < eps {
        return None;
    }
    j.map(|j| (i, j))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rings() -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for k in 0..24 {
            let a = k as f64 * std::f64::consts::TAU / 24.0;
            x.push(vec![0.5 * a.cos(), 0.5 * a.sin()]);
            y.push(0.0);
            x.push(vec![3.0 * a.cos(), 3.0 * a.sin()]);
            y.push(1.0);
        }
        (x, y)
    }

    #[test]
    fn rbf_separates_concentric_rings() {
        let (x, y) = rings();
        let m = SupportVectorMachine::fit(&x, &y, &SvmConfig::default()).unwrap();
        assert_eq!(m.predict(&x).unwrap(), y);
        assert!(m.n_support() > 0);
    }

    #[test]
    fn probabilities_follow_the_decision() {
        let (x, y) = rings();
        let m = SupportVectorMachine::fit(&x, &y, &SvmConfig::default()).unwrap();
        let p = m.predict_proba(&[vec![0.0, 0.0], vec![4.0, 0.0]]).unwrap();
        assert!(p[0][1] < 0.5);
        assert!(p[1][1] > 0.5);
    }

    #[test]
    fn uncalibrated_model_refuses_probabilities() {
        let (x, y) = rings();
        let config = SvmConfig {
            probability: false,
            ..SvmConfig::default()
        };
        let m = SupportVectorMachine::fit(&x, &y, &config).unwrap();
        assert!(!m.has_probabilities());
        assert!(matches!(
            m.predict_proba(&x),
            Err(ModelError::NoProbabilities(_))
        ));
    }

    #[test]
    fn gamma_scale_uses_overall_variance() {
        let x = vec![vec![0.0, 2.0], vec![2.0, 0.0]];
        // var of [0, 2, 2, 0] is 1
        assert!((scale_gamma(&x, 2) - 0.5).abs() < 1e-12);
    }
}
