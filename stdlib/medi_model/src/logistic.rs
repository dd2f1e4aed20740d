//! L2-regularised binary logistic regression fitted with Newton's method.

use serde::{Deserialize, Serialize};

use crate::classifier::{
    check_classes, check_rows, check_training, sigmoid, Classifier, ModelError,
    ProbabilisticClassifier, ScoringClassifier,
};
use crate::scaler::StandardScaler;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse regularisation strength.
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub standardize: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-8,
            standardize: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    classes: Vec<f64>,
    scaler: Option<StandardScaler>,
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &LogisticConfig) -> Result<Self, ModelError> {
        let (d, classes) = check_training(x, y)?;
        let scaler = config.standardize.then(|| StandardScaler::fit(x));
        let xs = match &scaler {
            Some(s) => s.transform(x),
            None => x.to_vec(),
        };
        let t: Vec<f64> = y
            .iter()
            .map(|v| if *v == classes[1] { 1.0 } else { 0.0 })
            .collect();

        // theta = [w_0 .. w_{d-1}, b]; the intercept is not penalised
        let p = d + 1;
        let mut theta = vec![0.0; p];
        let mut loss = objective(&xs, &t, &theta, config.c);
        let mut converged = false;
        for iter in 0..config.max_iter {
            let (grad, hess) = derivatives(&xs, &t, &theta, config.c);
            if grad.iter().all(|g| g.abs() < config.tol) {
                converged = true;
                break;
            }
            let step = solve(hess, grad).ok_or_else(|| {
                ModelError::Numerical("singular Hessian in logistic regression".into())
            })?;

            let mut scale = 1.0;
            let mut accepted = false;
            for _ in 0..40 {
                let trial: Vec<f64> = theta
                    .iter()
                    .zip(&step)
                    .map(|(a, s)| a - scale * s)
                    .collect();
                let trial_loss = objective(&xs, &t, &trial, config.c);
                if trial_loss <= loss {
                    let max_step = step.iter().fold(0.0f64, |m, s| m.max((scale * s).abs()));
                    theta = trial;
                    loss = trial_loss;
                    accepted = true;
                    converged = max_step < config.tol;
                    break;
                }
                scale /= 2.0;
            }
            if !accepted || converged {
                log::debug!("logistic regression stopped after {} iterations", iter + 1);
                converged = true;
                break;
            }
        }
        if !converged {
            log::warn!(
                "logistic regression reached max_iter = {} without converging",
                config.max_iter
            );
        }

        let intercept = theta[d];
        theta.truncate(d);
        Ok(Self {
            classes,
            scaler,
            weights: theta,
            intercept,
        })
    }

    pub(crate) fn validate(&self) -> Result<usize, ModelError> {
        check_classes(&self.classes)?;
        let d = self.weights.len();
        if let Some(s) = &self.scaler {
            if s.mean.len() != d || s.std.len() != d {
                return Err(ModelError::Malformed(format!(
                    "scaler width differs from the {d} weights"
                )));
            }
        }
        Ok(d)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn score(&self, row: &[f64]) -> f64 {
        let scaled;
        let row = match &self.scaler {
            Some(s) => {
                scaled = s.transform_row(row);
                &scaled[..]
            }
            None => row,
        };
        dot(&self.weights, row) + self.intercept
    }
}

impl Classifier for LogisticRegression {
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

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        Ok(self
            .decision_function(rows)?
            .into_iter()
            .map(|s| {
                let p = sigmoid(s);
                vec![1.0 - p, p]
            })
            .collect())
    }
}

impl ScoringClassifier for LogisticRegression {
    fn decision_function(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        check_rows(rows, self.weights.len())?;
        Ok(rows.iter().map(|r| self.score(r)).collect())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn linear(row: &[f64], theta: &[f64]) -> f64 {
    let d = row.len();
    dot(&theta[..d], row) + theta[d]
}

/// `0.5 |w|^2 + C * sum(logloss)`.
fn objective(x: &[Vec<f64>], t: &[f64], theta: &[f64], c: f64) -> f64 {
    let d = theta.len() - 1;
    let penalty = 0.5 * theta[..d].iter().map(|w| w * w).sum::<f64>();
    let data: f64 = x
        .iter()
        .zip(t)
        .map(|(row, ti)| {
            let z = linear(row, theta);
            // log(1 + exp(z)) - t z, computed without overflow
            let softplus = if z > 0.0 {
                z + (-z).exp().ln_1p()
            } else {
                z.exp().ln_1p()
            };
            softplus - ti * z
        })
        .sum();
    penalty + c * data
}

fn derivatives(x: &[Vec<f64>], t: &[f64], theta: &[f64], c: f64) -> (Vec<f64>, Vec<Vec<f64>>) {
    let p = theta.len();
    let d = p - 1;
    let mut grad = vec![0.0; p];
    let mut hess = vec![vec![0.0; p]; p];
    for j in 0..d {
        grad[j] = theta[j];
        hess[j][j] = 1.0;
    }
    for (row, ti) in x.iter().zip(t) {
        let mu = sigmoid(linear(row, theta));
        let r = c * (mu - ti);
        let w = c * mu * (1.0 - mu);
        for j in 0..p {
            let xj = if j < d { row[j] } else { 1.0 };
            grad[j] += r * xj;
            for k in j..p {
                let xk = if k < d { row[k] } else { 1.0 };
                hess[j][k] += w * xj * xk;
            }
        }
    }
    for j in 0..p {
        for k in 0..j {
            hess[j][k] = hess[k][j];
        }
    }
    (grad, hess)
}

/// Gaussian elimination with partial pivoting.
pub(crate) fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let f = a[row][col] / a[col][col];
            if f == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut out = vec![0.0; n];
    for row in (0..n).rev() {
        let s: f64 = (row + 1..n).map(|k| a[row][k] * out[k]).sum();
        out[row] = (b[row] - s) / a[row][row];
    }
    Some(out)
}
