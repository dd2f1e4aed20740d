//! Platt scaling: map decision scores to probabilities with `sigmoid(a * s + b)`.

use serde::{Deserialize, Serialize};

use crate::classifier::sigmoid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    /// Fit by Newton's method with backtracking on the regularised targets
    /// of Platt (1999) as refined by Lin, Lin & Weng (2007).
    ///
    /// `labels[i]` is true when score `i` belongs to the positive class.
    pub fn fit(scores: &[f64], labels: &[bool]) -> Self {
        const MAX_ITER: usize = 100;
        const MIN_STEP: f64 = 1e-10;
        const SIGMA: f64 = 1e-12;
        const EPS: f64 = 1e-5;

        let prior1 = labels.iter().filter(|&&l| l).count() as f64;
        let prior0 = labels.len() as f64 - prior1;
        let hi = (prior1 + 1.0) / (prior1 + 2.0);
        let lo = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = labels.iter().map(|&l| if l { hi } else { lo }).collect();

        // Internally P(positive) = 1 / (1 + exp(A s + B)).
        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = negative_log_likelihood(scores, &targets, a, b);

        for _ in 0..MAX_ITER {
            let mut h11 = SIGMA;
            let mut h22 = SIGMA;
            let mut h21 = 0.0;
            let mut g1 = 0.0;
            let mut g2 = 0.0;
            for (s, t) in scores.iter().zip(&targets) {
                let f = s * a + b;
                let (p, q) = if f >= 0.0 {
                    let e = (-f).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = f.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += s * s * d2;
                h22 += d2;
                h21 += s * d2;
                let d1 = t - p;
                g1 += s * d1;
                g2 += d1;
            }
            if g1.abs() < EPS && g2.abs() < EPS {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let na = a + step * da;
                let nb = b + step * db;
                let nf = negative_log_likelihood(scores, &targets, na, nb);
                if nf < fval + 1e-4 * step * gd {
                    a = na;
                    b = nb;
                    fval = nf;
                    break;
                }
                step /= 2.0;
            }
            if step < MIN_STEP {
                log::debug!("platt scaling line search failed");
                break;
            }
        }

        Self { a: -a, b: -b }
    }

    /// Transform a raw score to calibrated probability
    pub fn transform(&self, score: f64) -> f64 {
        sigmoid(self.a * score + self.b)
    }
}

fn negative_log_likelihood(scores: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    scores
        .iter()
        .zip(targets)
        .map(|(s, t)| {
            let f = s * a + b;
            if f >= 0.0 {
                t * f + (-f).exp().ln_1p()
            } else {
                (t - 1.0) * f + f.exp().ln_1p()
            }
        })
        .sum()
}
