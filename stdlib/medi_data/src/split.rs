//! Seeded stratified train/test splitting.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::dataset::{distinct_sorted, DataError};

pub const DEFAULT_TEST_FRACTION: f64 = 0.25;
pub const DEFAULT_SEED: u64 = 42;

/// Row indices of each side of a split, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split `labels` so each class keeps (close to) its overall share in the
/// test set. The test set has `ceil(test_fraction * n)` rows; per-class
/// counts are assigned by largest remainder and every class keeps at least
/// one training row.
pub fn stratified_split(labels: &[f64], test_fraction: f64, seed: u64) -> Result<Split, DataError> {
    let n = labels.len();
    let classes = distinct_sorted(labels);
    let n_test = ((test_fraction * n as f64).ceil() as usize).min(n);
    let n_train = n - n_test;
    if n_test < classes.len() || n_train < classes.len() {
        return Err(DataError::SplitTooSmall {
            n,
            classes: classes.len(),
        });
    }

    let mut members: Vec<Vec<usize>> = classes
        .iter()
        .map(|c| (0..n).filter(|&i| labels[i] == *c).collect())
        .collect();
    for (class, idx) in classes.iter().zip(&members) {
        if idx.len() < 2 {
            return Err(DataError::ClassTooSmall {
                class: *class,
                count: idx.len(),
            });
        }
    }

    let quotas = allocate(&members.iter().map(Vec::len).collect::<Vec<_>>(), n_test);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::with_capacity(n_train),
        test: Vec::with_capacity(n_test),
    };
    for (idx, quota) in members.iter_mut().zip(quotas) {
        idx.shuffle(&mut rng);
        split.test.extend_from_slice(&idx[..quota]);
        split.train.extend_from_slice(&idx[quota..]);
    }
    split.train.sort_unstable();
    split.test.sort_unstable();
    log::debug!(
        "stratified split: {} train / {} test over {} classes",
        split.train.len(),
        split.test.len(),
        classes.len()
    );
    Ok(split)
}

fn allocate(counts: &[usize], n_test: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| n_test as f64 * c as f64 / n as f64)
        .collect();
    let mut quotas: Vec<usize> = exact
        .iter()
        .zip(counts)
        .map(|(e, &c)| (e.floor() as usize).min(c - 1))
        .collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(counts[b].cmp(&counts[a]))
    });

    let mut left = n_test - quotas.iter().sum::<usize>();
    while left > 0 {
        let before = left;
        for &i in &order {
            if left == 0 {
                break;
            }
            if quotas[i] < counts[i] - 1 {
                quotas[i] += 1;
                left -= 1;
            }
        }
        if left == before {
            break;
        }
    }
    quotas
}
