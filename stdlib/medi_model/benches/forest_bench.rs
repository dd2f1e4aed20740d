use criterion::{black_box, criterion_group, criterion_main, Criterion};
use medi_model::forest::{ForestConfig, RandomForest};
use medi_model::svm::{SupportVectorMachine, SvmConfig};
use medi_model::ProbabilisticClassifier;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn mk_data(n: usize, d: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let label = (i % 2) as f64;
        let row: Vec<f64> = (0..d)
            .map(|_| rng.gen_range(-1.0..1.0) + 1.5 * label)
            .collect();
        x.push(row);
        y.push(label);
    }
    (x, y)
}

fn bench_forest_fit(c: &mut Criterion) {
    let (x, y) = mk_data(300, 8);
    let config = ForestConfig {
        n_trees: 50,
        ..ForestConfig::default()
    };
    c.bench_function("forest_fit_50_trees_300x8", |b| {
        b.iter(|| RandomForest::fit(black_box(&x), black_box(&y), &config).map(|f| f.n_trees()))
    });
}

fn bench_forest_proba(c: &mut Criterion) {
    let (x, y) = mk_data(300, 8);
    let Ok(forest) = RandomForest::fit(&x, &y, &ForestConfig::default()) else {
        return;
    };
    c.bench_function("forest_predict_proba_300", |b| {
        b.iter(|| forest.predict_proba(black_box(&x)).map(|p| p.len()))
    });
}

fn bench_svm_fit(c: &mut Criterion) {
    let (x, y) = mk_data(200, 8);
    c.bench_function("svm_fit_calibrated_200x8", |b| {
        b.iter(|| {
            SupportVectorMachine::fit(black_box(&x), black_box(&y), &SvmConfig::default())
                .map(|m| m.n_support())
        })
    });
}

criterion_group!(benches, bench_forest_fit, bench_forest_proba, bench_svm_fit);
criterion_main!(benches);
