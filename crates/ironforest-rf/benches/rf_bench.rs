//! Criterion benchmarks for ironforest-rf: Random Forest training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use ironforest_rf::{DecisionTreeConfig, RandomForestConfig, Task};

fn make_classification(
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    seed: u64,
) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let x = Array2::from_shape_fn((n_samples, n_features), |(i, f)| {
        let class = i % n_classes;
        let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
        base + rng.random::<f64>() * 0.5
    });
    let y = Array1::from_shape_fn(n_samples, |i| (i % n_classes) as f64);
    (x, y)
}

fn bench_rf_train(c: &mut Criterion) {
    let (x, y) = make_classification(500, 20, 5, 42);
    let cfg = RandomForestConfig::new(50).unwrap().with_random_state(42);

    c.bench_function("rf_train_500x20_5class_50trees", |b| {
        b.iter(|| cfg.fit(Task::Classification, x.view(), y.view()).unwrap());
    });
}

fn bench_rf_train_regression(c: &mut Criterion) {
    let (x, _) = make_classification(500, 20, 5, 7);
    let y = x.column(0).mapv(|v| v * 2.0) + &x.column(1);
    let cfg = RandomForestConfig::new(50).unwrap().with_random_state(42);

    c.bench_function("rf_train_regression_500x20_50trees", |b| {
        b.iter(|| cfg.fit(Task::Regression, x.view(), y.view()).unwrap());
    });
}

fn bench_rf_predict_batch(c: &mut Criterion) {
    let (x, y) = make_classification(500, 20, 5, 42);
    let cfg = RandomForestConfig::new(50).unwrap().with_random_state(42);
    let forest = cfg.fit(Task::Classification, x.view(), y.view()).unwrap().into_forest();

    c.bench_function("rf_predict_batch_500x20_50trees", |b| {
        b.iter(|| forest.predict(x.view()).unwrap());
    });
}

fn bench_single_tree(c: &mut Criterion) {
    // Proxy for split-finding: one unbootstrapped tree on 500 samples.
    let (x, y) = make_classification(500, 20, 5, 42);
    let cfg = DecisionTreeConfig::new(Task::Classification).with_seed(42);

    c.bench_function("tree_fit_500x20_5class", |b| {
        b.iter(|| cfg.fit(x.view(), y.view()).unwrap());
    });
}

criterion_group!(
    benches,
    bench_rf_train,
    bench_rf_train_regression,
    bench_rf_predict_batch,
    bench_single_tree
);
criterion_main!(benches);
