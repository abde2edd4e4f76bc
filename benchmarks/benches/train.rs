use benchmarks::synthetic_history;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use foodcast::model::ForestConfig;
use foodcast::{train, ModelKind, TrainingConfig};

fn bench_train_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("train_forest");
    group.sample_size(10);
    for n_rows in [500, 2_000].iter() {
        let dataset = synthetic_history(*n_rows).expect("Failed to build dataset");
        let config =
            TrainingConfig::default().with_forest(ForestConfig::default().with_n_estimators(50));
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &dataset, |b, ds| {
            b.iter(|| black_box(train(black_box(ds), &config).unwrap()));
        });
    }
    group.finish();
}

fn bench_train_linear(c: &mut Criterion) {
    let dataset = synthetic_history(2_000).expect("Failed to build dataset");
    let config = TrainingConfig::default().with_model_kind(ModelKind::Linear);
    let mut group = c.benchmark_group("train_linear");
    group.sample_size(10);
    group.bench_function("2000_rows", |b| {
        b.iter(|| black_box(train(black_box(&dataset), &config).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_train_forest, bench_train_linear);
criterion_main!(benches);
