//! Benchmarks for the scoring transforms.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use screener_core::types::{ScoreRow, ScoreTable};
use screener_stats::{cap_outliers, linear_slope, min_max, normalize_table};

fn generate_test_data(size: usize) -> Vec<Option<f64>> {
    (0..size)
        .map(|i| Some(100.0 + (i as f64 * 0.1).sin() * 10.0))
        .collect()
}

fn generate_table(size: usize) -> ScoreTable {
    ScoreTable::from_rows((0..size).map(|i| {
        let x = i as f64;
        ScoreRow::new(format!("SYM{}", i))
            .with("momentum_factor", (x * 0.3).sin())
            .with("growth_factor", (x * 0.7).cos())
            .with("quality_factor", x % 17.0)
    }))
}

fn benchmark_min_max(c: &mut Criterion) {
    let mut group = c.benchmark_group("min_max");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("column", size), &data, |b, data| {
            b.iter(|| min_max(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_cap_outliers(c: &mut Criterion) {
    let mut group = c.benchmark_group("cap_outliers");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("column", size), &data, |b, data| {
            b.iter(|| cap_outliers(black_box(data), black_box(3.0)))
        });
    }

    group.finish();
}

fn benchmark_slope(c: &mut Criterion) {
    let data: Vec<f64> = generate_test_data(10000).into_iter().flatten().collect();

    c.bench_function("linear_slope_10000", |b| {
        b.iter(|| linear_slope(black_box(&data)))
    });
}

fn benchmark_normalize_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_table");

    for size in [500, 3000].iter() {
        let table = generate_table(*size);

        group.bench_with_input(BenchmarkId::new("rows", size), &table, |b, table| {
            b.iter(|| {
                let mut t = table.clone();
                normalize_table(black_box(&mut t)).ok();
                t
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_min_max,
    benchmark_cap_outliers,
    benchmark_slope,
    benchmark_normalize_table,
);
criterion_main!(benches);
