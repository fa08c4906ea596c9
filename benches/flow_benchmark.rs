use adx_demand::core::config::SimulationConfig;
use adx_demand::graph::matrix::Matrix;
use adx_demand::graph::min_cost_flow::MinCostMaxFlow;
use adx_demand::simulation::experiment::Experiment;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn experiment(num_days: usize) -> Experiment {
    let config = SimulationConfig {
        num_days,
        seed: Some(42),
        ..Default::default()
    };
    Experiment::new(config).unwrap()
}

fn bench_daily_network(c: &mut Criterion) {
    let experiment = experiment(60);
    let schedule = experiment.generate_schedule(experiment.trial_seeds()[0]);
    let network = experiment.network_builder().daily(&schedule, 30);

    c.bench_function("daily_network_day_30", |b| {
        b.iter(|| {
            MinCostMaxFlow::solve(
                black_box(network.capacity()),
                black_box(network.cost()),
                network.source(),
                network.sink(),
            )
        })
    });
}

fn bench_multi_day_network(c: &mut Criterion, num_days: usize) {
    let experiment = experiment(num_days);
    let schedule = experiment.generate_schedule(experiment.trial_seeds()[0]);
    let network = experiment.network_builder().multi_day(&schedule);

    c.bench_function(&format!("multi_day_network_{}_days", num_days), |b| {
        b.iter(|| {
            MinCostMaxFlow::solve(
                black_box(network.capacity()),
                black_box(network.cost()),
                network.source(),
                network.sink(),
            )
        })
    });
}

fn bench_multi_day_10(c: &mut Criterion) {
    bench_multi_day_network(c, 10);
}

fn bench_multi_day_60(c: &mut Criterion) {
    bench_multi_day_network(c, 60);
}

fn bench_dense_matrix(c: &mut Criterion) {
    let n = 64;
    let rows = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 0 } else { ((i * 31 + j * 17) % 50) as i64 }).collect())
        .collect();
    let capacity = Matrix::from_rows(rows).unwrap();
    let cost = Matrix::filled(n, 1);

    c.bench_function("dense_64_nodes", |b| {
        b.iter(|| MinCostMaxFlow::solve(black_box(&capacity), black_box(&cost), 0, n - 1))
    });
}

criterion_group!(
    benches,
    bench_daily_network,
    bench_multi_day_10,
    bench_multi_day_60,
    bench_dense_matrix
);
criterion_main!(benches);
