use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use ndarray::Array2;
use portfolio_frontier::AssetUniverse;
use portfolio_frontier::OptimizerConfig;
use portfolio_frontier::PortfolioEngine;
use portfolio_frontier::PortfolioOptimizer;
use portfolio_frontier::ReturnMatrix;
use portfolio_frontier::WeightVector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rand_distr::Normal;

fn synthetic_engine(days: usize, assets: usize) -> PortfolioEngine {
  let mut rng = StdRng::seed_from_u64(7);
  let normal = Normal::new(0.0004, 0.012).unwrap();
  let data = Array2::from_shape_fn((days, assets), |_| normal.sample(&mut rng));
  let tickers = (0..assets).map(|i| format!("A{i}"));
  let universe = AssetUniverse::new(tickers).unwrap();
  PortfolioEngine::new(ReturnMatrix::new(universe, data).unwrap())
}

fn bench_search(c: &mut Criterion) {
  let mut group = c.benchmark_group("monte_carlo_search");
  let engine = synthetic_engine(756, 8);

  for &n in &[1_000usize, 5_000, 20_000] {
    let config = OptimizerConfig {
      num_simulations: n,
      ..Default::default()
    };
    let optimizer = PortfolioOptimizer::new(&engine, config).unwrap();

    group.bench_with_input(BenchmarkId::new("sequential", n), &n, |b, _| {
      b.iter(|| black_box(optimizer.run_seeded(42).unwrap()));
    });
    group.bench_with_input(BenchmarkId::new("parallel", n), &n, |b, _| {
      b.iter(|| black_box(optimizer.run_parallel(42, 8).unwrap()));
    });
  }

  group.finish();
}

fn bench_constrained(c: &mut Criterion) {
  let engine = synthetic_engine(756, 8);
  let config = OptimizerConfig {
    num_simulations: 2_000,
    apply_constraints: true,
    max_weight: 0.25,
    ..Default::default()
  };
  let optimizer = PortfolioOptimizer::new(&engine, config).unwrap();

  c.bench_function("monte_carlo_constrained_cap_0.25", |b| {
    b.iter(|| black_box(optimizer.run_parallel(42, 8).unwrap()));
  });
}

fn bench_risk_report(c: &mut Criterion) {
  let engine = synthetic_engine(2_520, 8);
  let w = WeightVector::equal(8).unwrap();

  c.bench_function("risk_report_10y_8_assets", |b| {
    b.iter(|| black_box(engine.risk_report(&w).unwrap()));
  });
}

criterion_group!(benches, bench_search, bench_constrained, bench_risk_report);
criterion_main!(benches);
