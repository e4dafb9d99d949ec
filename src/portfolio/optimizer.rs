//! # Portfolio Optimizer
//!
//! $$
//! \mathbf w = \frac{\mathbf u}{\mathbf 1^\top\mathbf u},\quad u_i \overset{iid}{\sim}\mathcal U[0,1),
//! \qquad \text{accept iff } \max_i w_i \le w_{\max}
//! $$
//!
//! Bounded rejection-sampling search over the weight simplex, scored by
//! [`PortfolioEngine`], approximating the efficient frontier and selecting
//! the max-Sharpe and min-volatility portfolios.
//!
//! Draws are normalized independent uniforms, which concentrates mass near
//! the centroid of the simplex. This is not a Dirichlet(1, ..., 1) draw.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray_stats::QuantileExt;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;
use tracing::warn;

use super::data::WeightVector;
use super::engine::PortfolioEngine;
use super::error::PortfolioError;
use super::types::PortfolioMetrics;
use super::types::SelectedPortfolio;
use super::types::SimulationFailure;
use super::types::SimulationOutcome;
use super::types::SimulationResult;

/// Configuration for [`PortfolioOptimizer`].
#[derive(Clone, Copy, Debug)]
pub struct OptimizerConfig {
  /// Target number of accepted samples.
  pub num_simulations: usize,
  /// Reject draws with any weight above `max_weight`.
  pub apply_constraints: bool,
  /// Per-asset cap, only read when `apply_constraints` is set.
  pub max_weight: f64,
  /// Attempt budget per requested sample.
  pub attempts_per_sample: usize,
}

impl Default for OptimizerConfig {
  fn default() -> Self {
    Self {
      num_simulations: 5000,
      apply_constraints: false,
      max_weight: 1.0,
      attempts_per_sample: 50,
    }
  }
}

/// Monte Carlo efficient-frontier search over one engine.
///
/// Holds no state between runs; every run draws from the generator it is given.
#[derive(Clone, Debug)]
pub struct PortfolioOptimizer<'a> {
  engine: &'a PortfolioEngine,
  config: OptimizerConfig,
  cap: Option<f64>,
  constraints_relaxed: bool,
}

struct Batch {
  weights: Vec<f64>,
  metrics: Vec<[f64; 3]>,
  attempts: usize,
}

impl<'a> PortfolioOptimizer<'a> {
  /// Validate `config` against the engine's universe.
  ///
  /// A cap below `1/N` cannot be met by any full allocation; constraints are
  /// then disabled and every run reports `constraints_relaxed`.
  pub fn new(engine: &'a PortfolioEngine, config: OptimizerConfig) -> Result<Self, PortfolioError> {
    if config.num_simulations == 0 {
      return Err(PortfolioError::InvalidSimulationCount);
    }
    if config.attempts_per_sample == 0 {
      return Err(PortfolioError::InvalidAttemptFactor);
    }
    if config.apply_constraints && !(config.max_weight > 0.0 && config.max_weight <= 1.0) {
      return Err(PortfolioError::InvalidMaxWeight(config.max_weight));
    }

    let n = engine.num_assets();
    let floor = 1.0 / n as f64;
    let constraints_relaxed = config.apply_constraints && config.max_weight < floor;
    if constraints_relaxed {
      warn!(
        max_weight = config.max_weight,
        min_feasible = floor,
        assets = n,
        "max weight below 1/N, disabling constraints for this optimizer"
      );
    }

    let cap = (config.apply_constraints && !constraints_relaxed).then_some(config.max_weight);

    Ok(Self {
      engine,
      config,
      cap,
      constraints_relaxed,
    })
  }

  pub fn config(&self) -> &OptimizerConfig {
    &self.config
  }

  /// Constraints were requested but are infeasible and have been disabled.
  pub fn constraints_relaxed(&self) -> bool {
    self.constraints_relaxed
  }

  /// Total attempt budget of one run.
  pub fn max_attempts(&self) -> usize {
    self
      .config
      .num_simulations
      .saturating_mul(self.config.attempts_per_sample)
  }

  /// Run the search on a caller-supplied generator.
  pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SimulationOutcome, PortfolioError> {
    let batch = self.sample_batch(rng, self.config.num_simulations, self.max_attempts());
    self.finish(vec![batch], 1)
  }

  /// Run the search on a `StdRng` seeded with `seed`.
  pub fn run_seeded(&self, seed: u64) -> Result<SimulationOutcome, PortfolioError> {
    let mut rng = StdRng::seed_from_u64(seed);
    self.run(&mut rng)
  }

  /// Split target and attempt budget across `workers` rayon tasks.
  ///
  /// Each worker draws from its own `StdRng`, seeded from a master generator
  /// built on `seed`. Batches are merged in worker order before selection, so
  /// the outcome depends only on `(seed, workers)`.
  pub fn run_parallel(&self, seed: u64, workers: usize) -> Result<SimulationOutcome, PortfolioError> {
    if workers == 0 {
      return Err(PortfolioError::InvalidWorkerCount);
    }

    let requested = self.config.num_simulations;
    let workers = workers.min(requested);
    let mut master = StdRng::seed_from_u64(seed);
    let seeds: Vec<u64> = (0..workers).map(|_| master.random()).collect();

    let batches: Vec<Batch> = seeds
      .into_par_iter()
      .enumerate()
      .map(|(i, worker_seed)| {
        let target = requested / workers + usize::from(i < requested % workers);
        let budget = target.saturating_mul(self.config.attempts_per_sample);
        let mut rng = StdRng::seed_from_u64(worker_seed);
        self.sample_batch(&mut rng, target, budget)
      })
      .collect();

    self.finish(batches, workers)
  }

  fn sample_batch<R: Rng + ?Sized>(&self, rng: &mut R, target: usize, budget: usize) -> Batch {
    let n = self.engine.num_assets();
    let mut draw = Array1::<f64>::zeros(n);
    let mut batch = Batch {
      weights: Vec::with_capacity(target * n),
      metrics: Vec::with_capacity(target),
      attempts: 0,
    };

    while batch.metrics.len() < target && batch.attempts < budget {
      batch.attempts += 1;

      for w in draw.iter_mut() {
        *w = rng.random::<f64>();
      }
      let sum = draw.sum();
      if sum == 0.0 {
        continue;
      }
      draw /= sum;

      if let Some(cap) = self.cap {
        if draw.iter().any(|&w| w > cap) {
          continue;
        }
      }

      let (ret, vol) = self.engine.performance_unchecked(draw.view());
      let sharpe = self.engine.sharpe(ret, vol);
      batch.weights.extend(draw.iter().copied());
      batch.metrics.push([ret, vol, sharpe]);
    }

    batch
  }

  fn finish(&self, batches: Vec<Batch>, workers: usize) -> Result<SimulationOutcome, PortfolioError> {
    let n = self.engine.num_assets();
    let requested = self.config.num_simulations;
    let attempts: usize = batches.iter().map(|b| b.attempts).sum();
    let accepted: usize = batches.iter().map(|b| b.metrics.len()).sum();

    debug!(requested, accepted, attempts, workers, "monte carlo search finished");

    if accepted == 0 {
      warn!(requested, attempts, "no feasible portfolio found within the attempt budget");
      return Ok(SimulationOutcome::Failure(SimulationFailure {
        requested,
        attempts,
        constraints_relaxed: self.constraints_relaxed,
      }));
    }

    let mut flat_weights = Vec::with_capacity(accepted * n);
    let mut rows = Vec::with_capacity(accepted);
    for batch in batches {
      flat_weights.extend(batch.weights);
      rows.extend(batch.metrics);
    }

    let weights = Array2::from_shape_fn((accepted, n), |(k, j)| flat_weights[k * n + j]);
    let metrics = Array2::from_shape_fn((3, accepted), |(r, k)| rows[k][r]);

    let (max_idx, min_idx) = select_indices(metrics.view())?;
    let pick = |index: usize| SelectedPortfolio {
      index,
      weights: WeightVector::from_normalized(weights.row(index).to_owned()),
      metrics: PortfolioMetrics::from_column(metrics.column(index)),
    };
    let max_sharpe = pick(max_idx);
    let min_vol = pick(min_idx);

    let result = SimulationResult {
      metrics,
      weights,
      max_sharpe,
      min_vol,
      requested,
      accepted,
      attempts,
      constraints_relaxed: self.constraints_relaxed,
    };

    if accepted < requested {
      warn!(
        requested,
        accepted,
        attempts,
        "attempt budget exhausted before reaching the sample target"
      );
      Ok(SimulationOutcome::Partial(result))
    } else {
      Ok(SimulationOutcome::Success(result))
    }
  }
}

/// First-occurrence argmax of the Sharpe row and argmin of the volatility row.
fn select_indices(metrics: ArrayView2<f64>) -> Result<(usize, usize), PortfolioError> {
  let max_sharpe = metrics
    .row(2)
    .argmax()
    .map_err(|_| PortfolioError::UndefinedOrder)?;
  let min_vol = metrics
    .row(1)
    .argmin()
    .map_err(|_| PortfolioError::UndefinedOrder)?;
  Ok((max_sharpe, min_vol))
}
