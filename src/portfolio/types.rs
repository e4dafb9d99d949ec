//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}} \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! $$
//!
//! Shared enums and result containers for portfolio analytics and search.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;

use super::data::WeightVector;
use super::error::PortfolioError;

/// Annualized return, volatility and Sharpe ratio of one portfolio.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PortfolioMetrics {
  pub annual_return: f64,
  pub annual_volatility: f64,
  pub sharpe: f64,
}

impl PortfolioMetrics {
  /// `[return, volatility, sharpe]`, the row order of [`SimulationResult::metrics`].
  pub fn as_array(&self) -> [f64; 3] {
    [self.annual_return, self.annual_volatility, self.sharpe]
  }

  pub(crate) fn from_column(col: ArrayView1<f64>) -> Self {
    Self {
      annual_return: col[0],
      annual_volatility: col[1],
      sharpe: col[2],
    }
  }
}

/// Portfolio picked out of a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedPortfolio {
  /// Column of the pick in [`SimulationResult::metrics`].
  pub index: usize,
  pub weights: WeightVector,
  pub metrics: PortfolioMetrics,
}

/// Accepted samples of a Monte Carlo run and the two selected portfolios.
#[derive(Clone, Debug)]
pub struct SimulationResult {
  /// 3×K array: annual return, annual volatility and Sharpe per accepted sample.
  pub metrics: Array2<f64>,
  /// K×N array of the accepted weight vectors, in draw order.
  pub weights: Array2<f64>,
  /// Tangency (max-Sharpe) portfolio.
  pub max_sharpe: SelectedPortfolio,
  /// Minimum-volatility portfolio.
  pub min_vol: SelectedPortfolio,
  pub requested: usize,
  pub accepted: usize,
  pub attempts: usize,
  /// Constraints were switched off because `max_weight < 1/N`.
  pub constraints_relaxed: bool,
}

/// A run that accepted no sample at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationFailure {
  pub requested: usize,
  pub attempts: usize,
  pub constraints_relaxed: bool,
}

/// Outcome of a Monte Carlo search.
#[derive(Clone, Debug)]
pub enum SimulationOutcome {
  /// Every requested sample was accepted.
  Success(SimulationResult),
  /// The attempt budget ran out after at least one accepted sample.
  Partial(SimulationResult),
  /// No sample was accepted within the attempt budget.
  Failure(SimulationFailure),
}

impl SimulationOutcome {
  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success(_))
  }

  pub fn is_partial(&self) -> bool {
    matches!(self, Self::Partial(_))
  }

  pub fn is_failure(&self) -> bool {
    matches!(self, Self::Failure(_))
  }

  /// Populated result of a successful or partial run.
  pub fn result(&self) -> Option<&SimulationResult> {
    match self {
      Self::Success(result) | Self::Partial(result) => Some(result),
      Self::Failure(_) => None,
    }
  }

  pub fn constraints_relaxed(&self) -> bool {
    match self {
      Self::Success(result) | Self::Partial(result) => result.constraints_relaxed,
      Self::Failure(failure) => failure.constraints_relaxed,
    }
  }

  /// Result of a run that reached its target, an error otherwise.
  pub fn into_optimum(self) -> Result<SimulationResult, PortfolioError> {
    match self {
      Self::Success(result) => Ok(result),
      Self::Partial(result) => Err(PortfolioError::SearchExhausted {
        accepted: result.accepted,
        requested: result.requested,
      }),
      Self::Failure(failure) => Err(PortfolioError::NoFeasiblePortfolio {
        requested: failure.requested,
        attempts: failure.attempts,
      }),
    }
  }
}

/// Historical Value-at-Risk and Conditional VaR of a daily return series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TailRisk {
  pub confidence: f64,
  /// `floor((1 - confidence) * T)`, index of the VaR observation.
  pub cutoff: usize,
  pub var: f64,
  /// Mean loss strictly beyond the cutoff; `None` when the tail is empty.
  pub cvar: Option<f64>,
}

/// Drawdown series of a base-100 portfolio curve.
#[derive(Clone, Debug, PartialEq)]
pub struct Drawdown {
  /// `(value_t - peak_t) / peak_t`, one entry per day, all `<= 0`.
  pub series: Array1<f64>,
  /// Most negative entry of `series`.
  pub max_drawdown: f64,
}

/// Volatility reduction from combining imperfectly correlated assets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiversificationBenefit {
  /// `sum_i w_i sigma_i`, ignoring correlation.
  pub weighted_avg_vol: f64,
  pub portfolio_vol: f64,
  /// `weighted_avg_vol - portfolio_vol`.
  pub benefit: f64,
  /// `weighted_avg_vol / portfolio_vol`; `None` when the portfolio has no volatility.
  pub ratio: Option<f64>,
}

/// Base-100 value curves of every asset and of the portfolio.
#[derive(Clone, Debug)]
pub struct NormalizedCurves {
  pub tickers: Vec<String>,
  /// T×N, column order as `tickers`.
  pub assets: Array2<f64>,
  pub portfolio: Array1<f64>,
}

/// Standalone annualized statistics of a single asset.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetMetrics {
  pub ticker: String,
  /// `(1 + mean_daily)^252 - 1`.
  pub annual_return: f64,
  pub annual_volatility: f64,
}

/// Statistics of the realized daily portfolio return series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RealizedMetrics {
  pub annual_return: f64,
  pub annual_volatility: f64,
  pub diversification_ratio: Option<f64>,
}

/// Risk summary of a chosen allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskReport {
  pub metrics: PortfolioMetrics,
  pub tail: TailRisk,
  pub max_drawdown: f64,
  pub diversification: DiversificationBenefit,
}
