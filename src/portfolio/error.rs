//! # Portfolio Errors
//!
//! Rejected inputs, invalid configuration and exhausted searches.

use thiserror::Error;

/// Errors produced by the portfolio engine, optimizer and backtest helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
  #[error("asset universe is empty")]
  EmptyUniverse,
  #[error("asset `{0}` appears more than once in the universe")]
  DuplicateAsset(String),
  #[error("return matrix needs at least 2 observations, got {rows}")]
  InsufficientObservations { rows: usize },
  #[error("expected {expected} columns, got {actual}")]
  ShapeMismatch { expected: usize, actual: usize },
  #[error("expected {expected} dates, got {actual}")]
  DateCountMismatch { expected: usize, actual: usize },
  #[error("non-finite return at row {row}, column {col}")]
  NonFiniteReturn { row: usize, col: usize },
  #[error("return at row {row}, column {col} is below -100% ({value})")]
  ReturnBelowTotalLoss { row: usize, col: usize, value: f64 },
  #[error("non-finite or non-positive price at row {row}, column {col}")]
  InvalidPrice { row: usize, col: usize },

  #[error("weight vector has {actual} entries but the universe has {expected} assets")]
  WeightLengthMismatch { expected: usize, actual: usize },
  #[error("weights sum to zero")]
  ZeroSumWeights,
  #[error("weight {index} is negative ({value})")]
  NegativeWeight { index: usize, value: f64 },
  #[error("weight {index} is not finite")]
  NonFiniteWeight { index: usize },
  #[error("weights must sum to 1, got {sum}")]
  WeightsNotNormalized { sum: f64 },

  #[error("confidence must lie in (0, 1), got {0}")]
  InvalidConfidence(f64),
  #[error("max weight must lie in (0, 1], got {0}")]
  InvalidMaxWeight(f64),
  #[error("number of simulations must be positive")]
  InvalidSimulationCount,
  #[error("attempts per sample must be positive")]
  InvalidAttemptFactor,
  #[error("worker count must be positive")]
  InvalidWorkerCount,

  #[error("calendar rebalancing requires trading dates on the return matrix")]
  MissingDates,

  #[error("no feasible portfolio found after {attempts} attempts ({requested} requested)")]
  NoFeasiblePortfolio { requested: usize, attempts: usize },
  #[error("search exhausted its budget with {accepted} of {requested} samples")]
  SearchExhausted { accepted: usize, requested: usize },
  #[error("metrics contain NaN, selection order is undefined")]
  UndefinedOrder,
}
