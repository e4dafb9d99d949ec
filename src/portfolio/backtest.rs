//! # Rebalanced Backtest
//!
//! $$
//! V_{k} = V_{k-1}\Bigl(1 + \sum_i w_i\bigl(\textstyle\prod_{t\in P_k}(1+r_{t,i}) - 1\bigr)\Bigr)
//! $$
//!
//! Value curves of fixed-weight allocations rebalanced daily, weekly or monthly.

use chrono::Datelike;
use chrono::NaiveDate;
use ndarray::s;
use ndarray::Array1;

use super::data::compound_curve;
use super::data::ReturnMatrix;
use super::data::WeightVector;
use super::error::PortfolioError;

/// How target weights are chosen.
#[derive(Clone, Debug, PartialEq)]
pub enum AllocationStrategy {
  /// 1/N in every asset.
  EqualWeight,
  /// Caller-supplied raw weights, normalized to sum to one.
  Custom(Vec<f64>),
}

impl AllocationStrategy {
  /// Resolve the strategy into weights for a universe of `n` assets.
  pub fn weights(&self, n: usize) -> Result<WeightVector, PortfolioError> {
    match self {
      Self::EqualWeight => WeightVector::equal(n),
      Self::Custom(raw) => {
        if raw.len() != n {
          return Err(PortfolioError::WeightLengthMismatch {
            expected: n,
            actual: raw.len(),
          });
        }
        WeightVector::normalize(raw.clone())
      }
    }
  }
}

/// Rebalancing calendar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RebalanceFrequency {
  /// Weights are restored every trading day.
  #[default]
  Daily,
  /// Weights are restored at each ISO week boundary.
  Weekly,
  /// Weights are restored at each calendar month boundary.
  Monthly,
}

impl RebalanceFrequency {
  fn period_key(&self, date: NaiveDate) -> (i32, u32) {
    match self {
      Self::Daily => (date.year(), date.ordinal()),
      Self::Weekly => {
        let week = date.iso_week();
        (week.year(), week.week())
      }
      Self::Monthly => (date.year(), date.month()),
    }
  }
}

/// Value curve of `weights` rebalanced at `frequency`, starting from `initial_value`.
///
/// Between rebalancing dates each asset compounds on its own; the curve holds
/// the end-of-period value for every day of the period.
pub fn rebalanced_curve(
  returns: &ReturnMatrix,
  weights: &WeightVector,
  frequency: RebalanceFrequency,
  initial_value: f64,
) -> Result<Array1<f64>, PortfolioError> {
  if frequency == RebalanceFrequency::Daily {
    let daily = returns.portfolio_returns(weights)?;
    return Ok(compound_curve(daily.view(), initial_value));
  }

  weights.check_len(returns.cols())?;
  let dates = returns.dates().ok_or(PortfolioError::MissingDates)?;
  let values = returns.values();
  let w = weights.values();

  let mut curve = Array1::<f64>::zeros(returns.rows());
  let mut value = initial_value;
  let mut start = 0;

  while start < dates.len() {
    let key = frequency.period_key(dates[start]);
    let end = dates[start..]
      .iter()
      .position(|&d| frequency.period_key(d) != key)
      .map_or(dates.len(), |offset| start + offset);

    let period = values.slice(s![start..end, ..]);
    let period_return: f64 = period
      .columns()
      .into_iter()
      .zip(w.iter())
      .map(|(col, &wi)| wi * (col.iter().map(|r| 1.0 + r).product::<f64>() - 1.0))
      .sum();

    value *= 1.0 + period_return;
    curve.slice_mut(s![start..end]).fill(value);
    start = end;
  }

  Ok(curve)
}

/// Resolve `strategy` and backtest it at `frequency`.
pub fn run_strategy(
  returns: &ReturnMatrix,
  strategy: &AllocationStrategy,
  frequency: RebalanceFrequency,
  initial_value: f64,
) -> Result<Array1<f64>, PortfolioError> {
  let weights = strategy.weights(returns.cols())?;
  rebalanced_curve(returns, &weights, frequency, initial_value)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;
  use crate::portfolio::data::AssetUniverse;

  fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  /// Two assets over Fri 2024-01-26, Mon 2024-01-29, Wed 2024-01-31, Thu 2024-02-01.
  fn dated_matrix() -> ReturnMatrix {
    let universe = AssetUniverse::new(["AAA", "BBB"]).unwrap();
    ReturnMatrix::new(
      universe,
      array![[0.10, 0.00], [0.10, -0.10], [-0.10, 0.20], [0.00, 0.10]],
    )
    .unwrap()
    .with_dates(vec![
      day(2024, 1, 26),
      day(2024, 1, 29),
      day(2024, 1, 31),
      day(2024, 2, 1),
    ])
    .unwrap()
  }

  #[test]
  fn daily_rebalancing_compounds_weighted_returns() {
    let m = dated_matrix();
    let w = WeightVector::equal(2).unwrap();
    let curve = rebalanced_curve(&m, &w, RebalanceFrequency::Daily, 1.0).unwrap();

    // daily portfolio returns: 0.05, 0.0, 0.05, 0.05
    assert_abs_diff_eq!(curve[0], 1.05, epsilon = 1e-12);
    assert_abs_diff_eq!(curve[1], 1.05, epsilon = 1e-12);
    assert_abs_diff_eq!(curve[3], 1.05_f64.powi(3), epsilon = 1e-12);
  }

  #[test]
  fn monthly_rebalancing_holds_period_value() {
    let m = dated_matrix();
    let w = WeightVector::equal(2).unwrap();
    let curve = rebalanced_curve(&m, &w, RebalanceFrequency::Monthly, 1.0).unwrap();

    // January: AAA 1.1*1.1*0.9 - 1 = 0.089, BBB 1.0*0.9*1.2 - 1 = 0.08
    let january = 1.0 + 0.5 * 0.089 + 0.5 * 0.08;
    assert_abs_diff_eq!(curve[0], january, epsilon = 1e-12);
    assert_abs_diff_eq!(curve[2], january, epsilon = 1e-12);
    // February: 0.5 * 0.0 + 0.5 * 0.1
    assert_abs_diff_eq!(curve[3], january * 1.05, epsilon = 1e-12);
  }

  #[test]
  fn weekly_rebalancing_splits_on_iso_weeks() {
    let m = dated_matrix();
    let w = WeightVector::new(vec![1.0, 0.0]).unwrap();
    let curve = rebalanced_curve(&m, &w, RebalanceFrequency::Weekly, 100.0).unwrap();

    assert_abs_diff_eq!(curve[0], 110.0, epsilon = 1e-9);
    // Mon..Thu share one ISO week: 1.1 * 0.9 * 1.0
    let week = 110.0 * (1.1 * 0.9 * 1.0);
    assert_abs_diff_eq!(curve[1], week, epsilon = 1e-9);
    assert_abs_diff_eq!(curve[3], week, epsilon = 1e-9);
  }

  #[test]
  fn calendar_rebalancing_requires_dates() {
    let universe = AssetUniverse::new(["AAA"]).unwrap();
    let m = ReturnMatrix::new(universe, array![[0.01], [0.02]]).unwrap();
    let w = WeightVector::equal(1).unwrap();

    assert_eq!(
      rebalanced_curve(&m, &w, RebalanceFrequency::Weekly, 1.0),
      Err(PortfolioError::MissingDates)
    );
  }

  #[test]
  fn strategies_resolve_weights() {
    let m = dated_matrix();
    let custom = AllocationStrategy::Custom(vec![3.0, 1.0]);
    let w = custom.weights(2).unwrap();
    assert_abs_diff_eq!(w.values()[0], 0.75, epsilon = 1e-15);

    assert_eq!(
      AllocationStrategy::Custom(vec![1.0]).weights(2),
      Err(PortfolioError::WeightLengthMismatch {
        expected: 2,
        actual: 1
      })
    );

    let eq = run_strategy(&m, &AllocationStrategy::EqualWeight, RebalanceFrequency::Daily, 1.0).unwrap();
    assert_eq!(eq.len(), 4);
    assert_abs_diff_eq!(eq[0], 1.05, epsilon = 1e-12);
  }
}
