//! # Portfolio Data
//!
//! $$
//! \hat\Sigma = \frac{1}{T-1}(R-\mathbf 1\hat\mu^\top)^\top(R-\mathbf 1\hat\mu^\top)
//! $$
//!
//! Validated input containers (asset universe, return matrix, weight vector)
//! and the sample statistics derived from them.

use std::collections::HashSet;

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use ndarray::Axis;

use super::error::PortfolioError;

/// Tolerance used when checking that a weight vector sums to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Ordered, duplicate-free list of asset identifiers.
///
/// The order defines the column order of every matrix and weight vector
/// derived from this universe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetUniverse {
  tickers: Vec<String>,
}

impl AssetUniverse {
  /// Build a universe, rejecting empty and duplicate ticker lists.
  pub fn new<S: Into<String>>(tickers: impl IntoIterator<Item = S>) -> Result<Self, PortfolioError> {
    let tickers: Vec<String> = tickers.into_iter().map(Into::into).collect();
    if tickers.is_empty() {
      return Err(PortfolioError::EmptyUniverse);
    }

    let mut seen = HashSet::with_capacity(tickers.len());
    for ticker in &tickers {
      if !seen.insert(ticker.as_str()) {
        return Err(PortfolioError::DuplicateAsset(ticker.clone()));
      }
    }

    Ok(Self { tickers })
  }

  pub fn len(&self) -> usize {
    self.tickers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tickers.is_empty()
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Column index of `ticker`, if present.
  pub fn position(&self, ticker: &str) -> Option<usize> {
    self.tickers.iter().position(|t| t == ticker)
  }
}

/// Dense T×N table of daily fractional returns, columns ordered as the universe.
#[derive(Clone, Debug)]
pub struct ReturnMatrix {
  universe: AssetUniverse,
  data: Array2<f64>,
  dates: Option<Vec<NaiveDate>>,
}

impl ReturnMatrix {
  /// Validate and wrap a return table.
  ///
  /// Requires at least two rows, one column per asset and finite entries no
  /// lower than -1.
  pub fn new(universe: AssetUniverse, data: Array2<f64>) -> Result<Self, PortfolioError> {
    let (rows, cols) = data.dim();
    if cols != universe.len() {
      return Err(PortfolioError::ShapeMismatch {
        expected: universe.len(),
        actual: cols,
      });
    }
    if rows < 2 {
      return Err(PortfolioError::InsufficientObservations { rows });
    }
    if let Some(((row, col), _)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
      return Err(PortfolioError::NonFiniteReturn { row, col });
    }
    if let Some(((row, col), &value)) = data.indexed_iter().find(|(_, v)| **v < -1.0) {
      return Err(PortfolioError::ReturnBelowTotalLoss { row, col, value });
    }

    Ok(Self {
      universe,
      data,
      dates: None,
    })
  }

  /// Build simple daily returns `p_t / p_{t-1} - 1` from a (T+1)×N price table.
  ///
  /// When `dates` is supplied it must hold one date per price row; the first
  /// date is dropped together with the first price row.
  pub fn from_prices(
    universe: AssetUniverse,
    prices: ArrayView2<f64>,
    dates: Option<Vec<NaiveDate>>,
  ) -> Result<Self, PortfolioError> {
    let (rows, cols) = prices.dim();
    if cols != universe.len() {
      return Err(PortfolioError::ShapeMismatch {
        expected: universe.len(),
        actual: cols,
      });
    }
    if let Some(((row, col), _)) = prices
      .indexed_iter()
      .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
      return Err(PortfolioError::InvalidPrice { row, col });
    }
    if rows < 3 {
      return Err(PortfolioError::InsufficientObservations {
        rows: rows.saturating_sub(1),
      });
    }

    let mut data = Array2::<f64>::zeros((rows - 1, cols));
    for t in 1..rows {
      for j in 0..cols {
        data[[t - 1, j]] = prices[[t, j]] / prices[[t - 1, j]] - 1.0;
      }
    }

    let matrix = Self::new(universe, data)?;
    match dates {
      Some(dates) => {
        if dates.len() != rows {
          return Err(PortfolioError::DateCountMismatch {
            expected: rows,
            actual: dates.len(),
          });
        }
        matrix.with_dates(dates[1..].to_vec())
      }
      None => Ok(matrix),
    }
  }

  /// Attach one trading date per row.
  pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self, PortfolioError> {
    if dates.len() != self.rows() {
      return Err(PortfolioError::DateCountMismatch {
        expected: self.rows(),
        actual: dates.len(),
      });
    }
    self.dates = Some(dates);
    Ok(self)
  }

  pub fn universe(&self) -> &AssetUniverse {
    &self.universe
  }

  pub fn values(&self) -> ArrayView2<'_, f64> {
    self.data.view()
  }

  pub fn dates(&self) -> Option<&[NaiveDate]> {
    self.dates.as_deref()
  }

  /// Number of trading days (T).
  pub fn rows(&self) -> usize {
    self.data.nrows()
  }

  /// Number of assets (N).
  pub fn cols(&self) -> usize {
    self.data.ncols()
  }

  /// Per-day portfolio return series `R w`.
  pub fn portfolio_returns(&self, weights: &WeightVector) -> Result<Array1<f64>, PortfolioError> {
    weights.check_len(self.cols())?;
    Ok(self.data.dot(&weights.values()))
  }
}

/// Long-only weight vector summing to one.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightVector {
  weights: Array1<f64>,
}

impl WeightVector {
  /// Wrap weights that are already normalized.
  pub fn new(weights: impl Into<Array1<f64>>) -> Result<Self, PortfolioError> {
    let weights = weights.into();
    validate_entries(weights.view())?;

    let sum = weights.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
      return Err(PortfolioError::WeightsNotNormalized { sum });
    }

    Ok(Self { weights })
  }

  /// Scale non-negative raw weights so that they sum to one.
  pub fn normalize(raw: impl Into<Array1<f64>>) -> Result<Self, PortfolioError> {
    let raw = raw.into();
    validate_entries(raw.view())?;

    let sum = raw.sum();
    if sum == 0.0 {
      return Err(PortfolioError::ZeroSumWeights);
    }

    Ok(Self { weights: raw / sum })
  }

  /// The 1/N portfolio.
  pub fn equal(n: usize) -> Result<Self, PortfolioError> {
    if n == 0 {
      return Err(PortfolioError::EmptyUniverse);
    }
    Ok(Self {
      weights: Array1::from_elem(n, 1.0 / n as f64),
    })
  }

  /// Wrap a draw the optimizer has just normalized itself.
  pub(crate) fn from_normalized(weights: Array1<f64>) -> Self {
    Self { weights }
  }

  pub fn len(&self) -> usize {
    self.weights.len()
  }

  pub fn is_empty(&self) -> bool {
    self.weights.is_empty()
  }

  pub fn values(&self) -> ArrayView1<'_, f64> {
    self.weights.view()
  }

  pub fn to_vec(&self) -> Vec<f64> {
    self.weights.to_vec()
  }

  pub(crate) fn check_len(&self, expected: usize) -> Result<(), PortfolioError> {
    if self.len() != expected {
      return Err(PortfolioError::WeightLengthMismatch {
        expected,
        actual: self.len(),
      });
    }
    Ok(())
  }
}

fn validate_entries(weights: ArrayView1<f64>) -> Result<(), PortfolioError> {
  if weights.is_empty() {
    return Err(PortfolioError::EmptyUniverse);
  }
  for (index, &value) in weights.iter().enumerate() {
    if !value.is_finite() {
      return Err(PortfolioError::NonFiniteWeight { index });
    }
    if value < 0.0 {
      return Err(PortfolioError::NegativeWeight { index, value });
    }
  }
  Ok(())
}

/// Column means of a return table.
pub fn mean_vector(returns: ArrayView2<f64>) -> Array1<f64> {
  let rows = returns.nrows().max(1) as f64;
  returns.sum_axis(Axis(0)) / rows
}

/// Bessel-corrected sample covariance of the columns of a return table.
pub fn covariance_matrix(returns: ArrayView2<f64>, mean: ArrayView1<f64>) -> Array2<f64> {
  let rows = returns.nrows();
  if rows < 2 {
    return Array2::zeros((returns.ncols(), returns.ncols()));
  }

  let centered = &returns - &mean.insert_axis(Axis(0));
  centered.t().dot(&centered) / (rows - 1) as f64
}

/// Pearson correlation matrix implied by a covariance matrix.
pub fn correlation_from_covariance(cov: ArrayView2<f64>) -> Array2<f64> {
  let n = cov.nrows();
  let sigmas: Vec<f64> = (0..n).map(|i| cov[[i, i]].max(0.0).sqrt()).collect();
  let mut corr = Array2::<f64>::zeros((n, n));

  for i in 0..n {
    for j in 0..n {
      let denom = sigmas[i] * sigmas[j];
      corr[[i, j]] = if i == j {
        1.0
      } else if denom > 1e-15 {
        (cov[[i, j]] / denom).clamp(-1.0, 1.0)
      } else {
        0.0
      };
    }
  }

  corr
}

/// Base-`initial` compounded value curve of a daily return series.
pub fn compound_curve(returns: ArrayView1<f64>, initial: f64) -> Array1<f64> {
  let mut value = initial;
  returns
    .iter()
    .map(|r| {
      value *= 1.0 + r;
      value
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  fn universe(n: usize) -> AssetUniverse {
    AssetUniverse::new((0..n).map(|i| format!("A{i}"))).unwrap()
  }

  #[test]
  fn universe_rejects_duplicates_and_empty() {
    assert_eq!(
      AssetUniverse::new(Vec::<String>::new()),
      Err(PortfolioError::EmptyUniverse)
    );
    assert_eq!(
      AssetUniverse::new(["AAPL", "MSFT", "AAPL"]),
      Err(PortfolioError::DuplicateAsset("AAPL".to_string()))
    );

    let u = AssetUniverse::new(["AAPL", "MSFT"]).unwrap();
    assert_eq!(u.position("MSFT"), Some(1));
    assert_eq!(u.position("GLD"), None);
  }

  #[test]
  fn return_matrix_validates_shape_and_values() {
    let err = ReturnMatrix::new(universe(2), array![[0.01, 0.02]]).unwrap_err();
    assert_eq!(err, PortfolioError::InsufficientObservations { rows: 1 });

    let err = ReturnMatrix::new(universe(3), array![[0.01, 0.02], [0.0, 0.0]]).unwrap_err();
    assert_eq!(
      err,
      PortfolioError::ShapeMismatch {
        expected: 3,
        actual: 2
      }
    );

    let err = ReturnMatrix::new(universe(2), array![[0.01, f64::NAN], [0.0, 0.0]]).unwrap_err();
    assert_eq!(err, PortfolioError::NonFiniteReturn { row: 0, col: 1 });

    let err = ReturnMatrix::new(universe(1), array![[-1.5], [1.0]]).unwrap_err();
    assert_eq!(
      err,
      PortfolioError::ReturnBelowTotalLoss {
        row: 0,
        col: 0,
        value: -1.5
      }
    );
    assert!(ReturnMatrix::new(universe(1), array![[-1.0], [0.0]]).is_ok());
  }

  #[test]
  fn from_prices_computes_simple_returns_and_drops_first_date() {
    let prices = array![[100.0, 50.0], [110.0, 50.0], [99.0, 55.0]];
    let dates: Vec<NaiveDate> = (1..=3)
      .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
      .collect();

    let m = ReturnMatrix::from_prices(universe(2), prices.view(), Some(dates.clone())).unwrap();
    assert_eq!(m.rows(), 2);
    assert_abs_diff_eq!(m.values()[[0, 0]], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(m.values()[[1, 0]], -0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(m.values()[[1, 1]], 0.1, epsilon = 1e-12);
    assert_eq!(m.dates().unwrap(), &dates[1..]);

    let bad = array![[100.0, 50.0], [0.0, 50.0], [99.0, 55.0]];
    assert_eq!(
      ReturnMatrix::from_prices(universe(2), bad.view(), None).unwrap_err(),
      PortfolioError::InvalidPrice { row: 1, col: 0 }
    );
  }

  #[test]
  fn weight_vector_validation() {
    assert_eq!(
      WeightVector::normalize(vec![0.0, 0.0]),
      Err(PortfolioError::ZeroSumWeights)
    );
    assert!(matches!(
      WeightVector::new(vec![0.5, 0.6]),
      Err(PortfolioError::WeightsNotNormalized { .. })
    ));
    assert!(matches!(
      WeightVector::new(vec![1.2, -0.2]),
      Err(PortfolioError::NegativeWeight { index: 1, .. })
    ));

    let w = WeightVector::normalize(vec![1.0, 3.0]).unwrap();
    assert_abs_diff_eq!(w.values()[0], 0.25, epsilon = 1e-15);
    assert_abs_diff_eq!(w.values()[1], 0.75, epsilon = 1e-15);

    let eq = WeightVector::equal(4).unwrap();
    assert_abs_diff_eq!(eq.values().sum(), 1.0, epsilon = 1e-15);
  }

  #[test]
  fn covariance_is_bessel_corrected() {
    let r = array![[0.01, 0.02], [0.03, -0.02], [-0.01, 0.00]];
    let mu = mean_vector(r.view());
    assert_abs_diff_eq!(mu[0], 0.01, epsilon = 1e-15);
    assert_abs_diff_eq!(mu[1], 0.0, epsilon = 1e-15);

    let cov = covariance_matrix(r.view(), mu.view());
    // deviations a: [0, 0.02, -0.02], b: [0.02, -0.02, 0]
    assert_abs_diff_eq!(cov[[0, 0]], 0.0008 / 2.0, epsilon = 1e-15);
    assert_abs_diff_eq!(cov[[1, 1]], 0.0008 / 2.0, epsilon = 1e-15);
    assert_abs_diff_eq!(cov[[0, 1]], -0.0004 / 2.0, epsilon = 1e-15);
    assert_abs_diff_eq!(cov[[1, 0]], cov[[0, 1]], epsilon = 0.0);

    let corr = correlation_from_covariance(cov.view());
    assert_abs_diff_eq!(corr[[0, 1]], -0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(corr[[1, 1]], 1.0, epsilon = 0.0);
  }

  #[test]
  fn correlation_handles_zero_variance_asset() {
    let cov = array![[0.04, 0.0], [0.0, 0.0]];
    let corr = correlation_from_covariance(cov.view());
    assert_eq!(corr[[0, 1]], 0.0);
    assert_eq!(corr[[1, 1]], 1.0);
  }

  #[test]
  fn compound_curve_starts_from_initial_value() {
    let curve = compound_curve(array![0.1, -0.5].view(), 100.0);
    assert_abs_diff_eq!(curve[0], 110.0, epsilon = 1e-12);
    assert_abs_diff_eq!(curve[1], 55.0, epsilon = 1e-12);
  }
}
