//! # Portfolio Engine
//!
//! $$
//! \mu_p = 252\,\hat\mu^\top\mathbf w,\qquad
//! \sigma_p = \sqrt{\mathbf w^\top (252\,\hat\Sigma)\,\mathbf w}
//! $$
//!
//! Statistical summary of one return matrix and the performance, risk and
//! decomposition queries evaluated against it.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use ndarray::Zip;

use super::data::compound_curve;
use super::data::correlation_from_covariance;
use super::data::covariance_matrix;
use super::data::mean_vector;
use super::data::ReturnMatrix;
use super::data::WeightVector;
use super::error::PortfolioError;
use super::types::AssetMetrics;
use super::types::DiversificationBenefit;
use super::types::Drawdown;
use super::types::NormalizedCurves;
use super::types::PortfolioMetrics;
use super::types::RealizedMetrics;
use super::types::RiskReport;
use super::types::TailRisk;

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Base value of reconstructed value curves.
pub const CURVE_BASE: f64 = 100.0;

/// Runtime configuration for [`PortfolioEngine`].
#[derive(Clone, Copy, Debug)]
pub struct PortfolioEngineConfig {
  /// Annualized risk-free rate used in Sharpe computations.
  pub risk_free: f64,
  /// Confidence level for the VaR/CVaR of [`PortfolioEngine::risk_report`].
  pub confidence: f64,
}

impl Default for PortfolioEngineConfig {
  fn default() -> Self {
    Self {
      risk_free: 0.02,
      confidence: 0.95,
    }
  }
}

/// Sharpe ratio `(ret - risk_free) / vol`, defined as 0 when `vol` is exactly 0.
pub fn sharpe_ratio(ret: f64, vol: f64, risk_free: f64) -> f64 {
  if vol == 0.0 {
    0.0
  } else {
    (ret - risk_free) / vol
  }
}

/// Immutable statistical summary of one [`ReturnMatrix`].
///
/// Mean vector and covariance are computed once at construction. New data
/// means a new engine.
#[derive(Clone, Debug)]
pub struct PortfolioEngine {
  returns: ReturnMatrix,
  mean: Array1<f64>,
  cov: Array2<f64>,
  /// `252 * cov`, the form used by every volatility query.
  annual_cov: Array2<f64>,
  config: PortfolioEngineConfig,
}

impl PortfolioEngine {
  /// Construct an engine with the default configuration.
  pub fn new(returns: ReturnMatrix) -> Self {
    Self::with_config(returns, PortfolioEngineConfig::default())
  }

  /// Construct an engine with explicit configuration.
  pub fn with_config(returns: ReturnMatrix, config: PortfolioEngineConfig) -> Self {
    let mean = mean_vector(returns.values());
    let cov = covariance_matrix(returns.values(), mean.view());
    let annual_cov = &cov * TRADING_DAYS;

    Self {
      returns,
      mean,
      cov,
      annual_cov,
      config,
    }
  }

  pub fn config(&self) -> &PortfolioEngineConfig {
    &self.config
  }

  pub fn returns(&self) -> &ReturnMatrix {
    &self.returns
  }

  /// Number of assets (N).
  pub fn num_assets(&self) -> usize {
    self.mean.len()
  }

  /// Mean daily return per asset.
  pub fn mean_returns(&self) -> ArrayView1<'_, f64> {
    self.mean.view()
  }

  /// Daily sample covariance.
  pub fn covariance(&self) -> ArrayView2<'_, f64> {
    self.cov.view()
  }

  pub fn correlation_matrix(&self) -> Array2<f64> {
    correlation_from_covariance(self.cov.view())
  }

  /// Annualized `(return, volatility)` of a normalized weight vector.
  pub fn performance(&self, weights: &WeightVector) -> Result<(f64, f64), PortfolioError> {
    weights.check_len(self.num_assets())?;
    Ok(self.performance_unchecked(weights.values()))
  }

  pub(crate) fn performance_unchecked(&self, w: ArrayView1<f64>) -> (f64, f64) {
    let annual_return = TRADING_DAYS * self.mean.dot(&w);
    let variance = w.dot(&self.annual_cov.dot(&w));
    (annual_return, variance.max(0.0).sqrt())
  }

  /// Sharpe ratio against the configured risk-free rate.
  pub fn sharpe(&self, ret: f64, vol: f64) -> f64 {
    sharpe_ratio(ret, vol, self.config.risk_free)
  }

  /// Annualized return, volatility and Sharpe ratio in one call.
  pub fn metrics(&self, weights: &WeightVector) -> Result<PortfolioMetrics, PortfolioError> {
    let (annual_return, annual_volatility) = self.performance(weights)?;
    Ok(PortfolioMetrics {
      annual_return,
      annual_volatility,
      sharpe: self.sharpe(annual_return, annual_volatility),
    })
  }

  /// Historical VaR and CVaR of the daily portfolio return series.
  ///
  /// With `cutoff = floor((1 - confidence) * T)` on the ascending series,
  /// VaR is `|r[cutoff]|` and CVaR is `|mean(r[..cutoff])|`. CVaR is `None`
  /// when `cutoff == 0`.
  pub fn var_cvar(&self, weights: &WeightVector, confidence: f64) -> Result<TailRisk, PortfolioError> {
    if !(confidence > 0.0 && confidence < 1.0) {
      return Err(PortfolioError::InvalidConfidence(confidence));
    }

    let mut daily = self.returns.portfolio_returns(weights)?.to_vec();
    daily.sort_by(f64::total_cmp);

    let cutoff = ((1.0 - confidence) * daily.len() as f64).floor() as usize;
    let cutoff = cutoff.min(daily.len() - 1);
    let tail = &daily[..cutoff];
    let cvar = if tail.is_empty() {
      None
    } else {
      Some((tail.iter().sum::<f64>() / tail.len() as f64).abs())
    };

    Ok(TailRisk {
      confidence,
      cutoff,
      var: daily[cutoff].abs(),
      cvar,
    })
  }

  /// Drawdown of the base-100 compounded portfolio curve.
  ///
  /// Once the curve is wiped out to zero the drawdown is recorded as -1.
  pub fn drawdown(&self, weights: &WeightVector) -> Result<Drawdown, PortfolioError> {
    let daily = self.returns.portfolio_returns(weights)?;
    let curve = compound_curve(daily.view(), CURVE_BASE);

    let mut peak = f64::NEG_INFINITY;
    let series: Array1<f64> = curve
      .iter()
      .map(|&value| {
        peak = peak.max(value);
        if peak <= 0.0 {
          -1.0
        } else {
          (value - peak) / peak
        }
      })
      .collect();
    let max_drawdown = series.iter().copied().fold(0.0, f64::min);

    Ok(Drawdown {
      series,
      max_drawdown,
    })
  }

  /// Weighted-average standalone volatility versus actual portfolio volatility.
  pub fn diversification_benefit(
    &self,
    weights: &WeightVector,
  ) -> Result<DiversificationBenefit, PortfolioError> {
    let (_, portfolio_vol) = self.performance(weights)?;
    let weighted_avg_vol = self.weighted_avg_vol(weights.values());

    Ok(DiversificationBenefit {
      weighted_avg_vol,
      portfolio_vol,
      benefit: weighted_avg_vol - portfolio_vol,
      ratio: (portfolio_vol != 0.0).then(|| weighted_avg_vol / portfolio_vol),
    })
  }

  fn weighted_avg_vol(&self, w: ArrayView1<f64>) -> f64 {
    self
      .annual_cov
      .diag()
      .iter()
      .zip(w.iter())
      .map(|(&var, &wi)| wi * var.max(0.0).sqrt())
      .sum()
  }

  /// Base-100 value curves for every asset and for the portfolio.
  pub fn normalized_curve(&self, weights: &WeightVector) -> Result<NormalizedCurves, PortfolioError> {
    let daily = self.returns.portfolio_returns(weights)?;
    let values = self.returns.values();

    let mut assets = Array2::<f64>::zeros(values.dim());
    Zip::from(assets.columns_mut())
      .and(values.columns())
      .par_for_each(|mut curve, column| curve.assign(&compound_curve(column, CURVE_BASE)));

    Ok(NormalizedCurves {
      tickers: self.returns.universe().tickers().to_vec(),
      assets,
      portfolio: compound_curve(daily.view(), CURVE_BASE),
    })
  }

  /// Standalone annualized return and volatility per asset.
  ///
  /// Returns are compounded geometrically from the mean daily return.
  pub fn asset_metrics(&self) -> Vec<AssetMetrics> {
    self
      .returns
      .universe()
      .tickers()
      .iter()
      .enumerate()
      .map(|(i, ticker)| AssetMetrics {
        ticker: ticker.clone(),
        annual_return: (1.0 + self.mean[i]).powf(TRADING_DAYS) - 1.0,
        annual_volatility: self.annual_cov[[i, i]].max(0.0).sqrt(),
      })
      .collect()
  }

  /// Statistics of the realized daily portfolio series.
  pub fn realized_metrics(&self, weights: &WeightVector) -> Result<RealizedMetrics, PortfolioError> {
    let daily = self.returns.portfolio_returns(weights)?;
    let n = daily.len() as f64;
    let mean = daily.sum() / n;
    let variance = daily.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);

    let annual_return = (1.0 + mean).powf(TRADING_DAYS) - 1.0;
    let annual_volatility = variance.sqrt() * TRADING_DAYS.sqrt();
    let weighted_avg_vol = self.weighted_avg_vol(weights.values());

    Ok(RealizedMetrics {
      annual_return,
      annual_volatility,
      diversification_ratio: (annual_volatility != 0.0).then(|| weighted_avg_vol / annual_volatility),
    })
  }

  /// Performance, tail risk, drawdown and diversification of one allocation.
  pub fn risk_report(&self, weights: &WeightVector) -> Result<RiskReport, PortfolioError> {
    Ok(RiskReport {
      metrics: self.metrics(weights)?,
      tail: self.var_cvar(weights, self.config.confidence)?,
      max_drawdown: self.drawdown(weights)?.max_drawdown,
      diversification: self.diversification_benefit(weights)?,
    })
  }
}
