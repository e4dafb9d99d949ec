//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Portfolio analytics over a historical return matrix and Monte Carlo
//! efficient-frontier search.

pub mod backtest;
pub mod data;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod types;

pub use backtest::rebalanced_curve;
pub use backtest::run_strategy;
pub use backtest::AllocationStrategy;
pub use backtest::RebalanceFrequency;
pub use data::AssetUniverse;
pub use data::ReturnMatrix;
pub use data::WeightVector;
pub use engine::sharpe_ratio;
pub use engine::PortfolioEngine;
pub use engine::PortfolioEngineConfig;
pub use engine::TRADING_DAYS;
pub use error::PortfolioError;
pub use optimizer::OptimizerConfig;
pub use optimizer::PortfolioOptimizer;
pub use types::AssetMetrics;
pub use types::DiversificationBenefit;
pub use types::Drawdown;
pub use types::NormalizedCurves;
pub use types::PortfolioMetrics;
pub use types::RealizedMetrics;
pub use types::RiskReport;
pub use types::SelectedPortfolio;
pub use types::SimulationFailure;
pub use types::SimulationOutcome;
pub use types::SimulationResult;
pub use types::TailRisk;
