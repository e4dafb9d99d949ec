//! # portfolio-frontier
//!
//! $$
//! \max_{\mathbf w \in \Delta^{N-1}} \frac{252\,\hat\mu^\top\mathbf w - r_f}{\sqrt{252\,\mathbf w^\top\hat\Sigma\mathbf w}}
//! $$
//!
//! Pure in-memory portfolio analytics: annualized performance, historical
//! VaR/CVaR, drawdowns, diversification and a constrained Monte Carlo search
//! over long-only weights.

pub mod portfolio;

pub use portfolio::*;
