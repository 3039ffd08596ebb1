//! Portfolios and the funds they hold.

mod portfolios_model;
mod portfolios_traits;

pub use portfolios_model::{FundStatus, NewPortfolio, NewPortfolioFund, Portfolio, PortfolioFund};
pub use portfolios_traits::PortfolioRepositoryTrait;
