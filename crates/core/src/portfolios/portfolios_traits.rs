use async_trait::async_trait;

use super::portfolios_model::*;
use crate::Result;

/// Repository for portfolios and the funds they hold.
#[async_trait]
pub trait PortfolioRepositoryTrait: Send + Sync {
    async fn create_portfolio(&self, new_portfolio: NewPortfolio) -> Result<Portfolio>;
    async fn create_fund(&self, new_fund: NewPortfolioFund) -> Result<PortfolioFund>;

    fn get_portfolio(&self, portfolio_id: i64) -> Result<Option<Portfolio>>;
    fn get_fund(&self, portfolio_fund_id: i64) -> Result<Option<PortfolioFund>>;

    /// Returns the funds that exist among `portfolio_fund_ids`, in id order.
    fn get_funds_by_ids(&self, portfolio_fund_ids: &[i64]) -> Result<Vec<PortfolioFund>>;

    /// Every fund of the portfolio, exited ones included.
    fn get_funds_for_portfolio(&self, portfolio_id: i64) -> Result<Vec<PortfolioFund>>;
}
