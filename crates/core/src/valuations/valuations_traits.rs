//! Repository trait for fund and portfolio valuations.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::valuations_model::*;
use crate::errors::Result;

#[async_trait]
pub trait ValuationRepositoryTrait: Send + Sync {
    /// Insert or replace the valuation of a fund for its date.
    async fn upsert_fund_valuation(&self, valuation: NewFundValuation) -> Result<FundValuation>;

    /// Insert or replace the total valuation of a portfolio for a date.
    async fn upsert_portfolio_valuation(
        &self,
        portfolio_id: i64,
        valuation_date: NaiveDate,
        value: Decimal,
    ) -> Result<PortfolioValuation>;

    /// Most recent valuation dated on or before `as_of`.
    fn get_latest_fund_valuation(
        &self,
        portfolio_fund_id: i64,
        as_of: NaiveDate,
    ) -> Result<Option<FundValuation>>;

    fn get_fund_valuation_on(
        &self,
        portfolio_fund_id: i64,
        valuation_date: NaiveDate,
    ) -> Result<Option<FundValuation>>;

    /// Valuations of the given funds dated exactly `valuation_date`.
    fn get_fund_valuations_on(
        &self,
        portfolio_fund_ids: &[i64],
        valuation_date: NaiveDate,
    ) -> Result<Vec<FundValuation>>;

    /// Dates of every valuation of the fund on or after `from`, ascending.
    fn get_fund_valuation_dates_from(
        &self,
        portfolio_fund_id: i64,
        from: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;
}
