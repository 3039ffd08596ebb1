use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::cache::CacheStats;
use super::irr_model::*;
use crate::errors::Result;

/// Durable store of computed IRR values.
#[async_trait]
pub trait StoredIrrRepositoryTrait: Send + Sync {
    /// Writes the IRR for (subject, date) exactly once per key.
    ///
    /// An existing row is updated in place. A `None` valuation id keeps the link
    /// already on the row.
    async fn upsert_stored_irr(
        &self,
        subject: IrrSubject,
        irr_date: NaiveDate,
        irr_result: Decimal,
        valuation_id: Option<i64>,
    ) -> Result<StoredIrr>;

    fn get_stored_irr(&self, subject: IrrSubject, irr_date: NaiveDate) -> Result<Option<StoredIrr>>;

    fn count_stored_irr(&self, subject: IrrSubject, irr_date: NaiveDate) -> Result<i64>;

    /// Rows still missing their valuation link, oldest first.
    fn get_unlinked_stored_irrs(&self) -> Result<Vec<StoredIrr>>;
}

/// IRR operations exposed to the transport layer and the transaction coordinator.
#[async_trait]
pub trait IrrServiceTrait: Send + Sync {
    fn calculate_fund_irr(&self, request: SingleFundIrrRequest) -> Result<FundIrrResponse>;

    fn calculate_multi_fund_irr(&self, request: MultiFundIrrRequest) -> Result<MultiFundIrrResponse>;

    /// Recomputes a fund's IRR from stored data and persists it for `as_of`.
    async fn recalculate_fund_irr(&self, portfolio_fund_id: i64, as_of: NaiveDate) -> Result<StoredIrr>;

    /// Pools every fund of the portfolio, persists the portfolio valuation and IRR.
    async fn calculate_portfolio_irr(
        &self,
        portfolio_id: i64,
        as_of: NaiveDate,
    ) -> Result<PortfolioIrrResponse>;

    fn get_stored_irr(&self, subject: IrrSubject, irr_date: NaiveDate) -> Result<Option<StoredIrr>>;

    async fn backfill_valuation_links(&self) -> Result<BackfillSummary>;

    fn invalidate_funds(&self, portfolio_fund_ids: &[i64]) -> usize;

    fn cache_stats(&self) -> CacheStats;

    fn sweep_cache(&self) -> usize;
}
