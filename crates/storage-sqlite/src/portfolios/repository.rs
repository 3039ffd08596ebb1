use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use super::model::{NewPortfolioDB, NewPortfolioFundDB, PortfolioDB, PortfolioFundDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{portfolio_funds, portfolios};
use crate::utils::chunk_for_sqlite;
use wealthdesk_core::portfolios::{
    NewPortfolio, NewPortfolioFund, Portfolio, PortfolioFund, PortfolioRepositoryTrait,
};
use wealthdesk_core::Result;

pub struct PortfolioRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PortfolioRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        PortfolioRepository { pool, writer }
    }

    fn to_funds(rows: Vec<PortfolioFundDB>) -> Result<Vec<PortfolioFund>> {
        rows.into_iter().map(PortfolioFund::try_from).collect()
    }
}

#[async_trait]
impl PortfolioRepositoryTrait for PortfolioRepository {
    async fn create_portfolio(&self, new_portfolio: NewPortfolio) -> Result<Portfolio> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Portfolio> {
                let row = diesel::insert_into(portfolios::table)
                    .values(NewPortfolioDB::from(new_portfolio))
                    .returning(PortfolioDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(row.into())
            })
            .await
    }

    async fn create_fund(&self, new_fund: NewPortfolioFund) -> Result<PortfolioFund> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PortfolioFund> {
                let row = diesel::insert_into(portfolio_funds::table)
                    .values(NewPortfolioFundDB::from(new_fund))
                    .returning(PortfolioFundDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                PortfolioFund::try_from(row)
            })
            .await
    }

    fn get_portfolio(&self, portfolio_id: i64) -> Result<Option<Portfolio>> {
        let mut conn = get_connection(&self.pool)?;
        let row = portfolios::table
            .find(portfolio_id)
            .select(PortfolioDB::as_select())
            .first::<PortfolioDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Portfolio::from))
    }

    fn get_fund(&self, portfolio_fund_id: i64) -> Result<Option<PortfolioFund>> {
        let mut conn = get_connection(&self.pool)?;
        portfolio_funds::table
            .find(portfolio_fund_id)
            .select(PortfolioFundDB::as_select())
            .first::<PortfolioFundDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(PortfolioFund::try_from)
            .transpose()
    }

    fn get_funds_by_ids(&self, portfolio_fund_ids: &[i64]) -> Result<Vec<PortfolioFund>> {
        let mut conn = get_connection(&self.pool)?;
        let mut rows = Vec::with_capacity(portfolio_fund_ids.len());
        for chunk in chunk_for_sqlite(portfolio_fund_ids) {
            let found = portfolio_funds::table
                .filter(portfolio_funds::id.eq_any(chunk))
                .select(PortfolioFundDB::as_select())
                .load::<PortfolioFundDB>(&mut conn)
                .map_err(StorageError::from)?;
            rows.extend(found);
        }
        rows.sort_by_key(|f| f.id);
        rows.dedup_by_key(|f| f.id);
        Self::to_funds(rows)
    }

    fn get_funds_for_portfolio(&self, portfolio_id: i64) -> Result<Vec<PortfolioFund>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = portfolio_funds::table
            .filter(portfolio_funds::portfolio_id.eq(portfolio_id))
            .order(portfolio_funds::id.asc())
            .select(PortfolioFundDB::as_select())
            .load::<PortfolioFundDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::to_funds(rows)
    }
}
