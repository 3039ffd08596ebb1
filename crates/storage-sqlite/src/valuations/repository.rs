use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::model::{
    FundValuationDB, NewFundValuationDB, NewPortfolioValuationDB, PortfolioValuationDB,
};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{fund_valuations, portfolio_valuations};
use crate::utils::{chunk_for_sqlite, format_date, parse_date};
use wealthdesk_core::valuations::{
    FundValuation, NewFundValuation, PortfolioValuation, ValuationRepositoryTrait,
};
use wealthdesk_core::Result;

pub struct ValuationRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ValuationRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ValuationRepository { pool, writer }
    }
}

#[async_trait]
impl ValuationRepositoryTrait for ValuationRepository {
    async fn upsert_fund_valuation(&self, valuation: NewFundValuation) -> Result<FundValuation> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FundValuation> {
                let row = NewFundValuationDB::from(valuation);
                diesel::insert_into(fund_valuations::table)
                    .values(&row)
                    .on_conflict((
                        fund_valuations::portfolio_fund_id,
                        fund_valuations::valuation_date,
                    ))
                    .do_update()
                    .set(fund_valuations::valuation.eq(&row.valuation))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let stored = fund_valuations::table
                    .filter(fund_valuations::portfolio_fund_id.eq(row.portfolio_fund_id))
                    .filter(fund_valuations::valuation_date.eq(&row.valuation_date))
                    .select(FundValuationDB::as_select())
                    .first::<FundValuationDB>(conn)
                    .map_err(StorageError::from)?;
                FundValuation::try_from(stored)
            })
            .await
    }

    async fn upsert_portfolio_valuation(
        &self,
        portfolio_id: i64,
        valuation_date: NaiveDate,
        value: Decimal,
    ) -> Result<PortfolioValuation> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PortfolioValuation> {
                let row = NewPortfolioValuationDB::new(portfolio_id, valuation_date, value);
                diesel::insert_into(portfolio_valuations::table)
                    .values(&row)
                    .on_conflict((
                        portfolio_valuations::portfolio_id,
                        portfolio_valuations::valuation_date,
                    ))
                    .do_update()
                    .set(portfolio_valuations::value.eq(&row.value))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let stored = portfolio_valuations::table
                    .filter(portfolio_valuations::portfolio_id.eq(portfolio_id))
                    .filter(portfolio_valuations::valuation_date.eq(&row.valuation_date))
                    .select(PortfolioValuationDB::as_select())
                    .first::<PortfolioValuationDB>(conn)
                    .map_err(StorageError::from)?;
                PortfolioValuation::try_from(stored)
            })
            .await
    }

    fn get_latest_fund_valuation(
        &self,
        portfolio_fund_id: i64,
        as_of: NaiveDate,
    ) -> Result<Option<FundValuation>> {
        let mut conn = get_connection(&self.pool)?;
        fund_valuations::table
            .filter(fund_valuations::portfolio_fund_id.eq(portfolio_fund_id))
            .filter(fund_valuations::valuation_date.le(format_date(as_of)))
            .order(fund_valuations::valuation_date.desc())
            .select(FundValuationDB::as_select())
            .first::<FundValuationDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(FundValuation::try_from)
            .transpose()
    }

    fn get_fund_valuation_on(
        &self,
        portfolio_fund_id: i64,
        valuation_date: NaiveDate,
    ) -> Result<Option<FundValuation>> {
        let mut conn = get_connection(&self.pool)?;
        fund_valuations::table
            .filter(fund_valuations::portfolio_fund_id.eq(portfolio_fund_id))
            .filter(fund_valuations::valuation_date.eq(format_date(valuation_date)))
            .select(FundValuationDB::as_select())
            .first::<FundValuationDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(FundValuation::try_from)
            .transpose()
    }

    fn get_fund_valuations_on(
        &self,
        portfolio_fund_ids: &[i64],
        valuation_date: NaiveDate,
    ) -> Result<Vec<FundValuation>> {
        let mut conn = get_connection(&self.pool)?;
        let on = format_date(valuation_date);
        let mut rows = Vec::new();
        for chunk in chunk_for_sqlite(portfolio_fund_ids) {
            let found = fund_valuations::table
                .filter(fund_valuations::portfolio_fund_id.eq_any(chunk))
                .filter(fund_valuations::valuation_date.eq(&on))
                .select(FundValuationDB::as_select())
                .load::<FundValuationDB>(&mut conn)
                .map_err(StorageError::from)?;
            rows.extend(found);
        }
        rows.sort_by_key(|v| v.portfolio_fund_id);
        rows.into_iter().map(FundValuation::try_from).collect()
    }

    fn get_fund_valuation_dates_from(
        &self,
        portfolio_fund_id: i64,
        from: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let dates = fund_valuations::table
            .filter(fund_valuations::portfolio_fund_id.eq(portfolio_fund_id))
            .filter(fund_valuations::valuation_date.ge(format_date(from)))
            .order(fund_valuations::valuation_date.asc())
            .select(fund_valuations::valuation_date)
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        dates
            .iter()
            .map(|d| parse_date(d, "fund_valuations.valuation_date"))
            .collect()
    }
}
