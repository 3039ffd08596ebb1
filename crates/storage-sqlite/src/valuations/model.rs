use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::{format_date, parse_date, parse_decimal};
use wealthdesk_core::valuations::{FundValuation, NewFundValuation, PortfolioValuation};
use wealthdesk_core::{Error, Result};

#[derive(
    Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::fund_valuations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct FundValuationDB {
    pub id: i64,
    pub portfolio_fund_id: i64,
    pub valuation_date: String,
    pub valuation: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::fund_valuations)]
pub struct NewFundValuationDB {
    pub portfolio_fund_id: i64,
    pub valuation_date: String,
    pub valuation: String,
    pub created_at: NaiveDateTime,
}

#[derive(
    Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::portfolio_valuations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuationDB {
    pub id: i64,
    pub portfolio_id: i64,
    pub valuation_date: String,
    pub value: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolio_valuations)]
pub struct NewPortfolioValuationDB {
    pub portfolio_id: i64,
    pub valuation_date: String,
    pub value: String,
    pub created_at: NaiveDateTime,
}

impl NewPortfolioValuationDB {
    pub fn new(portfolio_id: i64, valuation_date: NaiveDate, value: Decimal) -> Self {
        NewPortfolioValuationDB {
            portfolio_id,
            valuation_date: format_date(valuation_date),
            value: value.to_string(),
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl TryFrom<FundValuationDB> for FundValuation {
    type Error = Error;

    fn try_from(db: FundValuationDB) -> Result<Self> {
        Ok(FundValuation {
            id: db.id,
            portfolio_fund_id: db.portfolio_fund_id,
            valuation_date: parse_date(&db.valuation_date, "fund_valuations.valuation_date")?,
            valuation: parse_decimal(&db.valuation, "fund_valuations.valuation")?,
            created_at: db.created_at,
        })
    }
}

impl From<NewFundValuation> for NewFundValuationDB {
    fn from(domain: NewFundValuation) -> Self {
        NewFundValuationDB {
            portfolio_fund_id: domain.portfolio_fund_id,
            valuation_date: format_date(domain.valuation_date),
            valuation: domain.valuation.to_string(),
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl TryFrom<PortfolioValuationDB> for PortfolioValuation {
    type Error = Error;

    fn try_from(db: PortfolioValuationDB) -> Result<Self> {
        Ok(PortfolioValuation {
            id: db.id,
            portfolio_id: db.portfolio_id,
            valuation_date: parse_date(&db.valuation_date, "portfolio_valuations.valuation_date")?,
            value: parse_decimal(&db.value, "portfolio_valuations.value")?,
            created_at: db.created_at,
        })
    }
}
