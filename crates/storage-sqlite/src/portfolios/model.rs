//! Database models for portfolios and portfolio funds.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::{format_date, parse_date};
use wealthdesk_core::portfolios::{
    FundStatus, NewPortfolio, NewPortfolioFund, Portfolio, PortfolioFund,
};
use wealthdesk_core::{Error, Result};

#[derive(
    Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::portfolios)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PortfolioDB {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolios)]
pub struct NewPortfolioDB {
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(
    Queryable,
    Identifiable,
    Associations,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(belongs_to(PortfolioDB, foreign_key = portfolio_id))]
#[diesel(table_name = crate::schema::portfolio_funds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PortfolioFundDB {
    pub id: i64,
    pub portfolio_id: i64,
    pub fund_name: String,
    pub status: String,
    pub start_date: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolio_funds)]
pub struct NewPortfolioFundDB {
    pub portfolio_id: i64,
    pub fund_name: String,
    pub status: String,
    pub start_date: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<PortfolioDB> for Portfolio {
    fn from(db: PortfolioDB) -> Self {
        Portfolio {
            id: db.id,
            name: db.name,
            created_at: db.created_at,
        }
    }
}

impl From<NewPortfolio> for NewPortfolioDB {
    fn from(domain: NewPortfolio) -> Self {
        NewPortfolioDB {
            name: domain.name,
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl TryFrom<PortfolioFundDB> for PortfolioFund {
    type Error = Error;

    fn try_from(db: PortfolioFundDB) -> Result<Self> {
        let start_date = db
            .start_date
            .as_deref()
            .map(|d| parse_date(d, "portfolio_funds.start_date"))
            .transpose()?;
        Ok(PortfolioFund {
            id: db.id,
            portfolio_id: db.portfolio_id,
            fund_name: db.fund_name,
            status: FundStatus::parse(&db.status),
            start_date,
            created_at: db.created_at,
        })
    }
}

impl From<NewPortfolioFund> for NewPortfolioFundDB {
    fn from(domain: NewPortfolioFund) -> Self {
        NewPortfolioFundDB {
            portfolio_id: domain.portfolio_id,
            fund_name: domain.fund_name,
            status: domain.status.as_str().to_string(),
            start_date: domain.start_date.map(format_date),
            created_at: Utc::now().naive_utc(),
        }
    }
}
