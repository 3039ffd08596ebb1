use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market value of one portfolio fund on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundValuation {
    pub id: i64,
    pub portfolio_fund_id: i64,
    pub valuation_date: NaiveDate,
    pub valuation: Decimal,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFundValuation {
    pub portfolio_fund_id: i64,
    pub valuation_date: NaiveDate,
    pub valuation: Decimal,
}

/// Total value of a portfolio on a given day; the sum of its fund valuations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub id: i64,
    pub portfolio_id: i64,
    pub valuation_date: NaiveDate,
    pub value: Decimal,
    pub created_at: NaiveDateTime,
}
