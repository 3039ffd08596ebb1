use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A client portfolio grouping several fund holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolio {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FundStatus {
    #[default]
    Active,
    /// Fully exited. Historical flows still count towards portfolio IRR.
    Inactive,
}

impl FundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundStatus::Active => "active",
            FundStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "inactive" => FundStatus::Inactive,
            _ => FundStatus::Active,
        }
    }
}

/// One fund held inside a portfolio. Activities and valuations hang off this id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioFund {
    pub id: i64,
    pub portfolio_id: i64,
    pub fund_name: String,
    pub status: FundStatus,
    pub start_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolioFund {
    pub portfolio_id: i64,
    pub fund_name: String,
    #[serde(default)]
    pub status: FundStatus,
    pub start_date: Option<NaiveDate>,
}
