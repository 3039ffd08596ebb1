//! Activity domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::activities_constants::*;

/// Which way money moves, seen from the client holding the fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowDirection {
    /// Money paid into the fund (negative cash flow).
    Outflow,
    /// Money returned from the fund (positive cash flow).
    Inflow,
}

/// Reporting bucket of an activity. Buckets with the same direction solve identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowCategory {
    Investment,
    Uplift,
    SwitchIn,
    Withdrawal,
    SwitchOut,
}

/// Closed set of activity types found in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Investment,
    RegularInvestment,
    #[serde(alias = "TaxUplift")]
    GovernmentUplift,
    #[serde(alias = "SwitchIn")]
    FundSwitchIn,
    ProductSwitchIn,
    Withdrawal,
    RegularWithdrawal,
    #[serde(alias = "SwitchOut")]
    FundSwitchOut,
    ProductSwitchOut,
}

impl ActivityType {
    pub const ALL: [ActivityType; 9] = [
        ActivityType::Investment,
        ActivityType::RegularInvestment,
        ActivityType::GovernmentUplift,
        ActivityType::FundSwitchIn,
        ActivityType::ProductSwitchIn,
        ActivityType::Withdrawal,
        ActivityType::RegularWithdrawal,
        ActivityType::FundSwitchOut,
        ActivityType::ProductSwitchOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Investment => ACTIVITY_TYPE_INVESTMENT,
            ActivityType::RegularInvestment => ACTIVITY_TYPE_REGULAR_INVESTMENT,
            ActivityType::GovernmentUplift => ACTIVITY_TYPE_GOVERNMENT_UPLIFT,
            ActivityType::FundSwitchIn => ACTIVITY_TYPE_FUND_SWITCH_IN,
            ActivityType::ProductSwitchIn => ACTIVITY_TYPE_PRODUCT_SWITCH_IN,
            ActivityType::Withdrawal => ACTIVITY_TYPE_WITHDRAWAL,
            ActivityType::RegularWithdrawal => ACTIVITY_TYPE_REGULAR_WITHDRAWAL,
            ActivityType::FundSwitchOut => ACTIVITY_TYPE_FUND_SWITCH_OUT,
            ActivityType::ProductSwitchOut => ACTIVITY_TYPE_PRODUCT_SWITCH_OUT,
        }
    }

    /// The classification table. Every variant must appear here exactly once,
    /// so adding a type forces a decision on its sign.
    pub fn classify(&self) -> (FlowDirection, FlowCategory) {
        match self {
            ActivityType::Investment | ActivityType::RegularInvestment => {
                (FlowDirection::Outflow, FlowCategory::Investment)
            }
            ActivityType::GovernmentUplift => (FlowDirection::Outflow, FlowCategory::Uplift),
            ActivityType::FundSwitchIn | ActivityType::ProductSwitchIn => {
                (FlowDirection::Outflow, FlowCategory::SwitchIn)
            }
            ActivityType::Withdrawal | ActivityType::RegularWithdrawal => {
                (FlowDirection::Inflow, FlowCategory::Withdrawal)
            }
            ActivityType::FundSwitchOut | ActivityType::ProductSwitchOut => {
                (FlowDirection::Inflow, FlowCategory::SwitchOut)
            }
        }
    }

    pub fn direction(&self) -> FlowDirection {
        self.classify().0
    }

    pub fn category(&self) -> FlowCategory {
        self.classify().1
    }

    /// Applies the sign convention to an unsigned activity amount.
    pub fn signed_amount(&self, amount: Decimal) -> Decimal {
        match self.direction() {
            FlowDirection::Outflow => -amount.abs(),
            FlowDirection::Inflow => amount.abs(),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            s if s == ACTIVITY_TYPE_INVESTMENT => Ok(ActivityType::Investment),
            s if s == ACTIVITY_TYPE_REGULAR_INVESTMENT => Ok(ActivityType::RegularInvestment),
            s if s == ACTIVITY_TYPE_GOVERNMENT_UPLIFT || s == ACTIVITY_TYPE_TAX_UPLIFT_LEGACY => {
                Ok(ActivityType::GovernmentUplift)
            }
            s if s == ACTIVITY_TYPE_FUND_SWITCH_IN || s == ACTIVITY_TYPE_SWITCH_IN_LEGACY => {
                Ok(ActivityType::FundSwitchIn)
            }
            s if s == ACTIVITY_TYPE_PRODUCT_SWITCH_IN => Ok(ActivityType::ProductSwitchIn),
            s if s == ACTIVITY_TYPE_WITHDRAWAL => Ok(ActivityType::Withdrawal),
            s if s == ACTIVITY_TYPE_REGULAR_WITHDRAWAL => Ok(ActivityType::RegularWithdrawal),
            s if s == ACTIVITY_TYPE_FUND_SWITCH_OUT || s == ACTIVITY_TYPE_SWITCH_OUT_LEGACY => {
                Ok(ActivityType::FundSwitchOut)
            }
            s if s == ACTIVITY_TYPE_PRODUCT_SWITCH_OUT => Ok(ActivityType::ProductSwitchOut),
            _ => Err(format!("Unknown activity type: {}", s)),
        }
    }
}

/// Domain model representing one row of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub portfolio_fund_id: i64,
    pub activity_type: ActivityType,
    pub activity_timestamp: NaiveDate,
    /// Unsigned amount as entered; the sign comes from `activity_type`.
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
}

impl Activity {
    pub fn signed_amount(&self) -> Decimal {
        self.activity_type.signed_amount(self.amount)
    }
}

/// Input model for creating a new activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub portfolio_fund_id: i64,
    pub activity_type: ActivityType,
    pub activity_timestamp: NaiveDate,
    pub amount: Decimal,
}
