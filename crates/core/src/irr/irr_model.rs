use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::activities::FlowCategory;
use crate::constants::{DECIMAL_PRECISION, DISPLAY_DECIMAL_PRECISION};

/// Where a cash flow came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CashFlowKind {
    Activity(FlowCategory),
    /// Closing valuation appended to anchor the series. A zero value is a
    /// legitimate terminal state (full liquidation), not missing data.
    Terminal,
}

/// One dated, signed amount. Negative = paid into the fund, positive = returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: CashFlowKind,
}

impl CashFlow {
    pub fn activity(date: NaiveDate, amount: Decimal, category: FlowCategory) -> Self {
        Self {
            date,
            amount,
            kind: CashFlowKind::Activity(category),
        }
    }

    pub fn terminal(date: NaiveDate, amount: Decimal) -> Self {
        Self {
            date,
            amount,
            kind: CashFlowKind::Terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == CashFlowKind::Terminal
    }
}

/// Closing value that anchors a fund's series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalValue {
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Stored valuation row the value was read from; `None` when supplied by the caller.
    pub valuation_id: Option<i64>,
}

/// A fund's activity flows plus its closing value, for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundPosition {
    pub portfolio_fund_id: i64,
    pub cash_flows: Vec<CashFlow>,
    pub terminal: Option<TerminalValue>,
}

impl FundPosition {
    /// A fund with no activity and nothing (or zero) left contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.cash_flows.is_empty()
            && self
                .terminal
                .as_ref()
                .map(|t| t.amount.is_zero())
                .unwrap_or(true)
    }

    pub fn terminal_amount(&self) -> Decimal {
        self.terminal
            .as_ref()
            .map(|t| t.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Activity flows followed by the terminal flow, if any.
    pub fn series(&self) -> Vec<CashFlow> {
        let mut series = self.cash_flows.clone();
        if let Some(terminal) = &self.terminal {
            series.push(CashFlow::terminal(terminal.date, terminal.amount));
        }
        series
    }

    /// Sum of flows per reporting bucket; uplifts are kept apart from investments.
    pub fn totals_by_category(&self) -> HashMap<FlowCategory, Decimal> {
        let mut totals = HashMap::new();
        for flow in &self.cash_flows {
            if let CashFlowKind::Activity(category) = flow.kind {
                *totals.entry(category).or_insert(Decimal::ZERO) += flow.amount.abs();
            }
        }
        totals
    }
}

/// Output of the solver. `rate` is a fraction (0.072 = 7.2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrResult {
    pub rate: Decimal,
    pub as_of_date: NaiveDate,
    pub converged: bool,
    pub iterations: u32,
}

impl IrrResult {
    pub fn percentage(&self) -> Decimal {
        (self.rate * Decimal::ONE_HUNDRED).round_dp(DISPLAY_DECIMAL_PRECISION)
    }

    pub fn rounded_rate(&self) -> Decimal {
        self.rate.round_dp(DECIMAL_PRECISION)
    }
}

/// Solver output plus the facts callers report with it. This is what the cache holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrCalculation {
    pub result: IrrResult,
    pub start_date: NaiveDate,
    pub days_in_period: i64,
    pub total_valuation: Decimal,
    pub flow_count: usize,
}

/// What a stored IRR row is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum IrrSubject {
    Fund(i64),
    Portfolio(i64),
}

impl IrrSubject {
    pub fn kind_str(&self) -> &'static str {
        match self {
            IrrSubject::Fund(_) => "fund",
            IrrSubject::Portfolio(_) => "portfolio",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            IrrSubject::Fund(id) | IrrSubject::Portfolio(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: i64) -> Option<Self> {
        match kind {
            "fund" => Some(IrrSubject::Fund(id)),
            "portfolio" => Some(IrrSubject::Portfolio(id)),
            _ => None,
        }
    }
}

impl fmt::Display for IrrSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind_str(), self.id())
    }
}

/// Durable IRR row, unique on (subject, irr_date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredIrr {
    pub id: i64,
    pub subject: IrrSubject,
    pub irr_date: NaiveDate,
    /// Rate as a percentage (10.0 = 10%).
    pub irr_result: Decimal,
    pub valuation_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleFundIrrRequest {
    pub portfolio_fund_id: i64,
    pub valuation_date: NaiveDate,
    /// When absent the stored valuation on or before `valuation_date` anchors the series.
    #[serde(default)]
    pub valuation_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundIrrResponse {
    pub portfolio_fund_id: i64,
    pub valuation_date: NaiveDate,
    pub irr: Decimal,
    pub irr_percentage: Decimal,
    pub days_in_period: i64,
    pub calculation_method: String,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFundIrrRequest {
    pub portfolio_fund_ids: Vec<i64>,
    pub valuation_date: NaiveDate,
    pub fund_valuations: HashMap<i64, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFundIrrResponse {
    pub portfolio_fund_ids: Vec<i64>,
    pub valuation_date: NaiveDate,
    pub irr: Decimal,
    pub irr_percentage: Decimal,
    pub days_in_period: i64,
    pub calculation_method: String,
    pub total_valuation: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioIrrResponse {
    pub portfolio_id: i64,
    pub valuation_date: NaiveDate,
    pub irr: Decimal,
    pub irr_percentage: Decimal,
    pub days_in_period: i64,
    pub calculation_method: String,
    pub total_valuation: Decimal,
    pub stored: StoredIrr,
}

/// Outcome of linking orphaned stored IRR rows to their valuations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillSummary {
    pub examined: usize,
    pub linked: usize,
    pub unresolved: usize,
}
