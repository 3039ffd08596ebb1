use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::irr::IrrSubject;

/// Activity as submitted. Every field is optional so that missing ones are
/// reported per item instead of failing deserialization of the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    pub portfolio_fund_id: Option<i64>,
    pub activity_type: Option<String>,
    /// `YYYY-MM-DD`
    pub activity_timestamp: Option<String>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationInput {
    pub portfolio_fund_id: Option<i64>,
    /// `YYYY-MM-DD`
    pub valuation_date: Option<String>,
    pub valuation: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedTransactionRequest {
    #[serde(default)]
    pub activities: Vec<ActivityInput>,
    #[serde(default)]
    pub valuations: Vec<ValuationInput>,
}

/// Steps of one save. `Failed` is reachable from every other step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStage {
    Validating,
    ActivitiesWrite,
    ValuationsWrite,
    RecalculateIrr,
    Done,
    Failed,
}

/// A (fund, date) pair that carries both an activity and a valuation in the same request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingConflict {
    pub portfolio_fund_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItemError {
    pub stage: SaveStage,
    /// `activity`, `valuation`, `fund` or `portfolio`.
    pub entity: String,
    /// Position in the request list, for activities and valuations.
    pub index: Option<usize>,
    pub entity_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrRecalculation {
    pub subject: IrrSubject,
    pub irr_date: NaiveDate,
    pub irr_percentage: Decimal,
    pub stored_irr_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedTransactionResult {
    pub success: bool,
    /// `Done`, or `Failed` when any item failed.
    pub stage: SaveStage,
    pub activities_saved: usize,
    pub valuations_saved: usize,
    pub irr_calculations: Vec<IrrRecalculation>,
    pub ordering_conflicts: Vec<OrderingConflict>,
    pub errors: Vec<TransactionItemError>,
}
