use chrono::{Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::activities::ActivityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Once,
    Weekly,
    Monthly,
    Quarterly,
    Annually,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Once => "once",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Quarterly => "quarterly",
            Recurrence::Annually => "annually",
        }
    }

    /// Next occurrence after `from`. `None` for one-time schedules.
    ///
    /// Month arithmetic clamps to the last day of shorter months.
    pub fn advance(&self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Recurrence::Once => None,
            Recurrence::Weekly => from.checked_add_signed(Duration::days(7)),
            Recurrence::Monthly => from.checked_add_months(Months::new(1)),
            Recurrence::Quarterly => from.checked_add_months(Months::new(3)),
            Recurrence::Annually => from.checked_add_months(Months::new(12)),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "once" => Ok(Recurrence::Once),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            "quarterly" => Ok(Recurrence::Quarterly),
            "annually" => Ok(Recurrence::Annually),
            _ => Err(format!("Unknown recurrence: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Active => "active",
            ScheduleStatus::Paused => "paused",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ScheduleStatus::Active),
            "paused" => Ok(ScheduleStatus::Paused),
            "cancelled" => Ok(ScheduleStatus::Cancelled),
            _ => Err(format!("Unknown schedule status: {}", s)),
        }
    }
}

/// Recurring or one-time future activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTransaction {
    pub id: i64,
    pub portfolio_fund_id: i64,
    pub activity_type: ActivityType,
    pub amount: Decimal,
    pub recurrence: Recurrence,
    pub next_execution_date: NaiveDate,
    pub status: ScheduleStatus,
    pub max_executions: Option<i32>,
    pub total_executions: i32,
    pub last_executed_date: Option<NaiveDate>,
}

impl ScheduledTransaction {
    /// Occurrences due on or before `today`, oldest first, bounded by the remaining
    /// execution allowance.
    pub fn due_occurrences(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let mut remaining = self
            .max_executions
            .map(|max| (max - self.total_executions).max(0) as usize)
            .unwrap_or(usize::MAX);
        let mut dates = Vec::new();
        let mut next = Some(self.next_execution_date);
        while let Some(date) = next {
            if date > today || remaining == 0 {
                break;
            }
            dates.push(date);
            remaining -= 1;
            next = self.recurrence.advance(date);
        }
        dates
    }

    /// Bookkeeping once the occurrence on `date` has run.
    pub fn execution_after(&self, date: NaiveDate) -> ScheduleExecutionUpdate {
        let total_executions = self.total_executions + 1;
        let next = self.recurrence.advance(date);
        let exhausted = self
            .max_executions
            .map(|max| total_executions >= max)
            .unwrap_or(false);
        ScheduleExecutionUpdate {
            next_execution_date: next.unwrap_or(date),
            total_executions,
            last_executed_date: Some(date),
            status: if next.is_none() || exhausted {
                ScheduleStatus::Cancelled
            } else {
                ScheduleStatus::Active
            },
        }
    }

    /// Bookkeeping that puts a schedule back into this state.
    pub fn execution_state(&self) -> ScheduleExecutionUpdate {
        ScheduleExecutionUpdate {
            next_execution_date: self.next_execution_date,
            total_executions: self.total_executions,
            last_executed_date: self.last_executed_date,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduledTransaction {
    pub portfolio_fund_id: i64,
    pub activity_type: ActivityType,
    pub amount: Decimal,
    pub recurrence: Recurrence,
    pub next_execution_date: NaiveDate,
    #[serde(default)]
    pub max_executions: Option<i32>,
}

/// Execution bookkeeping written back after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleExecutionUpdate {
    pub next_execution_date: NaiveDate,
    pub total_executions: i32,
    pub last_executed_date: Option<NaiveDate>,
    pub status: ScheduleStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFailure {
    pub scheduled_transaction_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub schedules_due: usize,
    pub activities_created: usize,
    pub schedules_completed: usize,
    pub failures: Vec<ScheduleFailure>,
}
