use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::StorageError;
use crate::utils::{format_date, parse_date, parse_decimal};
use wealthdesk_core::activities::ActivityType;
use wealthdesk_core::scheduled::{
    NewScheduledTransaction, Recurrence, ScheduleStatus, ScheduledTransaction,
};
use wealthdesk_core::{Error, Result};

#[derive(
    Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::scheduled_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTransactionDB {
    pub id: i64,
    pub portfolio_fund_id: i64,
    pub activity_type: String,
    pub amount: String,
    pub recurrence: String,
    pub next_execution_date: String,
    pub status: String,
    pub max_executions: Option<i32>,
    pub total_executions: i32,
    pub last_executed_date: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::scheduled_transactions)]
pub struct NewScheduledTransactionDB {
    pub portfolio_fund_id: i64,
    pub activity_type: String,
    pub amount: String,
    pub recurrence: String,
    pub next_execution_date: String,
    pub status: String,
    pub max_executions: Option<i32>,
    pub total_executions: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn corrupt(id: i64, message: String) -> Error {
    StorageError::CorruptRow(format!("scheduled_transactions {}: {}", id, message)).into()
}

impl TryFrom<ScheduledTransactionDB> for ScheduledTransaction {
    type Error = Error;

    fn try_from(db: ScheduledTransactionDB) -> Result<Self> {
        let id = db.id;
        Ok(ScheduledTransaction {
            id,
            portfolio_fund_id: db.portfolio_fund_id,
            activity_type: ActivityType::from_str(&db.activity_type).map_err(|e| corrupt(id, e))?,
            amount: parse_decimal(&db.amount, "scheduled_transactions.amount")?,
            recurrence: Recurrence::from_str(&db.recurrence).map_err(|e| corrupt(id, e))?,
            next_execution_date: parse_date(
                &db.next_execution_date,
                "scheduled_transactions.next_execution_date",
            )?,
            status: ScheduleStatus::from_str(&db.status).map_err(|e| corrupt(id, e))?,
            max_executions: db.max_executions,
            total_executions: db.total_executions,
            last_executed_date: db
                .last_executed_date
                .as_deref()
                .map(|d| parse_date(d, "scheduled_transactions.last_executed_date"))
                .transpose()?,
        })
    }
}

impl From<NewScheduledTransaction> for NewScheduledTransactionDB {
    fn from(domain: NewScheduledTransaction) -> Self {
        let now = Utc::now().naive_utc();
        NewScheduledTransactionDB {
            portfolio_fund_id: domain.portfolio_fund_id,
            activity_type: domain.activity_type.as_str().to_string(),
            amount: domain.amount.to_string(),
            recurrence: domain.recurrence.as_str().to_string(),
            next_execution_date: format_date(domain.next_execution_date),
            status: ScheduleStatus::Active.as_str().to_string(),
            max_executions: domain.max_executions,
            total_executions: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
