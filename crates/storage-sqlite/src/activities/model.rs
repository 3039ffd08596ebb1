//! Database models for activity log rows.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::StorageError;
use crate::utils::{format_date, parse_date, parse_decimal};
use wealthdesk_core::activities::{Activity, ActivityType, NewActivity};
use wealthdesk_core::{Error, Result};

#[derive(
    Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::activity_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogDB {
    pub id: i64,
    pub portfolio_fund_id: i64,
    pub activity_type: String,
    pub activity_timestamp: String,
    pub amount: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::activity_logs)]
pub struct NewActivityLogDB {
    pub portfolio_fund_id: i64,
    pub activity_type: String,
    pub activity_timestamp: String,
    pub amount: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<ActivityLogDB> for Activity {
    type Error = Error;

    fn try_from(db: ActivityLogDB) -> Result<Self> {
        // Legacy type names are accepted on read and normalized by the parser.
        let activity_type = ActivityType::from_str(&db.activity_type)
            .map_err(|e| Error::from(StorageError::CorruptRow(format!("activity {}: {}", db.id, e))))?;
        Ok(Activity {
            id: db.id,
            portfolio_fund_id: db.portfolio_fund_id,
            activity_type,
            activity_timestamp: parse_date(&db.activity_timestamp, "activity_logs.activity_timestamp")?,
            amount: parse_decimal(&db.amount, "activity_logs.amount")?,
            created_at: db.created_at,
        })
    }
}

impl From<NewActivity> for NewActivityLogDB {
    fn from(domain: NewActivity) -> Self {
        NewActivityLogDB {
            portfolio_fund_id: domain.portfolio_fund_id,
            activity_type: domain.activity_type.as_str().to_string(),
            activity_timestamp: format_date(domain.activity_timestamp),
            amount: domain.amount.to_string(),
            created_at: Utc::now().naive_utc(),
        }
    }
}
