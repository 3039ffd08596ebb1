use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::utils::{parse_date, parse_decimal};
use wealthdesk_core::irr::{IrrSubject, StoredIrr};
use wealthdesk_core::{Error, Result};

#[derive(
    Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::irr_values)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct IrrValueDB {
    pub id: i64,
    pub subject_kind: String,
    pub subject_id: i64,
    pub irr_date: String,
    pub irr_result: String,
    pub valuation_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::irr_values)]
pub struct NewIrrValueDB {
    pub subject_kind: String,
    pub subject_id: i64,
    pub irr_date: String,
    pub irr_result: String,
    pub valuation_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<IrrValueDB> for StoredIrr {
    type Error = Error;

    fn try_from(db: IrrValueDB) -> Result<Self> {
        let subject = IrrSubject::from_parts(&db.subject_kind, db.subject_id).ok_or_else(|| {
            Error::from(StorageError::CorruptRow(format!(
                "irr_values {} has unknown subject kind '{}'",
                db.id, db.subject_kind
            )))
        })?;
        Ok(StoredIrr {
            id: db.id,
            subject,
            irr_date: parse_date(&db.irr_date, "irr_values.irr_date")?,
            irr_result: parse_decimal(&db.irr_result, "irr_values.irr_result")?,
            valuation_id: db.valuation_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
