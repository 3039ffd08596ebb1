use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::model::{IrrValueDB, NewIrrValueDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{is_unique_violation, StorageError};
use crate::schema::irr_values;
use crate::utils::format_date;
use wealthdesk_core::irr::{IrrError, IrrSubject, StoredIrr, StoredIrrRepositoryTrait};
use wealthdesk_core::Result;

pub struct StoredIrrRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl StoredIrrRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        StoredIrrRepository { pool, writer }
    }
}

fn find_row(
    conn: &mut SqliteConnection,
    subject: IrrSubject,
    irr_date: &str,
) -> QueryResult<Option<IrrValueDB>> {
    irr_values::table
        .filter(irr_values::subject_kind.eq(subject.kind_str()))
        .filter(irr_values::subject_id.eq(subject.id()))
        .filter(irr_values::irr_date.eq(irr_date))
        .select(IrrValueDB::as_select())
        .first::<IrrValueDB>(conn)
        .optional()
}

/// Insert first and fall back to an in-place update when the unique key on
/// (subject, date) already holds a row. Runs inside the writer's transaction.
fn upsert_row(
    conn: &mut SqliteConnection,
    subject: IrrSubject,
    irr_date: NaiveDate,
    irr_result: Decimal,
    valuation_id: Option<i64>,
) -> Result<IrrValueDB> {
    let now = Utc::now().naive_utc();
    let date = format_date(irr_date);
    let row = NewIrrValueDB {
        subject_kind: subject.kind_str().to_string(),
        subject_id: subject.id(),
        irr_date: date.clone(),
        irr_result: irr_result.to_string(),
        valuation_id,
        created_at: now,
        updated_at: now,
    };

    match diesel::insert_into(irr_values::table)
        .values(&row)
        .returning(IrrValueDB::as_returning())
        .get_result(conn)
    {
        Ok(inserted) => return Ok(inserted),
        Err(e) if is_unique_violation(&e) => {
            debug!("IRR for {} on {} exists, updating in place", subject, date);
        }
        Err(e) => return Err(StorageError::from(e).into()),
    }

    let target = irr_values::table
        .filter(irr_values::subject_kind.eq(subject.kind_str()))
        .filter(irr_values::subject_id.eq(subject.id()))
        .filter(irr_values::irr_date.eq(&date));
    let updated = match valuation_id {
        Some(link) => diesel::update(target)
            .set((
                irr_values::irr_result.eq(&row.irr_result),
                irr_values::valuation_id.eq(Some(link)),
                irr_values::updated_at.eq(now),
            ))
            .execute(conn),
        None => diesel::update(target)
            .set((
                irr_values::irr_result.eq(&row.irr_result),
                irr_values::updated_at.eq(now),
            ))
            .execute(conn),
    }
    .map_err(StorageError::from)?;

    if updated == 0 {
        return Err(IrrError::PersistenceConflict {
            subject,
            date: irr_date,
        }
        .into());
    }

    find_row(conn, subject, &date)
        .map_err(StorageError::from)?
        .ok_or_else(|| {
            IrrError::PersistenceConflict {
                subject,
                date: irr_date,
            }
            .into()
        })
}

#[async_trait]
impl StoredIrrRepositoryTrait for StoredIrrRepository {
    async fn upsert_stored_irr(
        &self,
        subject: IrrSubject,
        irr_date: NaiveDate,
        irr_result: Decimal,
        valuation_id: Option<i64>,
    ) -> Result<StoredIrr> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<StoredIrr> {
                let row = upsert_row(conn, subject, irr_date, irr_result, valuation_id)?;
                StoredIrr::try_from(row)
            })
            .await
    }

    fn get_stored_irr(&self, subject: IrrSubject, irr_date: NaiveDate) -> Result<Option<StoredIrr>> {
        let mut conn = get_connection(&self.pool)?;
        find_row(&mut conn, subject, &format_date(irr_date))
            .map_err(StorageError::from)?
            .map(StoredIrr::try_from)
            .transpose()
    }

    fn count_stored_irr(&self, subject: IrrSubject, irr_date: NaiveDate) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = irr_values::table
            .filter(irr_values::subject_kind.eq(subject.kind_str()))
            .filter(irr_values::subject_id.eq(subject.id()))
            .filter(irr_values::irr_date.eq(format_date(irr_date)))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    fn get_unlinked_stored_irrs(&self) -> Result<Vec<StoredIrr>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = irr_values::table
            .filter(irr_values::valuation_id.is_null())
            .order((irr_values::irr_date.asc(), irr_values::id.asc()))
            .select(IrrValueDB::as_select())
            .load::<IrrValueDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(StoredIrr::try_from).collect()
    }
}
