use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use super::model::{NewScheduledTransactionDB, ScheduledTransactionDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::scheduled_transactions;
use crate::utils::format_date;
use wealthdesk_core::scheduled::{
    NewScheduledTransaction, ScheduleExecutionUpdate, ScheduleStatus, ScheduledTransaction,
    ScheduledTransactionRepositoryTrait,
};
use wealthdesk_core::Result;

pub struct ScheduledTransactionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ScheduledTransactionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ScheduledTransactionRepository { pool, writer }
    }
}

#[async_trait]
impl ScheduledTransactionRepositoryTrait for ScheduledTransactionRepository {
    async fn create(&self, new_schedule: NewScheduledTransaction) -> Result<ScheduledTransaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ScheduledTransaction> {
                let row = diesel::insert_into(scheduled_transactions::table)
                    .values(NewScheduledTransactionDB::from(new_schedule))
                    .returning(ScheduledTransactionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                ScheduledTransaction::try_from(row)
            })
            .await
    }

    fn list(&self) -> Result<Vec<ScheduledTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = scheduled_transactions::table
            .order(scheduled_transactions::id.asc())
            .select(ScheduledTransactionDB::as_select())
            .load::<ScheduledTransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(ScheduledTransaction::try_from).collect()
    }

    fn get_by_id(&self, id: i64) -> Result<Option<ScheduledTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        scheduled_transactions::table
            .find(id)
            .select(ScheduledTransactionDB::as_select())
            .first::<ScheduledTransactionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(ScheduledTransaction::try_from)
            .transpose()
    }

    fn get_due(&self, today: NaiveDate) -> Result<Vec<ScheduledTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = scheduled_transactions::table
            .filter(scheduled_transactions::status.eq(ScheduleStatus::Active.as_str()))
            .filter(scheduled_transactions::next_execution_date.le(format_date(today)))
            .order((
                scheduled_transactions::next_execution_date.asc(),
                scheduled_transactions::id.asc(),
            ))
            .select(ScheduledTransactionDB::as_select())
            .load::<ScheduledTransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(ScheduledTransaction::try_from).collect()
    }

    async fn advance_execution(
        &self,
        id: i64,
        expected_next: NaiveDate,
        expected_total: i32,
        update: ScheduleExecutionUpdate,
    ) -> Result<Option<ScheduledTransaction>> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Option<ScheduledTransaction>> {
                let target = scheduled_transactions::table
                    .filter(scheduled_transactions::id.eq(id))
                    .filter(scheduled_transactions::next_execution_date.eq(format_date(expected_next)))
                    .filter(scheduled_transactions::total_executions.eq(expected_total));
                diesel::update(target)
                    .set((
                        scheduled_transactions::next_execution_date
                            .eq(format_date(update.next_execution_date)),
                        scheduled_transactions::total_executions.eq(update.total_executions),
                        scheduled_transactions::last_executed_date
                            .eq(update.last_executed_date.map(format_date)),
                        scheduled_transactions::status.eq(update.status.as_str()),
                        scheduled_transactions::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .returning(ScheduledTransactionDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .map(ScheduledTransaction::try_from)
                    .transpose()
            })
            .await
    }

    async fn update_status(&self, id: i64, status: ScheduleStatus) -> Result<ScheduledTransaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ScheduledTransaction> {
                let row = diesel::update(scheduled_transactions::table.find(id))
                    .set((
                        scheduled_transactions::status.eq(status.as_str()),
                        scheduled_transactions::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .returning(ScheduledTransactionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                ScheduledTransaction::try_from(row)
            })
            .await
    }
}
