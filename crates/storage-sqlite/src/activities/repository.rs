use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::min;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use super::model::{ActivityLogDB, NewActivityLogDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::activity_logs;
use crate::utils::{chunk_for_sqlite, format_date, parse_date};
use wealthdesk_core::activities::{Activity, ActivityRepositoryTrait, NewActivity};
use wealthdesk_core::Result;

pub struct ActivityRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ActivityRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ActivityRepository { pool, writer }
    }
}

#[async_trait]
impl ActivityRepositoryTrait for ActivityRepository {
    async fn create_activity(&self, new_activity: NewActivity) -> Result<Activity> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Activity> {
                let row = diesel::insert_into(activity_logs::table)
                    .values(NewActivityLogDB::from(new_activity))
                    .returning(ActivityLogDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Activity::try_from(row)
            })
            .await
    }

    fn get_activities_for_funds(
        &self,
        portfolio_fund_ids: &[i64],
        as_of: NaiveDate,
    ) -> Result<Vec<Activity>> {
        let mut conn = get_connection(&self.pool)?;
        let as_of = format_date(as_of);
        let mut rows = Vec::new();
        for chunk in chunk_for_sqlite(portfolio_fund_ids) {
            let found = activity_logs::table
                .filter(activity_logs::portfolio_fund_id.eq_any(chunk))
                .filter(activity_logs::activity_timestamp.le(&as_of))
                .select(ActivityLogDB::as_select())
                .load::<ActivityLogDB>(&mut conn)
                .map_err(StorageError::from)?;
            rows.extend(found);
        }
        // Chunks are loaded separately, so order once at the end.
        rows.sort_by(|a, b| {
            a.activity_timestamp
                .cmp(&b.activity_timestamp)
                .then(a.id.cmp(&b.id))
        });
        rows.into_iter().map(Activity::try_from).collect()
    }

    fn get_first_activity_date(&self, portfolio_fund_id: i64) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let first = activity_logs::table
            .filter(activity_logs::portfolio_fund_id.eq(portfolio_fund_id))
            .select(min(activity_logs::activity_timestamp))
            .first::<Option<String>>(&mut conn)
            .map_err(StorageError::from)?;
        first
            .as_deref()
            .map(|d| parse_date(d, "activity_logs.activity_timestamp"))
            .transpose()
    }
}
