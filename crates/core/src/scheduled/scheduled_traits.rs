use async_trait::async_trait;
use chrono::NaiveDate;

use super::scheduled_model::*;
use crate::errors::Result;

#[async_trait]
pub trait ScheduledTransactionRepositoryTrait: Send + Sync {
    async fn create(&self, new_schedule: NewScheduledTransaction) -> Result<ScheduledTransaction>;

    fn list(&self) -> Result<Vec<ScheduledTransaction>>;

    fn get_by_id(&self, id: i64) -> Result<Option<ScheduledTransaction>>;

    /// Active schedules whose next execution date is on or before `today`.
    fn get_due(&self, today: NaiveDate) -> Result<Vec<ScheduledTransaction>>;

    /// Writes `update` only while the schedule still sits at `expected_next` after
    /// `expected_total` executions. `None` when another run moved it first.
    async fn advance_execution(
        &self,
        id: i64,
        expected_next: NaiveDate,
        expected_total: i32,
        update: ScheduleExecutionUpdate,
    ) -> Result<Option<ScheduledTransaction>>;

    async fn update_status(&self, id: i64, status: ScheduleStatus) -> Result<ScheduledTransaction>;
}

#[async_trait]
pub trait ScheduledTransactionServiceTrait: Send + Sync {
    async fn create_schedule(&self, new_schedule: NewScheduledTransaction) -> Result<ScheduledTransaction>;

    fn list_schedules(&self) -> Result<Vec<ScheduledTransaction>>;

    async fn set_status(&self, id: i64, status: ScheduleStatus) -> Result<ScheduledTransaction>;

    /// Materializes every due occurrence as an activity through the ordered save.
    async fn execute_due(&self, today: NaiveDate) -> Result<ExecutionSummary>;
}
