use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::scheduled_model::*;
use super::scheduled_traits::{ScheduledTransactionRepositoryTrait, ScheduledTransactionServiceTrait};
use crate::errors::{DatabaseError, Error, Result, ValidationError};
use crate::irr::IrrError;
use crate::portfolios::PortfolioRepositoryTrait;
use crate::transactions::{ActivityInput, OrderedTransactionRequest, OrderedTransactionServiceTrait};

pub struct ScheduledTransactionService {
    repository: Arc<dyn ScheduledTransactionRepositoryTrait>,
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    transaction_service: Arc<dyn OrderedTransactionServiceTrait>,
}

impl ScheduledTransactionService {
    pub fn new(
        repository: Arc<dyn ScheduledTransactionRepositoryTrait>,
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        transaction_service: Arc<dyn OrderedTransactionServiceTrait>,
    ) -> Self {
        Self {
            repository,
            portfolio_repository,
            transaction_service,
        }
    }

    /// Runs the due occurrences of one schedule, oldest first.
    ///
    /// Each occurrence is claimed before its activity is written, so a concurrent
    /// run never saves it twice. The run stops at the first occurrence that fails.
    async fn execute_one(&self, schedule: &ScheduledTransaction, today: NaiveDate) -> Result<ScheduleRun> {
        let occurrences = schedule.due_occurrences(today);
        if occurrences.is_empty() {
            // Allowance used up while still active.
            self.repository
                .update_status(schedule.id, ScheduleStatus::Cancelled)
                .await?;
            return Ok(ScheduleRun {
                finished: true,
                ..Default::default()
            });
        }

        let mut run = ScheduleRun::default();
        let mut current = schedule.clone();
        for date in occurrences {
            let Some(claimed) = self
                .repository
                .advance_execution(
                    current.id,
                    current.next_execution_date,
                    current.total_executions,
                    current.execution_after(date),
                )
                .await?
            else {
                debug!("Schedule {} was advanced by another run", current.id);
                break;
            };

            if let Err(e) = self.save_occurrence(&current, date).await {
                self.release(&current, &claimed).await;
                run.failure = Some(e);
                break;
            }
            run.created += 1;
            run.finished = claimed.status == ScheduleStatus::Cancelled;
            current = claimed;
        }
        Ok(run)
    }

    async fn save_occurrence(&self, schedule: &ScheduledTransaction, date: NaiveDate) -> Result<()> {
        let request = OrderedTransactionRequest {
            activities: vec![ActivityInput {
                portfolio_fund_id: Some(schedule.portfolio_fund_id),
                activity_type: Some(schedule.activity_type.as_str().to_string()),
                activity_timestamp: Some(date.format("%Y-%m-%d").to_string()),
                amount: Some(schedule.amount),
            }],
            valuations: Vec::new(),
        };

        let result = self.transaction_service.save(request).await?;
        // IRR recalculation failures do not undo a saved activity.
        match result.errors.iter().find(|e| e.entity == "activity") {
            Some(failed) => Err(Error::Repository(format!(
                "occurrence on {} was not saved: {}",
                date, failed.message
            ))),
            None => Ok(()),
        }
    }

    /// Gives a claimed occurrence back after its write failed.
    async fn release(&self, previous: &ScheduledTransaction, claimed: &ScheduledTransaction) {
        match self
            .repository
            .advance_execution(
                claimed.id,
                claimed.next_execution_date,
                claimed.total_executions,
                previous.execution_state(),
            )
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => warn!("Schedule {} moved before its failed occurrence was released", claimed.id),
            Err(e) => error!(
                "Could not release occurrence {} of schedule {}, it will be skipped: {}",
                previous.next_execution_date, claimed.id, e
            ),
        }
    }
}

#[derive(Debug, Default)]
struct ScheduleRun {
    created: usize,
    finished: bool,
    failure: Option<Error>,
}

fn record_failure(summary: &mut ExecutionSummary, schedule_id: i64, error: &Error) {
    warn!("Scheduled transaction {} failed: {}", schedule_id, error);
    summary.failures.push(ScheduleFailure {
        scheduled_transaction_id: schedule_id,
        message: error.to_string(),
    });
}

#[async_trait]
impl ScheduledTransactionServiceTrait for ScheduledTransactionService {
    async fn create_schedule(&self, new_schedule: NewScheduledTransaction) -> Result<ScheduledTransaction> {
        if new_schedule.amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidField {
                field: "amount".to_string(),
                message: "must be greater than zero".to_string(),
            }
            .into());
        }
        if matches!(new_schedule.max_executions, Some(max) if max < 1) {
            return Err(ValidationError::InvalidField {
                field: "maxExecutions".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        if self
            .portfolio_repository
            .get_fund(new_schedule.portfolio_fund_id)?
            .is_none()
        {
            return Err(IrrError::FundNotFound(new_schedule.portfolio_fund_id).into());
        }

        let created = self.repository.create(new_schedule).await?;
        debug!(
            "Created {} schedule {} for fund {}",
            created.recurrence, created.id, created.portfolio_fund_id
        );
        Ok(created)
    }

    fn list_schedules(&self) -> Result<Vec<ScheduledTransaction>> {
        self.repository.list()
    }

    async fn set_status(&self, id: i64, status: ScheduleStatus) -> Result<ScheduledTransaction> {
        let existing = self
            .repository
            .get_by_id(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Scheduled transaction {}", id)))?;
        if existing.status == ScheduleStatus::Cancelled && status != ScheduleStatus::Cancelled {
            return Err(ValidationError::InvalidInput(format!(
                "Scheduled transaction {} is cancelled and cannot be {}",
                id,
                status.as_str()
            ))
            .into());
        }
        self.repository.update_status(id, status).await
    }

    async fn execute_due(&self, today: NaiveDate) -> Result<ExecutionSummary> {
        let due = self.repository.get_due(today)?;
        let mut summary = ExecutionSummary {
            schedules_due: due.len(),
            ..Default::default()
        };

        for schedule in &due {
            match self.execute_one(schedule, today).await {
                Ok(run) => {
                    summary.activities_created += run.created;
                    if run.finished {
                        summary.schedules_completed += 1;
                    }
                    if let Some(e) = run.failure {
                        record_failure(&mut summary, schedule.id, &e);
                    }
                }
                Err(e) => record_failure(&mut summary, schedule.id, &e),
            }
        }

        if summary.schedules_due > 0 {
            info!(
                "Executed {} due schedules: {} activities created, {} completed, {} failed",
                summary.schedules_due,
                summary.activities_created,
                summary.schedules_completed,
                summary.failures.len()
            );
        }
        Ok(summary)
    }
}
