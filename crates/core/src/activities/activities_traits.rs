use super::activities_model::*;
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait defining the contract for activity log repository operations.
#[async_trait]
pub trait ActivityRepositoryTrait: Send + Sync {
    async fn create_activity(&self, new_activity: NewActivity) -> Result<Activity>;

    /// Loads every activity of the given funds dated on or before `as_of`,
    /// ordered by date and then insertion order.
    fn get_activities_for_funds(
        &self,
        portfolio_fund_ids: &[i64],
        as_of: NaiveDate,
    ) -> Result<Vec<Activity>>;

    fn get_first_activity_date(&self, portfolio_fund_id: i64) -> Result<Option<NaiveDate>>;
}
