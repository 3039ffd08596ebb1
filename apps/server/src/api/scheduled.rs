use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    error::ApiResult,
    extract::{Json, Path, Query},
    main_lib::AppState,
};
use wealthdesk_core::scheduled::{
    ExecutionSummary, NewScheduledTransaction, ScheduleStatus, ScheduledTransaction,
};

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ScheduleStatus,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteQuery {
    /// Defaults to the current UTC date.
    pub date: Option<NaiveDate>,
}

#[utoipa::path(get, path = "/api/v1/scheduled-transactions", responses((status = 200, description = "All schedules")))]
pub async fn list_schedules(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ScheduledTransaction>>> {
    Ok(Json(state.scheduled_service.list_schedules()?))
}

#[utoipa::path(post, path = "/api/v1/scheduled-transactions", responses((status = 200, description = "Created schedule")))]
pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Json(new_schedule): Json<NewScheduledTransaction>,
) -> ApiResult<Json<ScheduledTransaction>> {
    let created = state.scheduled_service.create_schedule(new_schedule).await?;
    Ok(Json(created))
}

#[utoipa::path(put, path = "/api/v1/scheduled-transactions/{id}/status", params(
    ("id" = i64, Path, description = "Schedule id"),
), responses((status = 200, description = "Updated schedule")))]
pub async fn set_status(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<ScheduledTransaction>> {
    let updated = state.scheduled_service.set_status(id, update.status).await?;
    Ok(Json(updated))
}

#[utoipa::path(post, path = "/api/v1/scheduled-transactions/execute", responses((status = 200, description = "Run summary")))]
pub async fn execute_due(
    Query(query): Query<ExecuteQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ExecutionSummary>> {
    let today = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let summary = state.scheduled_service.execute_due(today).await?;
    Ok(Json(summary))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/scheduled-transactions",
            get(list_schedules).post(create_schedule),
        )
        .route("/scheduled-transactions/{id}/status", put(set_status))
        .route("/scheduled-transactions/execute", post(execute_due))
}
