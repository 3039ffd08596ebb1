use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    main_lib::AppState,
};
use wealthdesk_core::irr::{
    BackfillSummary, FundIrrResponse, IrrSubject, MultiFundIrrRequest, MultiFundIrrResponse,
    PortfolioIrrResponse, SingleFundIrrRequest, StoredIrr,
};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct StoredIrrQuery {
    pub subject: String,
    pub id: i64,
    pub date: NaiveDate,
}

#[utoipa::path(post, path = "/api/v1/irr/fund", responses(
    (status = 200, description = "IRR of one fund"),
    (status = 404, description = "Unknown fund"),
    (status = 422, description = "No anchoring valuation or degenerate cash flows"),
))]
pub async fn calculate_fund_irr(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SingleFundIrrRequest>,
) -> ApiResult<Json<FundIrrResponse>> {
    let response = state.irr_service.calculate_fund_irr(request)?;
    Ok(Json(response))
}

#[utoipa::path(post, path = "/api/v1/irr/funds", responses(
    (status = 200, description = "Pooled IRR of several funds"),
    (status = 400, description = "Empty or mismatched fund list"),
))]
pub async fn calculate_multi_fund_irr(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MultiFundIrrRequest>,
) -> ApiResult<Json<MultiFundIrrResponse>> {
    let response = state.irr_service.calculate_multi_fund_irr(request)?;
    Ok(Json(response))
}

#[utoipa::path(post, path = "/api/v1/irr/fund/{id}/recalculate", params(
    ("id" = i64, Path, description = "Portfolio fund id"),
    ("date" = String, Query, description = "Valuation date, YYYY-MM-DD"),
), responses(
    (status = 200, description = "Stored fund IRR for the date"),
))]
pub async fn recalculate_fund_irr(
    Path(id): Path<i64>,
    Query(query): Query<DateQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StoredIrr>> {
    let stored = state.irr_service.recalculate_fund_irr(id, query.date).await?;
    Ok(Json(stored))
}

#[utoipa::path(post, path = "/api/v1/irr/portfolio/{id}", params(
    ("id" = i64, Path, description = "Portfolio id"),
    ("date" = String, Query, description = "Valuation date, YYYY-MM-DD"),
), responses(
    (status = 200, description = "Stored portfolio IRR for the date"),
))]
pub async fn calculate_portfolio_irr(
    Path(id): Path<i64>,
    Query(query): Query<DateQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PortfolioIrrResponse>> {
    let response = state
        .irr_service
        .calculate_portfolio_irr(id, query.date)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(get, path = "/api/v1/irr/stored", responses(
    (status = 200, description = "Stored IRR row"),
    (status = 404, description = "Nothing stored for the key"),
))]
pub async fn get_stored_irr(
    Query(query): Query<StoredIrrQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StoredIrr>> {
    let subject = IrrSubject::from_parts(&query.subject, query.id).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "subject must be 'fund' or 'portfolio', got '{}'",
            query.subject
        ))
    })?;
    state
        .irr_service
        .get_stored_irr(subject, query.date)?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[utoipa::path(post, path = "/api/v1/irr/backfill", responses(
    (status = 200, description = "Counts of examined, linked and unresolved rows"),
))]
pub async fn backfill_valuation_links(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BackfillSummary>> {
    let summary = state.irr_service.backfill_valuation_links().await?;
    Ok(Json(summary))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/irr/fund", post(calculate_fund_irr))
        .route("/irr/funds", post(calculate_multi_fund_irr))
        .route("/irr/fund/{id}/recalculate", post(recalculate_fund_irr))
        .route("/irr/portfolio/{id}", post(calculate_portfolio_irr))
        .route("/irr/stored", get(get_stored_irr))
        .route("/irr/backfill", post(backfill_valuation_links))
}
