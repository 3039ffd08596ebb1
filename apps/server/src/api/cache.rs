use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, extract::Json, main_lib::AppState};
use wealthdesk_core::irr::CacheStats;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateRequest {
    pub portfolio_fund_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedEntries {
    pub removed: usize,
}

#[utoipa::path(get, path = "/api/v1/cache/stats", responses((status = 200, description = "Cache occupancy")))]
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<CacheStats>> {
    Ok(Json(state.irr_service.cache_stats()))
}

#[utoipa::path(post, path = "/api/v1/cache/invalidate", responses((status = 200, description = "Entries removed")))]
pub async fn invalidate_funds(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InvalidateRequest>,
) -> ApiResult<Json<RemovedEntries>> {
    let removed = state.irr_service.invalidate_funds(&request.portfolio_fund_ids);
    Ok(Json(RemovedEntries { removed }))
}

#[utoipa::path(post, path = "/api/v1/cache/sweep", responses((status = 200, description = "Expired entries removed")))]
pub async fn sweep_cache(State(state): State<Arc<AppState>>) -> ApiResult<Json<RemovedEntries>> {
    Ok(Json(RemovedEntries {
        removed: state.irr_service.sweep_cache(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cache/stats", get(get_cache_stats))
        .route("/cache/invalidate", post(invalidate_funds))
        .route("/cache/sweep", post(sweep_cache))
}
