use std::sync::Arc;

use axum::{extract::State, routing::post, Router};

use crate::{error::ApiResult, extract::Json, main_lib::AppState};
use wealthdesk_core::transactions::{OrderedTransactionRequest, OrderedTransactionResult};

/// Partial failures come back as 200 with `success: false`; only a malformed
/// payload is rejected outright.
#[utoipa::path(post, path = "/api/v1/transactions/ordered", responses(
    (status = 200, description = "Per-item outcome of the ordered save"),
    (status = 400, description = "Payload rejected before any write"),
))]
pub async fn save_ordered(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OrderedTransactionRequest>,
) -> ApiResult<Json<OrderedTransactionResult>> {
    let result = state.transaction_service.save(request).await?;
    Ok(Json(result))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/transactions/ordered", post(save_ordered))
}
