use std::sync::Arc;

use crate::{config::Config, main_lib::AppState};
use axum::{http::HeaderValue, routing::get, Json, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

pub mod cache;
pub mod irr;
pub mod portfolios;
pub mod scheduled;
pub mod transactions;

#[utoipa::path(get, path = "/api/v1/healthz", responses((status = 200, description = "Health")))]
pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz,
        irr::calculate_fund_irr,
        irr::calculate_multi_fund_irr,
        irr::recalculate_fund_irr,
        irr::calculate_portfolio_irr,
        irr::get_stored_irr,
        irr::backfill_valuation_links,
        transactions::save_ordered,
        cache::get_cache_stats,
        cache::invalidate_funds,
        cache::sweep_cache,
        scheduled::list_schedules,
        scheduled::create_schedule,
        scheduled::set_status,
        scheduled::execute_due,
        portfolios::create_portfolio,
        portfolios::list_funds,
        portfolios::create_fund,
    ),
    tags((name = "wealthdesk"))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let api = Router::new()
        .route("/healthz", get(healthz))
        .merge(irr::router())
        .merge(transactions::router())
        .merge(cache::router())
        .merge(scheduled::router())
        .merge(portfolios::router());

    Router::new()
        .nest("/api/v1", api)
        .route("/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}
