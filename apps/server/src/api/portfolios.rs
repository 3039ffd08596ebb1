use std::sync::Arc;

use axum::{extract::State, routing::post, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    extract::{Json, Path},
    main_lib::AppState,
};
use wealthdesk_core::portfolios::{
    FundStatus, NewPortfolio, NewPortfolioFund, Portfolio, PortfolioFund,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFundBody {
    pub fund_name: String,
    #[serde(default)]
    pub status: FundStatus,
    pub start_date: Option<NaiveDate>,
}

#[utoipa::path(post, path = "/api/v1/portfolios", responses((status = 200, description = "Created portfolio")))]
pub async fn create_portfolio(
    State(state): State<Arc<AppState>>,
    Json(new_portfolio): Json<NewPortfolio>,
) -> ApiResult<Json<Portfolio>> {
    if new_portfolio.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let portfolio = state
        .portfolio_repository
        .create_portfolio(new_portfolio)
        .await?;
    Ok(Json(portfolio))
}

#[utoipa::path(get, path = "/api/v1/portfolios/{id}/funds", params(
    ("id" = i64, Path, description = "Portfolio id"),
), responses((status = 200, description = "Funds of the portfolio")))]
pub async fn list_funds(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<PortfolioFund>>> {
    if state.portfolio_repository.get_portfolio(id)?.is_none() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(state.portfolio_repository.get_funds_for_portfolio(id)?))
}

#[utoipa::path(post, path = "/api/v1/portfolios/{id}/funds", params(
    ("id" = i64, Path, description = "Portfolio id"),
), responses((status = 200, description = "Created fund")))]
pub async fn create_fund(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewFundBody>,
) -> ApiResult<Json<PortfolioFund>> {
    if state.portfolio_repository.get_portfolio(id)?.is_none() {
        return Err(ApiError::NotFound);
    }
    let fund = state
        .portfolio_repository
        .create_fund(NewPortfolioFund {
            portfolio_id: id,
            fund_name: body.fund_name,
            status: body.status,
            start_date: body.start_date,
        })
        .await?;
    Ok(Json(fund))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolios", post(create_portfolio))
        .route("/portfolios/{id}/funds", post(create_fund).get(list_funds))
}
