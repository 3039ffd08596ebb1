use std::sync::Mutex;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use wealthdesk_server::{api::app_router, build_state, config::Config};

// build_state exports DATABASE_URL, so concurrent tests must not interleave there.
static ENV_LOCK: Mutex<()> = Mutex::new(());

async fn build_test_router() -> (TempDir, Router) {
    let tmp = tempdir().unwrap();
    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: tmp.path().join("test.db").to_string_lossy().into_owned(),
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(30),
        cache_ttl_minutes: 30,
        cache_sweep_interval: Duration::from_secs(300),
        scheduler_interval: Duration::from_secs(3600),
    };
    let state = {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        build_state(&config).await.unwrap()
    };
    (tmp, app_router(state, &config))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn seed_fund(app: &Router) -> (i64, i64) {
    let (status, portfolio) = send(
        app,
        Method::POST,
        "/api/v1/portfolios",
        Some(json!({ "name": "Main" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let portfolio_id = portfolio["id"].as_i64().unwrap();

    let (status, fund) = send(
        app,
        Method::POST,
        &format!("/api/v1/portfolios/{}/funds", portfolio_id),
        Some(json!({ "fundName": "Global Equity" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (portfolio_id, fund["id"].as_i64().unwrap())
}

#[tokio::test]
async fn ordered_save_then_fund_irr_round_trip() {
    let (_tmp, app) = build_test_router().await;
    let (portfolio_id, fund_id) = seed_fund(&app).await;

    let (status, saved) = send(
        &app,
        Method::POST,
        "/api/v1/transactions/ordered",
        Some(json!({
            "activities": [{
                "portfolioFundId": fund_id,
                "activityType": "Investment",
                "activityTimestamp": "2023-01-01",
                "amount": 1000
            }],
            "valuations": [{
                "portfolioFundId": fund_id,
                "valuationDate": "2024-01-01",
                "valuation": 1100
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["success"], json!(true));
    assert_eq!(saved["activitiesSaved"], json!(1));
    assert_eq!(saved["valuationsSaved"], json!(1));

    let (status, irr) = send(
        &app,
        Method::POST,
        "/api/v1/irr/fund",
        Some(json!({ "portfolioFundId": fund_id, "valuationDate": "2024-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(irr["irrPercentage"].as_f64(), Some(10.0));
    assert_eq!(irr["daysInPeriod"], json!(365));

    let (status, stored) = send(
        &app,
        Method::GET,
        &format!(
            "/api/v1/irr/stored?subject=fund&id={}&date=2024-01-01",
            fund_id
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["irrResult"].as_f64(), Some(10.0));
    assert!(stored["valuationId"].is_i64());

    let (status, portfolio_irr) = send(
        &app,
        Method::POST,
        &format!("/api/v1/irr/portfolio/{}?date=2024-01-01", portfolio_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(portfolio_irr["totalValuation"].as_f64(), Some(1100.0));

    let (status, stats) = send(&app, Method::GET, "/api/v1/cache/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["totalEntries"].as_u64().unwrap() >= 1);

    let (status, removed) = send(
        &app,
        Method::POST,
        "/api/v1/cache/invalidate",
        Some(json!({ "portfolioFundIds": [fund_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(removed["removed"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn errors_carry_reason_and_entity() {
    let (_tmp, app) = build_test_router().await;
    let (_, fund_id) = seed_fund(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/irr/fund",
        Some(json!({ "portfolioFundId": 9999, "valuationDate": "2024-01-01", "valuationAmount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["reason"], json!("not_found"));
    assert_eq!(body["entityId"], json!(9999));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/transactions/ordered",
        Some(json!({
            "activities": [{
                "portfolioFundId": fund_id,
                "activityType": "Gift",
                "activityTimestamp": "2023-01-01",
                "amount": 10
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], json!("validation"));
    assert_eq!(body["violations"][0]["field"], json!("activityType"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/irr/fund",
        Some(json!({ "portfolioFundId": fund_id, "valuationDate": "2024-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["reason"], json!("degenerate_input"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/irr/funds",
        Some(json!({ "portfolioFundIds": [], "valuationDate": "2024-01-01", "fundValuations": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], json!("validation"));
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let (_tmp, app) = build_test_router().await;
    let (_portfolio_id, fund_id) = seed_fund(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/irr/fund",
        Some(json!({ "portfolioFundId": fund_id, "valuationDate": "not-a-date" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!(400));
    assert_eq!(body["reason"], json!("validation"));
    assert!(body["message"].as_str().unwrap().contains("valuationDate"));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/irr/stored?subject=fund&id={}", fund_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], json!("validation"));

    let (status, body) = send(&app, Method::POST, "/api/v1/irr/portfolio/abc?date=2024-01-01", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], json!("validation"));
}

#[tokio::test]
async fn openapi_document_lists_irr_routes() {
    let (_tmp, app) = build_test_router().await;

    let (status, doc) = send(&app, Method::GET, "/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/v1/irr/fund"].is_object());
    assert!(doc["paths"]["/api/v1/transactions/ordered"].is_object());
}
