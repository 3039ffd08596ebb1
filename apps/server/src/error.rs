use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use wealthdesk_core::errors::{Error as CoreError, FieldViolation, ValidationError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: u16,
    message: String,
    reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<FieldViolation>,
}

fn core_status(err: &CoreError) -> StatusCode {
    match err.reason_class() {
        "validation" => StatusCode::BAD_REQUEST,
        "not_found" => StatusCode::NOT_FOUND,
        "data_incomplete" | "degenerate_input" => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason, entity_id, violations) = match &self {
            ApiError::Core(e) => {
                let violations = match e {
                    CoreError::Validation(ValidationError::Fields(v)) => v.clone(),
                    _ => Vec::new(),
                };
                (core_status(e), e.reason_class(), e.entity_id(), violations)
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", None, Vec::new()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation", None, Vec::new()),
            ApiError::Anyhow(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected",
                None,
                Vec::new(),
            ),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
            reason,
            entity_id,
            violations,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
