//! HTTP handlers for the console endpoints.
//!
//! Adapter faults never escape as server crashes: everything the
//! dispatcher returns as an error becomes a `{success:false, error}`
//! reply. Only request-level problems (unknown type, empty query,
//! malformed body) use an error status.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::models::{DbType, QueryRequest, TestRequest};
use common::response::ApiReply;

use crate::dispatcher::Dispatcher;
use crate::state::AppState;

/// Test connectivity to a database.
#[utoipa::path(
    post,
    path = "/api/test-connection",
    tag = "console",
    request_body = TestRequest,
    responses(
        (status = 200, description = "Test outcome (success or failure)", body = ApiReply),
        (status = 400, description = "Unsupported database type or invalid request")
    )
)]
pub async fn test_connection(
    State(state): State<AppState>,
    Json(req): Json<TestRequest>,
) -> Result<Json<ApiReply>, AppError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let db_type: DbType = req.db_type.parse()?;

    let dispatcher = Dispatcher::new(state.http_client.clone(), state.config.connect_timeout());
    match dispatcher.test_connection(db_type, &req.config).await {
        Ok(outcome) => {
            tracing::info!(db_type = %db_type, "connection test succeeded");
            Ok(Json(ApiReply::message(outcome.message)))
        }
        Err(e) => {
            tracing::warn!(db_type = %db_type, error = %e, "connection test failed");
            Ok(Json(ApiReply::failure(e.to_string())))
        }
    }
}

/// Execute one ad-hoc SQL statement.
#[utoipa::path(
    post,
    path = "/api/execute-query",
    tag = "console",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query outcome (success or failure)", body = ApiReply),
        (status = 400, description = "Unsupported database type or invalid request")
    )
)]
pub async fn execute_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<ApiReply>, AppError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let db_type: DbType = req.db_type.parse()?;

    let dispatcher = Dispatcher::new(state.http_client.clone(), state.config.connect_timeout());
    match dispatcher.execute_query(db_type, &req.config, &req.query).await {
        Ok(outcome) => {
            tracing::info!(
                db_type = %db_type,
                rows = outcome.rows.len(),
                elapsed_ms = outcome.execution_time_ms,
                "query executed"
            );
            Ok(Json(ApiReply::rows(outcome.rows, outcome.execution_time_ms)))
        }
        Err(e) => {
            tracing::warn!(db_type = %db_type, error = %e, "query failed");
            Ok(Json(ApiReply::failure(e.to_string())))
        }
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "db-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Health check response.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
