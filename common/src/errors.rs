//! Application error types.
//!
//! Every adapter fault is converted into an [`AppError`] carrying a
//! human-readable message. Driver messages are passed through after a
//! redaction pass so credentials embedded in connection strings never
//! reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::ApiReply;
use crate::utils::redact_secrets;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request named a database type the console does not know.
    #[error("unsupported database type")]
    UnsupportedDatabaseType(String),

    /// A required request or connection field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The driver failed while opening a connection.
    #[error("{0}")]
    DatabaseConnection(String),

    /// The driver failed while executing the query.
    #[error("{0}")]
    DatabaseQuery(String),

    /// The Supabase REST API returned an error.
    #[error("{0}")]
    SupabaseApi(String),

    /// No Supabase query rule matched the statement.
    #[error("unsupported query type; only simple SELECT statements are recognized")]
    UnsupportedQueryPattern,
}

impl AppError {
    /// Wraps a connect-phase driver error, redacting embedded secrets.
    pub fn connection(err: impl std::fmt::Display) -> Self {
        Self::DatabaseConnection(redact_secrets(&err.to_string()))
    }

    /// Wraps a query-phase driver error, redacting embedded secrets.
    pub fn query(err: impl std::fmt::Display) -> Self {
        Self::DatabaseQuery(redact_secrets(&err.to_string()))
    }

    /// Wraps a Supabase REST error, redacting embedded secrets.
    pub fn supabase(err: impl std::fmt::Display) -> Self {
        Self::SupabaseApi(redact_secrets(&err.to_string()))
    }

    /// HTTP status this error maps to when it escapes a handler.
    ///
    /// The console handlers convert every backend fault into a 200
    /// `{success:false}` reply themselves, so in practice only the
    /// request-level variants escape. The 500 arm is the backstop for
    /// a backend error returned through `?` by a future handler.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedDatabaseType(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedQueryPattern => StatusCode::BAD_REQUEST,
            Self::DatabaseConnection(_) | Self::DatabaseQuery(_) | Self::SupabaseApi(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Self::UnsupportedDatabaseType(requested) = &self {
            tracing::warn!(requested = %requested, "rejected unsupported database type");
        }
        (status, Json(ApiReply::failure(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_is_client_error() {
        let err = AppError::UnsupportedDatabaseType("mongodb".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "unsupported database type");
    }

    #[test]
    fn connection_errors_are_redacted() {
        let err = AppError::connection("fail for mysql://root:hunter2@db:3306/app");
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn backend_faults_map_to_server_error_if_they_escape() {
        assert_eq!(
            AppError::connection("refused").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::query("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::supabase("401").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
