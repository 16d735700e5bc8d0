//! Wire-level reply types.
//!
//! Both console endpoints answer with the same flat JSON envelope:
//! `{success, message?, data?, executionTime?, error?}`. Absent fields
//! are omitted rather than sent as null.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Row;

/// Reply envelope for the test-connection and execute-query endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiReply {
    /// Whether the operation succeeded.
    pub success: bool,

    /// Human-readable confirmation (connection tests only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Result rows, one column-name-to-value map per row.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub data: Option<Vec<Row>>,

    /// Query wall-clock time in milliseconds.
    #[serde(rename = "executionTime", skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,

    /// Error message (present on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiReply {
    /// Successful reply carrying only a confirmation message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            execution_time: None,
            error: None,
        }
    }

    /// Successful reply carrying result rows and timing.
    pub fn rows(data: Vec<Row>, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            execution_time: Some(execution_time_ms),
            error: None,
        }
    }

    /// Failed reply carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            execution_time: None,
            error: Some(error.into()),
        }
    }
}
