//! Shared data models.

pub mod request;
pub mod result;

// Re-export commonly used types
pub use request::{ConnectionProfile, DbType, QueryRequest, TestRequest};
pub use result::{QueryOutcome, Row, TestOutcome};
