//! Per-backend database adapters.
//!
//! Each adapter opens a fresh connection, performs exactly one
//! operation and closes the connection before returning. No pooling,
//! no reuse, no state across calls.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;
mod supabase;

pub use mysql::MySqlAdapter;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;
pub use sqlserver::SqlServerAdapter;
pub use supabase::SupabaseAdapter;

use async_trait::async_trait;
use common::errors::AppResult;
use common::models::{ConnectionProfile, QueryOutcome, TestOutcome};

/// The two-operation capability every backend implements.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Opens a connection, issues a liveness probe and closes it.
    async fn test_connection(&self, profile: &ConnectionProfile) -> AppResult<TestOutcome>;

    /// Opens a connection, runs one statement, collects all rows and
    /// closes it. The reported duration spans connect through result
    /// read; teardown is excluded.
    async fn execute_query(
        &self,
        profile: &ConnectionProfile,
        query: &str,
    ) -> AppResult<QueryOutcome>;
}
