//! Request dispatcher.
//!
//! Routes a typed request to the adapter for its database kind. Type
//! resolution happens before this point, so an unrecognized type never
//! reaches an adapter.

use std::time::Duration;

use common::errors::AppResult;
use common::models::{ConnectionProfile, DbType, QueryOutcome, TestOutcome};

use crate::adapters::{
    DatabaseAdapter, MySqlAdapter, PostgresAdapter, SqlServerAdapter, SqliteAdapter,
    SupabaseAdapter,
};

/// Selects and drives the adapter for one request.
pub struct Dispatcher {
    http_client: reqwest::Client,
    connect_timeout: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher for one request.
    pub fn new(http_client: reqwest::Client, connect_timeout: Duration) -> Self {
        Self {
            http_client,
            connect_timeout,
        }
    }

    fn adapter(&self, db_type: DbType) -> Box<dyn DatabaseAdapter> {
        match db_type {
            DbType::Supabase => Box::new(SupabaseAdapter::new(self.http_client.clone())),
            DbType::MySql => Box::new(MySqlAdapter::new(self.connect_timeout)),
            DbType::Postgres => Box::new(PostgresAdapter::new(self.connect_timeout)),
            DbType::Sqlite => Box::new(SqliteAdapter::new(self.connect_timeout)),
            DbType::SqlServer => Box::new(SqlServerAdapter::new(self.connect_timeout)),
        }
    }

    /// Tests connectivity against the chosen backend.
    pub async fn test_connection(
        &self,
        db_type: DbType,
        profile: &ConnectionProfile,
    ) -> AppResult<TestOutcome> {
        profile.validate_for(db_type)?;
        self.adapter(db_type).test_connection(profile).await
    }

    /// Executes one statement against the chosen backend.
    pub async fn execute_query(
        &self,
        db_type: DbType,
        profile: &ConnectionProfile,
        query: &str,
    ) -> AppResult<QueryOutcome> {
        profile.validate_for(db_type)?;
        self.adapter(db_type).execute_query(profile, query).await
    }
}
