//! PostgreSQL adapter.
//!
//! One fresh `PgConnection` per call, torn down before returning.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Connection, Executor, Row as _};

use common::errors::{AppError, AppResult};
use common::models::{ConnectionProfile, DbType, QueryOutcome, Row, TestOutcome};

use super::DatabaseAdapter;

/// Adapter for PostgreSQL databases.
pub struct PostgresAdapter {
    connect_timeout: Duration,
}

impl PostgresAdapter {
    /// Creates a new adapter with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    fn url(profile: &ConnectionProfile) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            profile.username.as_deref().unwrap_or_default(),
            profile.password.as_deref().unwrap_or_default(),
            profile.host.as_deref().unwrap_or_default(),
            profile.port_or_default(DbType::Postgres),
            profile.database.as_deref().unwrap_or_default(),
        )
    }

    async fn open(&self, profile: &ConnectionProfile) -> AppResult<PgConnection> {
        profile.validate_for(DbType::Postgres)?;
        let url = Self::url(profile);
        tokio::time::timeout(self.connect_timeout, PgConnection::connect(&url))
            .await
            .map_err(|_| {
                AppError::DatabaseConnection(format!(
                    "connect timed out after {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(AppError::connection)
    }
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    async fn test_connection(&self, profile: &ConnectionProfile) -> AppResult<TestOutcome> {
        let mut conn = self.open(profile).await?;
        // Called via `Executor` on the connection: the equivalent
        // `raw_sql(..).execute(&mut conn)` direction trips a rustc
        // higher-ranked lifetime bug inside `#[async_trait]`.
        let probe = (&mut conn).execute(sqlx::raw_sql("SELECT 1")).await;
        conn.close().await.ok();
        probe.map_err(AppError::query)?;
        Ok(TestOutcome::succeeded(DbType::Postgres.label()))
    }

    async fn execute_query(
        &self,
        profile: &ConnectionProfile,
        query: &str,
    ) -> AppResult<QueryOutcome> {
        let start = Instant::now();
        let mut conn = self.open(profile).await?;

        let rows = match (&mut conn).fetch_all(sqlx::raw_sql(query)).await {
            Ok(rows) => rows,
            Err(e) => {
                conn.close().await.ok();
                return Err(AppError::query(e));
            }
        };
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let data = rows.iter().map(row_to_map).collect();
        conn.close().await.ok();

        Ok(QueryOutcome::new(data, execution_time_ms))
    }
}

fn row_to_map(row: &PgRow) -> Row {
    let mut map = Row::new();
    for column in row.columns() {
        map.insert(column.name().to_string(), value_at(row, column.ordinal()));
    }
    map
}

/// Decodes one cell into JSON by trying concrete types in order.
/// NUMERIC goes through rust_decimal and is reported as a float (or a
/// string when it does not fit), which is the documented coercion.
fn value_at(row: &PgRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return v.map(|f| Value::from(f as f64)).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<rust_decimal::Decimal>, _>(idx) {
        return v
            .map(|d| match d.to_f64() {
                Some(f) => Value::from(f),
                None => Value::from(d.to_string()),
            })
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(idx) {
        return v.map(|u| Value::from(u.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
        return v.map(|dt| Value::from(dt.to_rfc3339())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return v
            .map(|dt| Value::from(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return v
            .map(|d| Value::from(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
        return v
            .map(|t| Value::from(t.format("%H:%M:%S").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<serde_json::Value>, _>(idx) {
        return v.unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|b| Value::from(String::from_utf8_lossy(&b).into_owned()))
            .unwrap_or(Value::Null);
    }

    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_default_port_when_unset() {
        let profile = ConnectionProfile {
            host: Some("pg.internal".to_string()),
            database: Some("app".to_string()),
            username: Some("postgres".to_string()),
            ..Default::default()
        };
        assert_eq!(
            PostgresAdapter::url(&profile),
            "postgres://postgres:@pg.internal:5432/app"
        );
    }

    #[tokio::test]
    async fn missing_database_fails_before_any_network_io() {
        let adapter = PostgresAdapter::new(Duration::from_secs(1));
        let profile = ConnectionProfile {
            host: Some("pg.internal".to_string()),
            username: Some("postgres".to_string()),
            ..Default::default()
        };
        let err = adapter.test_connection(&profile).await.unwrap_err();
        assert!(err.to_string().contains("database"));
    }
}
