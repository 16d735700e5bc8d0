//! SQL Server adapter.
//!
//! Builds a connection-scoped `tiberius::Client` for every call; there
//! is deliberately no process-wide handle, so concurrent requests never
//! share or tear down each other's connections.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use common::errors::{AppError, AppResult};
use common::models::{ConnectionProfile, DbType, QueryOutcome, Row, TestOutcome};

use super::DatabaseAdapter;

/// Adapter for Microsoft SQL Server databases.
pub struct SqlServerAdapter {
    connect_timeout: Duration,
}

impl SqlServerAdapter {
    /// Creates a new adapter with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    fn build_config(profile: &ConnectionProfile) -> Config {
        let mut config = Config::new();
        config.host(profile.host.as_deref().unwrap_or_default());
        config.port(profile.port_or_default(DbType::SqlServer));
        config.database(profile.database.as_deref().unwrap_or_default());
        config.authentication(AuthMethod::sql_server(
            profile.username.as_deref().unwrap_or_default(),
            profile.password.as_deref().unwrap_or_default(),
        ));
        // Encrypted transport with the server certificate accepted
        // as-is, matching the browser tool this console replaces.
        config.trust_cert();
        config
    }

    async fn open(&self, profile: &ConnectionProfile) -> AppResult<Client<Compat<TcpStream>>> {
        profile.validate_for(DbType::SqlServer)?;
        let config = Self::build_config(profile);

        let connect = async move {
            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(AppError::connection)?;
            tcp.set_nodelay(true).map_err(AppError::connection)?;
            Client::connect(config, tcp.compat_write())
                .await
                .map_err(AppError::connection)
        };

        tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                AppError::DatabaseConnection(format!(
                    "connect timed out after {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
    }
}

#[async_trait]
impl DatabaseAdapter for SqlServerAdapter {
    async fn test_connection(&self, profile: &ConnectionProfile) -> AppResult<TestOutcome> {
        let mut client = self.open(profile).await?;
        let probe = match client.simple_query("SELECT 1").await {
            Ok(stream) => stream.into_results().await.map(|_| ()),
            Err(e) => Err(e),
        };
        client.close().await.ok();
        probe.map_err(AppError::query)?;
        Ok(TestOutcome::succeeded(DbType::SqlServer.label()))
    }

    async fn execute_query(
        &self,
        profile: &ConnectionProfile,
        query: &str,
    ) -> AppResult<QueryOutcome> {
        let start = Instant::now();
        let mut client = self.open(profile).await?;

        // The fetch result is bound first so the stream's borrow of
        // `client` ends before the error branch tears the client down.
        let fetched = match client.simple_query(query).await {
            Ok(stream) => stream.into_results().await,
            Err(e) => Err(e),
        };
        let result_sets = match fetched {
            Ok(sets) => sets,
            Err(e) => {
                client.close().await.ok();
                return Err(AppError::query(e));
            }
        };
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let data = result_sets
            .iter()
            .flatten()
            .map(row_to_map)
            .collect();
        client.close().await.ok();

        Ok(QueryOutcome::new(data, execution_time_ms))
    }
}

fn row_to_map(row: &tiberius::Row) -> Row {
    let names: Vec<String> = row
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut map = Row::new();
    for (idx, name) in names.into_iter().enumerate() {
        map.insert(name, value_at(row, idx));
    }
    map
}

/// Decodes one cell into JSON by trying concrete TDS types in order.
fn value_at(row: &tiberius::Row, idx: usize) -> Value {
    if let Ok(Some(v)) = row.try_get::<i64, _>(idx) {
        return Value::from(v);
    }
    if let Ok(Some(v)) = row.try_get::<i32, _>(idx) {
        return Value::from(v);
    }
    if let Ok(Some(v)) = row.try_get::<i16, _>(idx) {
        return Value::from(v);
    }
    if let Ok(Some(v)) = row.try_get::<u8, _>(idx) {
        return Value::from(v);
    }
    if let Ok(Some(v)) = row.try_get::<bool, _>(idx) {
        return Value::from(v);
    }
    if let Ok(Some(v)) = row.try_get::<f64, _>(idx) {
        return Value::from(v);
    }
    if let Ok(Some(v)) = row.try_get::<f32, _>(idx) {
        return Value::from(v as f64);
    }
    if let Ok(Some(v)) = row.try_get::<rust_decimal::Decimal, _>(idx) {
        return match v.to_f64() {
            Some(f) => Value::from(f),
            None => Value::from(v.to_string()),
        };
    }
    if let Ok(Some(v)) = row.try_get::<&str, _>(idx) {
        return Value::from(v);
    }
    if let Ok(Some(v)) = row.try_get::<uuid::Uuid, _>(idx) {
        return Value::from(v.to_string());
    }
    if let Ok(Some(v)) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx) {
        return Value::from(v.to_rfc3339());
    }
    if let Ok(Some(v)) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
        return Value::from(v.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(Some(v)) = row.try_get::<chrono::NaiveDate, _>(idx) {
        return Value::from(v.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(v)) = row.try_get::<chrono::NaiveTime, _>(idx) {
        return Value::from(v.format("%H:%M:%S").to_string());
    }
    if let Ok(Some(v)) = row.try_get::<&[u8], _>(idx) {
        return Value::from(String::from_utf8_lossy(v).into_owned());
    }

    Value::Null
}
