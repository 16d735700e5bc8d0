//! Supabase adapter.
//!
//! Supabase exposes a REST layer, not a SQL socket, so raw statements
//! cannot be executed. Instead the query text is classified into one of
//! a small closed set of intents and each intent maps to one REST call
//! (or to a synthetic local answer). This is substring matching, not a
//! SQL parser: WHERE clauses and joins in the text are ignored.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;

use common::errors::{AppError, AppResult};
use common::models::{ConnectionProfile, DbType, QueryOutcome, Row, TestOutcome};

use super::DatabaseAdapter;

/// Row cap applied to every fetch intent.
const ROW_LIMIT: u32 = 10;

/// The recognized query intents, in matching order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    /// List public-schema table names.
    ListTables,
    /// Liveness probe; answered locally.
    Probe,
    /// Engine identity; answered locally.
    Identity,
    /// Fetch up to [`ROW_LIMIT`] rows from a table.
    SelectAll(String),
    /// Exact row count of a table, no row data.
    Count(String),
    /// No rule matched.
    Unsupported,
}

/// Classifies a query by an ordered rule sequence; first match wins.
///
/// A rule whose table-name extraction fails is skipped and matching
/// falls through to the next rule.
pub fn classify(query: &str) -> QueryIntent {
    let lower = query.to_lowercase();

    if lower.contains("table_name") && lower.contains("information_schema") {
        return QueryIntent::ListTables;
    }
    if lower.contains("select 1") {
        return QueryIntent::Probe;
    }
    if lower.contains("current_database") || lower.contains("current_user") {
        return QueryIntent::Identity;
    }
    if lower.contains("select * from") {
        if let Some(table) = extract_table(query) {
            return QueryIntent::SelectAll(table);
        }
    }
    if lower.contains("select count") {
        if let Some(table) = extract_table(query) {
            return QueryIntent::Count(table);
        }
    }
    // Catch-all for projected SELECTs; behaves exactly like the
    // select-star rule but is kept as its own step so the precedence
    // order stays visible.
    if lower.contains("select") && lower.contains("from") {
        if let Some(table) = extract_table(query) {
            return QueryIntent::SelectAll(table);
        }
    }

    QueryIntent::Unsupported
}

/// First word-character run following a case-insensitive `from` and at
/// least one whitespace character. Occurrences that are not followed by
/// an identifier are skipped.
fn extract_table(query: &str) -> Option<String> {
    let bytes = query.as_bytes();
    let lower = query.to_ascii_lowercase();
    let lower_bytes = lower.as_bytes();

    let mut i = 0;
    while i + 4 <= bytes.len() {
        if &lower_bytes[i..i + 4] == b"from" {
            let mut j = i + 4;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j > i + 4 {
                let start = j;
                while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                    j += 1;
                }
                if j > start {
                    return Some(query[start..j].to_string());
                }
            }
            i += 4;
        } else {
            i += 1;
        }
    }
    None
}

/// Adapter for Supabase projects.
pub struct SupabaseAdapter {
    client: reqwest::Client,
}

impl SupabaseAdapter {
    /// Creates a new adapter over a shared HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn base_url(profile: &ConnectionProfile) -> String {
        profile
            .url
            .as_deref()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string()
    }

    fn authed(&self, req: reqwest::RequestBuilder, profile: &ConnectionProfile) -> reqwest::RequestBuilder {
        let key = profile.api_key.as_deref().unwrap_or_default();
        req.header("apikey", key)
            .header("Authorization", format!("Bearer {}", key))
    }

    async fn send_checked(&self, req: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        let response = req.send().await.map_err(AppError::supabase)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::supabase(format!(
                "Supabase API error ({}): {}",
                status,
                body.trim()
            )));
        }
        Ok(response)
    }

    /// Public-schema table names via the REST metadata resource.
    async fn list_tables(&self, profile: &ConnectionProfile) -> AppResult<Vec<Row>> {
        let url = format!(
            "{}/rest/v1/information_schema.tables?select=table_name&table_schema=eq.public",
            Self::base_url(profile)
        );
        let response = self
            .send_checked(self.authed(self.client.get(&url), profile))
            .await?;
        let rows: Vec<Row> = response.json().await.map_err(AppError::supabase)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut out = Row::new();
                out.insert(
                    "table_name".to_string(),
                    row.get("table_name").cloned().unwrap_or(serde_json::Value::Null),
                );
                out
            })
            .collect())
    }

    /// Up to [`ROW_LIMIT`] rows from the named resource, unfiltered.
    async fn select_rows(&self, profile: &ConnectionProfile, table: &str) -> AppResult<Vec<Row>> {
        let url = format!(
            "{}/rest/v1/{}?select=*&limit={}",
            Self::base_url(profile),
            table,
            ROW_LIMIT
        );
        let response = self
            .send_checked(self.authed(self.client.get(&url), profile))
            .await?;
        response.json().await.map_err(AppError::supabase)
    }

    /// Exact row count via a HEAD request; no row data travels.
    async fn count_rows(&self, profile: &ConnectionProfile, table: &str) -> AppResult<Vec<Row>> {
        let url = format!("{}/rest/v1/{}?select=*", Self::base_url(profile), table);
        let response = self
            .send_checked(
                self.authed(self.client.head(&url), profile)
                    .header("Prefer", "count=exact"),
            )
            .await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| {
                AppError::SupabaseApi("Supabase did not return a row count".to_string())
            })?;

        let mut row = Row::new();
        row.insert("count".to_string(), json!(total));
        Ok(vec![row])
    }

    fn probe_row() -> Vec<Row> {
        let mut row = Row::new();
        row.insert("test".to_string(), json!(1));
        vec![row]
    }

    fn identity_row() -> Vec<Row> {
        let mut row = Row::new();
        row.insert("current_database".to_string(), json!("postgres"));
        row.insert("current_user".to_string(), json!("postgres"));
        row.insert(
            "version".to_string(),
            json!("PostgreSQL 15.1 on x86_64-pc-linux-gnu"),
        );
        vec![row]
    }
}

#[async_trait]
impl DatabaseAdapter for SupabaseAdapter {
    async fn test_connection(&self, profile: &ConnectionProfile) -> AppResult<TestOutcome> {
        profile.validate_for(DbType::Supabase)?;

        // Lightweight auth check; the REST layer has no generic probe.
        let url = format!("{}/auth/v1/settings", Self::base_url(profile));
        self.send_checked(self.authed(self.client.get(&url), profile))
            .await?;

        Ok(TestOutcome::succeeded(DbType::Supabase.label()))
    }

    async fn execute_query(
        &self,
        profile: &ConnectionProfile,
        query: &str,
    ) -> AppResult<QueryOutcome> {
        profile.validate_for(DbType::Supabase)?;
        let start = Instant::now();

        let rows = match classify(query) {
            QueryIntent::ListTables => self.list_tables(profile).await?,
            QueryIntent::Probe => Self::probe_row(),
            QueryIntent::Identity => Self::identity_row(),
            QueryIntent::SelectAll(table) => self.select_rows(profile, &table).await?,
            QueryIntent::Count(table) => self.count_rows(profile, &table).await?,
            QueryIntent::Unsupported => return Err(AppError::UnsupportedQueryPattern),
        };

        Ok(QueryOutcome::new(rows, start.elapsed().as_millis() as u64))
    }
}
