//! Request models for the console endpoints.
//!
//! A request names a database type, carries the connection fields for
//! that type, and (for query execution) the raw statement text. Nothing
//! here outlives the request.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{AppError, AppResult};

/// The five database kinds the console can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum DbType {
    /// Supabase project (REST transport, no raw SQL endpoint).
    Supabase,
    /// MySQL database.
    MySql,
    /// PostgreSQL database.
    Postgres,
    /// SQLite database file.
    Sqlite,
    /// Microsoft SQL Server database.
    SqlServer,
}

impl DbType {
    /// Returns the default port for network database types.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DbType::MySql => Some(3306),
            DbType::Postgres => Some(5432),
            DbType::SqlServer => Some(1433),
            DbType::Supabase | DbType::Sqlite => None,
        }
    }

    /// Display name used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            DbType::Supabase => "Supabase",
            DbType::MySql => "MySQL",
            DbType::Postgres => "PostgreSQL",
            DbType::Sqlite => "SQLite",
            DbType::SqlServer => "SQL Server",
        }
    }
}

impl FromStr for DbType {
    type Err = AppError;

    /// Parses the wire spelling of a database type.
    ///
    /// Anything unrecognized is a hard error; there is deliberately no
    /// fallback type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(DbType::Supabase),
            "mysql" => Ok(DbType::MySql),
            "postgresql" | "postgres" => Ok(DbType::Postgres),
            "sqlite" => Ok(DbType::Sqlite),
            "sqlserver" | "mssql" => Ok(DbType::SqlServer),
            other => Err(AppError::UnsupportedDatabaseType(other.to_string())),
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::Supabase => write!(f, "supabase"),
            DbType::MySql => write!(f, "mysql"),
            DbType::Postgres => write!(f, "postgresql"),
            DbType::Sqlite => write!(f, "sqlite"),
            DbType::SqlServer => write!(f, "sqlserver"),
        }
    }
}

/// Connection fields for any database type.
///
/// One flat struct rather than a tagged union: the browser form sends
/// only the fields the chosen type needs, and [`ConnectionProfile::validate_for`]
/// checks the required set per type. Adapters call it again defensively.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    /// Supabase project URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Supabase API key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Database host (MySQL / PostgreSQL / SQL Server).
    #[serde(default)]
    pub host: Option<String>,

    /// Database port; accepts a JSON number or numeric string.
    #[serde(default, deserialize_with = "port_from_string_or_number")]
    pub port: Option<u16>,

    /// Database name.
    #[serde(default)]
    pub database: Option<String>,

    /// Database username.
    #[serde(default)]
    pub username: Option<String>,

    /// Database password.
    #[serde(default)]
    pub password: Option<String>,

    /// SQLite database file path.
    #[serde(default)]
    pub file_path: Option<String>,
}

impl ConnectionProfile {
    /// Checks that every field the given type requires is present and non-empty.
    pub fn validate_for(&self, db_type: DbType) -> AppResult<()> {
        match db_type {
            DbType::Supabase => {
                require(db_type, "url", &self.url)?;
                require(db_type, "apiKey", &self.api_key)?;
            }
            DbType::MySql | DbType::Postgres | DbType::SqlServer => {
                require(db_type, "host", &self.host)?;
                require(db_type, "database", &self.database)?;
                require(db_type, "username", &self.username)?;
            }
            DbType::Sqlite => {
                require(db_type, "filePath", &self.file_path)?;
            }
        }
        Ok(())
    }

    /// Port to use for the given type, falling back to the type default.
    pub fn port_or_default(&self, db_type: DbType) -> u16 {
        self.port.or_else(|| db_type.default_port()).unwrap_or(0)
    }
}

fn require(db_type: DbType, field: &str, value: &Option<String>) -> AppResult<()> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!(
            "{} requires the `{}` field",
            db_type.label(),
            field
        ))),
    }
}

/// The browser form posts the port as a string; tools post it as a number.
/// Accept both.
fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| Error::custom("port out of range")),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<u16>()
                    .map(Some)
                    .map_err(|_| Error::custom("port must be a number"))
            }
        }
        Some(_) => Err(Error::custom("port must be a number or numeric string")),
    }
}

/// Body of `POST /api/test-connection`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TestRequest {
    /// Database type (supabase, mysql, postgresql, sqlite, sqlserver).
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "database type is required"))]
    pub db_type: String,

    /// Connection fields for the chosen type.
    pub config: ConnectionProfile,
}

/// Body of `POST /api/execute-query`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    /// Database type (supabase, mysql, postgresql, sqlite, sqlserver).
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "database type is required"))]
    pub db_type: String,

    /// Connection fields for the chosen type.
    pub config: ConnectionProfile,

    /// Raw SQL (or SQL-like) statement to run.
    #[validate(length(min = 1, message = "query is required"))]
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_five_wire_spellings() {
        assert_eq!("supabase".parse::<DbType>().unwrap(), DbType::Supabase);
        assert_eq!("mysql".parse::<DbType>().unwrap(), DbType::MySql);
        assert_eq!("postgresql".parse::<DbType>().unwrap(), DbType::Postgres);
        assert_eq!("sqlite".parse::<DbType>().unwrap(), DbType::Sqlite);
        assert_eq!("sqlserver".parse::<DbType>().unwrap(), DbType::SqlServer);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = "mongodb".parse::<DbType>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported database type");
    }

    #[test]
    fn port_accepts_string_and_number() {
        let p: ConnectionProfile = serde_json::from_str(r#"{"port": "3306"}"#).unwrap();
        assert_eq!(p.port, Some(3306));
        let p: ConnectionProfile = serde_json::from_str(r#"{"port": 5432}"#).unwrap();
        assert_eq!(p.port, Some(5432));
        let p: ConnectionProfile = serde_json::from_str(r#"{"port": ""}"#).unwrap();
        assert_eq!(p.port, None);
        assert!(serde_json::from_str::<ConnectionProfile>(r#"{"port": "abc"}"#).is_err());
    }

    #[test]
    fn supabase_requires_url_and_key() {
        let profile = ConnectionProfile {
            url: Some("https://demo.supabase.co".to_string()),
            ..Default::default()
        };
        let err = profile.validate_for(DbType::Supabase).unwrap_err();
        assert!(err.to_string().contains("apiKey"));
    }

    #[test]
    fn sqlite_requires_file_path() {
        let profile = ConnectionProfile::default();
        assert!(profile.validate_for(DbType::Sqlite).is_err());

        let profile = ConnectionProfile {
            file_path: Some("./data.db".to_string()),
            ..Default::default()
        };
        assert!(profile.validate_for(DbType::Sqlite).is_ok());
    }

    #[test]
    fn network_types_fall_back_to_default_ports() {
        let profile = ConnectionProfile::default();
        assert_eq!(profile.port_or_default(DbType::MySql), 3306);
        assert_eq!(profile.port_or_default(DbType::Postgres), 5432);
        assert_eq!(profile.port_or_default(DbType::SqlServer), 1433);
    }

    #[test]
    fn empty_host_fails_validation() {
        let profile = ConnectionProfile {
            host: Some("   ".to_string()),
            database: Some("app".to_string()),
            username: Some("root".to_string()),
            ..Default::default()
        };
        assert!(profile.validate_for(DbType::MySql).is_err());
    }
}
