//! Service configuration.
//!
//! All settings come from the environment with sensible defaults,
//! so the binary runs out of the box on localhost.

use std::time::Duration;

/// Runtime configuration for the query console service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Directory the browser UI is served from.
    pub static_dir: String,

    /// Timeout applied to the connect phase of every adapter call.
    pub connect_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "public".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Loads the configuration from environment variables,
    /// falling back to defaults for anything unset.
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("SERVER_HOST", defaults.host),
            port: env_parse_or("SERVER_PORT", defaults.port),
            static_dir: env_or("STATIC_DIR", defaults.static_dir),
            connect_timeout_secs: env_parse_or(
                "CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
        }
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
