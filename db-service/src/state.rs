//! Application state for the query console.

use common::config::AppConfig;

/// Application state shared across handlers.
///
/// The reqwest client is the only shared resource; it is internally
/// synchronized and cheap to clone. Database connections are opened
/// per request by the adapters and never stored here.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .expect("failed to build HTTP client");

        Self {
            config,
            http_client,
        }
    }
}
