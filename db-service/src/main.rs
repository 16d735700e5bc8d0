//! Multi-database web query console.
//!
//! Serves the browser UI and two JSON endpoints:
//! - `POST /api/test-connection` — probe a database with the supplied
//!   connection fields
//! - `POST /api/execute-query` — run one ad-hoc statement and return
//!   the rows
//!
//! Supports Supabase, MySQL, PostgreSQL, SQLite and SQL Server. Every
//! request opens its own connection and closes it before replying.

mod adapters;
mod dispatcher;
mod handlers;
mod routes;
mod state;

use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "db-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Query Console API",
        version = "0.1.0",
        description = "Test connections and run ad-hoc queries against five database kinds"
    ),
    paths(
        handlers::test_connection,
        handlers::execute_query,
        handlers::health_check,
    ),
    components(schemas(
        common::models::TestRequest,
        common::models::QueryRequest,
        common::models::ConnectionProfile,
        common::response::ApiReply,
        handlers::HealthResponse,
    )),
    tags(
        (name = "console", description = "Connection test and query endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything else
    load_dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::load();
    let state = AppState::new(config.clone());
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, static_dir = %config.static_dir, "starting service");

    let listener = TcpListener::bind(&addr).await.expect("failed to bind address");
    axum::serve(listener, app).await.expect("server failed");
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Everything that is not an API route falls through to the static
    // browser UI.
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback_service(static_files)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Load .env file from the working directory (best-effort, no error if missing).
fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if env_path.exists() {
        if let Ok(content) = std::fs::read_to_string(env_path) {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim();
                    // Only set if not already set by the environment
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(AppState::new(AppConfig::default()))
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_reports_the_service() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "db-service");
    }

    #[tokio::test]
    async fn unknown_database_type_is_a_client_error() {
        let response = app()
            .oneshot(json_post(
                "/api/test-connection",
                r#"{"type": "mongodb", "config": {}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "unsupported database type");
    }

    #[tokio::test]
    async fn unknown_type_on_query_endpoint_is_also_rejected() {
        let response = app()
            .oneshot(json_post(
                "/api/execute-query",
                r#"{"type": "oracle", "config": {}, "query": "SELECT 1"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_dispatch() {
        let response = app()
            .oneshot(json_post(
                "/api/execute-query",
                r#"{"type": "sqlite", "config": {"filePath": "x.db"}, "query": ""}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_a_client_error() {
        let response = app()
            .oneshot(json_post("/api/test-connection", "{not json"))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn missing_config_field_surfaces_as_failure_not_crash() {
        // sqlite with no filePath: the adapter's defensive validation
        // turns into a well-formed failure reply.
        let response = app()
            .oneshot(json_post(
                "/api/test-connection",
                r#"{"type": "sqlite", "config": {}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("filePath"));
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
