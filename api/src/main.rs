use std::net::SocketAddr;

use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use recollect_mcp_runtime::MemoryStore;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

mod config;
mod error;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "recollect",
        version = "0.1.0",
        description = "MCP tool server for voice agents. JSON-RPC goes to /message; these routes are for operators."
    ),
    paths(routes::health::health_check, routes::memory::memory_snapshot),
    components(schemas(
        routes::health::HealthResponse,
        recollect_core::records::MemoryCounts,
        recollect_core::records::MemorySnapshot,
        recollect_core::error::ApiError,
    ))
)]
struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn build_app(state: state::AppState, cors_origins: &str) -> Router {
    Router::new()
        .route("/api-doc/openapi.json", get(openapi_json))
        .merge(routes::health::router())
        .merge(routes::memory::router())
        .merge(routes::mcp_sse::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::build_cors_layer(cors_origins)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();
    let config = config::Config::parse();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "recollect_api=debug,recollect_mcp_runtime=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let public_base_url = config.public_base_url().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("RECOLLECT_PUBLIC_URL is not a valid URL: {e}"),
        )
    })?;

    let store = MemoryStore::new();
    let backend = config.build_backend(&store);
    tracing::info!(backend = %backend.kind(), "backend selected");

    let app_state = state::AppState::new(
        backend,
        store,
        public_base_url,
        format!("http://localhost:{}", config.port),
    );
    let app = build_app(app_state, &config.cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        sse = "/sse",
        message = "/message",
        health = "/health",
        "recollect listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down");
        })
        .await
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("request should succeed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (
            status,
            serde_json::from_slice(&bytes).expect("body should be JSON"),
        )
    }

    #[tokio::test]
    async fn message_then_health_reflects_the_write() {
        let app = build_app(state::AppState::in_memory(), "http://localhost:3000");

        let (status, body) = send(
            app.clone(),
            Request::builder()
                .method("POST")
                .uri("/message")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "jsonrpc": "2.0",
                        "id": 1,
                        "method": "tools/call",
                        "params": {
                            "name": "set_preference",
                            "arguments": { "key": "language", "value": "en", "category": "personal" }
                        }
                    })
                    .to_string(),
                ))
                .expect("request should build"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("error").is_none());

        let (status, health) = send(
            app,
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["stats"]["preferences"], 1);
        assert_eq!(health["protocol"], "SSE (Legacy)");
    }

    #[tokio::test]
    async fn openapi_document_lists_inspection_routes() {
        let app = build_app(state::AppState::in_memory(), "http://localhost:3000");
        let (status, doc) = send(
            app,
            Request::builder()
                .uri("/api-doc/openapi.json")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"].get("/health").is_some());
        assert!(doc["paths"].get("/memory").is_some());
    }
}
