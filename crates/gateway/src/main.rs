//! ReadForge API Gateway
//!
//! Exposes the analytics engines as JSON endpoints.
//! Handles:
//! - Request validation and routing
//! - Metadata catalog loading
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use readforge_common::{config::AppConfig, metrics};
use readforge_engine::fetch::create_fetcher;
use readforge_engine::{SuggestionConfig, SuggestionEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub suggestions: Arc<SuggestionEngine>,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let fetcher = create_fetcher(&config.catalog)?;
        let suggestions = SuggestionEngine::new(SuggestionConfig::from(config.suggestions.clone()), fetcher);

        Ok(Self {
            config: Arc::new(config),
            suggestions: Arc::new(suggestions),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    init_tracing(&config);

    info!("Starting ReadForge API Gateway v{}", readforge_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        metrics::register_metrics();
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // Create app state
    let state = AppState::new(config)?;

    // Build the router
    let app = create_router(state);

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.observability.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    // API routes
    let api_routes = Router::new()
        .route("/suggestions", post(handlers::suggestions::suggestions))
        .route("/authors", post(handlers::authors::authors))
        .route("/authors/publications", post(handlers::authors::author_publications))
        .route("/concepts", post(handlers::concepts::concepts));

    // Compose the app
    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/v1", api_routes)
        .route_layer(axum::middleware::from_fn(middleware::metrics::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(AppState::new(AppConfig::default()).unwrap())
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_suggestions_endpoint() {
        let (status, body) = post_json(
            "/v1/suggestions",
            json!({
                "selected": [
                    {"doi": "A", "citesOut": ["B", "D"], "citesIn": ["C"]},
                    {"doi": "B"},
                    {"doi": "C"}
                ],
                "excluded": [],
                "read": ["D"]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalSuggestions"], 1);
        assert_eq!(body["publications"][0]["doi"], "D");
        assert_eq!(body["publications"][0]["citationCount"], 1);
        assert_eq!(body["publications"][0]["isRead"], true);
        // No catalog configured, so the fetch failure is reported
        assert_eq!(body["failures"][0]["doi"], "D");
        assert_eq!(body["failures"][0]["message"], "Publication not found: D");
    }

    #[tokio::test]
    async fn test_suggestions_rejects_zero_page() {
        let (status, body) = post_json(
            "/v1/suggestions",
            json!({"selected": [], "maxSuggestions": 0}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_authors_endpoints() {
        let publications = json!([
            {"doi": "10.1/1", "author": "Smith, J.; Lee, J.", "score": 1.0, "year": 2020},
            {"doi": "10.1/2", "author": "Smith, John B.", "score": 1.0}
        ]);

        let (status, body) = post_json("/v1/authors", json!({"publications": publications})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["authors"].as_array().unwrap().len(), 3);
        assert_eq!(body["coauthorGraph"][0]["source"], "lee j");

        let smith = body["authors"]
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["id"] == "smith j")
            .cloned()
            .unwrap();
        let (status, body) = post_json(
            "/v1/authors/publications",
            json!({"author": smith, "publications": publications}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["publications"].as_array().unwrap().len(), 1);
        assert_eq!(body["publications"][0]["doi"], "10.1/1");
    }

    #[tokio::test]
    async fn test_concepts_endpoint() {
        let (status, body) = post_json(
            "/v1/concepts",
            json!({
                "publications": [
                    {"doi": "pub1", "title": "Visual Analytics"},
                    {"doi": "pub2", "title": "Visual Data"},
                    {"doi": "pub3", "title": "Machine Learning"}
                ],
                "keywords": "VISUAL, DATA"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["concepts"][0]["extent"], json!(["pub1", "pub2"]));
        assert_eq!(body["concepts"][0]["intent"], json!(["VISUAL"]));
        assert_eq!(body["concepts"][0]["importance"], 2);
    }

    #[tokio::test]
    async fn test_concepts_too_many_keywords() {
        let keywords: Vec<String> = (0..25).map(|i| format!("kw{}", i)).collect();
        let (status, body) = post_json(
            "/v1/concepts",
            json!({"publications": [{"doi": "a", "title": "kw1"}], "keywords": keywords}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "TOO_MANY_ATTRIBUTES");
    }
}
