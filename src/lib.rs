//! PodKiller Library
//!
//! Kubernetes pod chaos experiments: kill pods, find their replacements and
//! measure how long the replacements take to become ready.

pub mod api;
pub mod chaos;
pub mod config;
pub mod db;
pub mod error;
pub mod experiment;
pub mod k8s;
pub mod models;
pub mod reports;

use axum::http::{header, Method};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;
use crate::api::AppState;

/// Create the application router with the given state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/api/status", get(api::health::cluster_status))
        // Pods
        .route("/api/namespaces", get(api::pods::list_namespaces))
        .route("/api/pods", get(api::pods::list_pods))
        .route("/api/pods/:namespace", get(api::pods::list_pods_in_namespace))
        // Kill sessions
        .route("/api/kill", post(api::kill::kill))
        .route("/api/kill/stream", post(api::kill::kill_stream))
        // Reports
        .route(
            "/api/reports",
            get(api::reports::list_reports).post(api::reports::create_report),
        )
        .route("/api/reports/export", get(api::reports::export_reports))
        // Metrics (Prometheus)
        .route("/metrics", get(api::metrics::metrics_handler))
        // OpenAPI / Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Create CORS layer with secure configuration
fn cors_layer() -> CorsLayer {
    // Allow origins from environment or default to localhost for development
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
