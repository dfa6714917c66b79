use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct ClusterStatusResponse {
    pub connected: bool,
    pub message: String,
}

/// Liveness of the service itself
#[utoipa::path(
    get,
    path = "/health",
    tag = "cluster",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get Kubernetes cluster connection status
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "cluster",
    responses(
        (status = 200, description = "Cluster status", body = ClusterStatusResponse),
    )
)]
pub async fn cluster_status(State(state): State<AppState>) -> Json<ClusterStatusResponse> {
    let (connected, message) = match state.cluster.list_namespaces().await {
        Ok(_) => (true, "Kubernetes cluster connected".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Kubernetes cluster not reachable");
            (false, format!("Kubernetes cluster not available: {}", e))
        }
    };

    Json(ClusterStatusResponse { connected, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }
}
