//! OpenAPI documentation for the PodKiller API

use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PodKiller API",
        version = "1.0.0",
        description = "Kubernetes pod chaos experiments.\n\n## Features\n- Kill explicit or random pods in a namespace\n- Attribute each killed pod to its replacement\n- Measure replacement recovery time\n- Optional network latency during a session\n- Stream progress over Server-Sent Events\n- Store and export session reports",
        license(name = "MIT"),
        contact(name = "PodKiller Team")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "chaos", description = "Kill sessions"),
        (name = "pods", description = "Namespace and pod listing"),
        (name = "reports", description = "Stored session reports"),
        (name = "metrics", description = "Prometheus metrics"),
        (name = "cluster", description = "Service and Kubernetes cluster status")
    ),
    paths(
        // Cluster
        crate::api::health::health_check,
        crate::api::health::cluster_status,
        // Pods
        crate::api::pods::list_namespaces,
        crate::api::pods::list_pods,
        // Chaos
        crate::api::kill::kill,
        crate::api::kill::kill_stream,
        // Reports
        crate::api::reports::list_reports,
        crate::api::reports::create_report,
        crate::api::reports::export_reports,
        // Metrics / Prometheus
        crate::api::metrics::metrics_handler,
    ),
    components(
        schemas(
            // Cluster schemas
            crate::api::health::HealthResponse,
            crate::api::health::ClusterStatusResponse,
            // Pod schemas
            crate::api::pods::NamespaceInfo,
            crate::api::pods::NamespacesResponse,
            crate::api::pods::PodSummary,
            crate::api::pods::PodsResponse,
            // Session schemas
            crate::experiment::KillRequest,
            crate::experiment::ProgressEvent,
            crate::experiment::ProgressKind,
            crate::models::SessionReport,
            crate::models::RecoveryResult,
            crate::models::RecoveryStatus,
            crate::models::MatchedBy,
            // Report schemas
            crate::api::reports::ReportsResponse,
            crate::api::reports::ReportSavedResponse,
            // Common
            ErrorResponse,
        )
    )
)]
pub struct ApiDoc;

/// Error response returned by the API
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine readable error code
    #[schema(example = "BAD_REQUEST")]
    pub error: String,
    /// Human readable message
    #[schema(example = "Pods not found in namespace 'default': web-1")]
    pub message: String,
}
