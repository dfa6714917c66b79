//! Error types for PodKiller
//!
//! `ChaosError` is the experiment taxonomy used by the engine, `AppError` is
//! what HTTP handlers return.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the kill-and-recovery engine
#[derive(Debug, Error)]
pub enum ChaosError {
    /// One or more explicitly named targets do not exist in the namespace
    #[error("Pods not found in namespace '{namespace}': {}", missing.join(", "))]
    Validation {
        namespace: String,
        missing: Vec<String>,
    },

    /// Nothing eligible to kill
    #[error("No running pods available to kill in namespace '{namespace}'")]
    NoTargets { namespace: String },

    #[error("Failed to delete pod {pod}: {reason}")]
    Deletion { pod: String, reason: String },

    #[error("Fault injection failed on pod {pod}: {reason}")]
    FaultInjection { pod: String, reason: String },

    #[error("Failed to persist report: {0}")]
    Persistence(String),

    #[error("Cluster request failed: {0}")]
    Cluster(#[from] ClusterError),
}

/// Errors returned by the cluster adapter
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error("Exec in pod failed: {0}")]
    Exec(String),
}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ClusterError::NotFound { .. } => true,
            ClusterError::Api(kube::Error::Api(e)) => e.code == 404,
            _ => false,
        }
    }
}

/// Errors returned by API handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] kube::Error),

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(msg: &str) -> Self {
        AppError::NotFound(msg.to_string())
    }

    pub fn bad_request(msg: &str) -> Self {
        AppError::BadRequest(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::NotImplemented(_) => (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::Kubernetes(_) => (StatusCode::BAD_GATEWAY, "KUBERNETES_ERROR"),
            AppError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR"),
        }
    }
}

impl From<ChaosError> for AppError {
    fn from(err: ChaosError) -> Self {
        match err {
            ChaosError::Validation { .. } => AppError::BadRequest(err.to_string()),
            ChaosError::NoTargets { .. } => AppError::NotFound(err.to_string()),
            ChaosError::Cluster(e) => e.into(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<ClusterError> for AppError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::NotFound { .. } => AppError::NotFound(err.to_string()),
            ClusterError::Api(e) => AppError::Kubernetes(e),
            ClusterError::Exec(reason) => AppError::Internal(reason),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = json!({
            "error": code,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_missing_pods() {
        let err = ChaosError::Validation {
            namespace: "default".to_string(),
            missing: vec!["ghost-1".to_string(), "ghost-2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Pods not found in namespace 'default': ghost-1, ghost-2"
        );
    }

    #[test]
    fn test_chaos_error_status_mapping() {
        let validation: AppError = ChaosError::Validation {
            namespace: "default".to_string(),
            missing: vec!["x".to_string()],
        }
        .into();
        assert_eq!(validation.status_and_code().0, StatusCode::BAD_REQUEST);

        let no_targets: AppError = ChaosError::NoTargets {
            namespace: "default".to_string(),
        }
        .into();
        assert_eq!(no_targets.status_and_code().0, StatusCode::NOT_FOUND);

        let persistence: AppError = ChaosError::Persistence("disk full".to_string()).into();
        assert_eq!(
            persistence.status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_cluster_error() {
        let err = ClusterError::NotFound {
            kind: "Pod",
            name: "p1".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!ClusterError::Exec("boom".to_string()).is_not_found());
    }

    #[test]
    fn test_export_error_is_server_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "writer closed");
        let err: AppError = csv::Error::from(io).into();
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR")
        );
    }
}
