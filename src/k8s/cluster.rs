//! Cluster capability used by the experiment engine

use async_trait::async_trait;

use crate::error::ClusterError;
use crate::models::PodRef;

/// Captured result of a command run inside a pod
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// The subset of the Kubernetes API the engine needs.
///
/// Constructed once at startup and shared by reference; implementations hold
/// no per-session state.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// List every pod in a namespace, including ones marked for deletion
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRef>, ClusterError>;

    async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), ClusterError>;

    async fn get_pod(&self, name: &str, namespace: &str) -> Result<PodRef, ClusterError>;

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError>;

    /// Run `command` in the pod's first container and wait for it to exit
    async fn exec(
        &self,
        pod: &str,
        namespace: &str,
        command: Vec<String>,
    ) -> Result<ExecOutput, ClusterError>;
}
