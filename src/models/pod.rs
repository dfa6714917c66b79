use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle phase of a pod as seen by the experiment engine
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum PodPhase {
    Pending,
    Running,
    /// Marked for deletion, regardless of the phase the kubelet reports
    Terminating,
    Succeeded,
    Failed,
    Unknown,
}

/// Snapshot of a pod taken from a single list or get call.
///
/// Never cached across polls; every loop iteration fetches a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub phase: PodPhase,
    /// Ready flag of every container status, in status order
    pub container_ready: Vec<bool>,
    pub marked_for_deletion: bool,
}

impl PodRef {
    /// A pod is alive until the cluster stamps it for deletion
    pub fn is_alive(&self) -> bool {
        !self.marked_for_deletion
    }

    /// Running with at least one container and every container ready
    pub fn is_ready(&self) -> bool {
        self.phase == PodPhase::Running
            && !self.container_ready.is_empty()
            && self.container_ready.iter().all(|ready| *ready)
    }
}

impl From<&Pod> for PodRef {
    fn from(pod: &Pod) -> Self {
        let marked_for_deletion = pod.metadata.deletion_timestamp.is_some();
        let status = pod.status.as_ref();

        let phase = if marked_for_deletion {
            PodPhase::Terminating
        } else {
            status
                .and_then(|s| s.phase.as_deref())
                .and_then(|p| p.parse().ok())
                .unwrap_or(PodPhase::Unknown)
        };

        let container_ready = status
            .and_then(|s| s.container_statuses.as_ref())
            .map(|statuses| statuses.iter().map(|c| c.ready).collect())
            .unwrap_or_default();

        PodRef {
            name: pod.metadata.name.clone().unwrap_or_default(),
            namespace: pod.metadata.namespace.clone().unwrap_or_default(),
            creation_timestamp: pod.metadata.creation_timestamp.as_ref().map(|t| t.0),
            phase,
            container_ready,
            marked_for_deletion,
        }
    }
}
