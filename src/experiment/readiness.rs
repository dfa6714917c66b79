//! Readiness monitoring of a replacement pod

use tracing::{debug, info, warn};

use super::clock::Clock;
use super::events::EventEmitter;
use super::PollSettings;
use crate::k8s::ClusterApi;

/// Poll `pod_name` until it is Running with every container ready.
///
/// Returns the seconds between the pod's own creation timestamp and the
/// instant readiness was observed, or `None` when the attempts run out. A pod
/// that cannot be fetched (not created yet, API hiccup) is retried.
pub async fn wait_for_ready(
    cluster: &dyn ClusterApi,
    clock: &dyn Clock,
    namespace: &str,
    pod_name: &str,
    polling: PollSettings,
    events: &EventEmitter,
) -> Option<f64> {
    info!(pod = pod_name, namespace, "Measuring ready time");

    for attempt in 1..=polling.attempts {
        match cluster.get_pod(pod_name, namespace).await {
            Ok(pod) if pod.is_ready() => {
                let ready_at = clock.now();
                let created = pod.creation_timestamp.unwrap_or_else(|| {
                    warn!(pod = pod_name, "Pod has no creation timestamp, recovery time is zero");
                    ready_at
                });
                let seconds = ((ready_at - created).num_milliseconds() as f64 / 1000.0).max(0.0);
                info!(pod = pod_name, recovery_seconds = seconds, attempt, "Pod is ready");
                events.info(format!("Status: {} (attempt {})", pod.phase, attempt));
                return Some(seconds);
            }
            Ok(pod) => {
                debug!(pod = pod_name, phase = %pod.phase, attempt, "Pod not ready");
                events.info(format!("Status: {} (attempt {})", pod.phase, attempt));
            }
            Err(e) if e.is_not_found() => {
                debug!(pod = pod_name, attempt, "Pod not visible yet");
                events.info(format!("Waiting for pod to appear... (attempt {})", attempt));
            }
            Err(e) => {
                warn!(pod = pod_name, attempt, error = %e, "Error reading pod status");
                events.info(format!("Status: Unknown (attempt {})", attempt));
            }
        }

        if attempt < polling.attempts {
            tokio::time::sleep(polling.interval).await;
        }
    }

    warn!(
        pod = pod_name,
        attempts = polling.attempts,
        waited = ?polling.budget(),
        "Timeout waiting for pod to be ready"
    );
    None
}
