//! Latency injection through `tc netem`, executed inside the target pod

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::error::ChaosError;
use crate::experiment::EventEmitter;
use crate::k8s::ClusterApi;

/// Network fault injection on a single pod
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FaultInjector: Send + Sync {
    /// Apply a fixed delay on the pod's interface, replacing any existing rule
    async fn set_latency(&self, pod: &str, namespace: &str, delay_ms: u64) -> Result<(), ChaosError>;

    /// Remove the delay rule. Succeeds when no rule is present.
    async fn clear_latency(&self, pod: &str, namespace: &str) -> Result<(), ChaosError>;
}

/// [`FaultInjector`] that runs `tc qdisc` through pod exec
#[derive(Clone)]
pub struct NetemInjector {
    cluster: Arc<dyn ClusterApi>,
    interface: String,
}

impl NetemInjector {
    pub fn new(cluster: Arc<dyn ClusterApi>, interface: impl Into<String>) -> Self {
        Self {
            cluster,
            interface: interface.into(),
        }
    }

    fn set_command(&self, delay_ms: u64) -> Vec<String> {
        [
            "tc", "qdisc", "replace", "dev", self.interface.as_str(), "root", "netem", "delay",
        ]
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(format!("{}ms", delay_ms)))
        .collect()
    }

    fn clear_command(&self) -> Vec<String> {
        ["tc", "qdisc", "del", "dev", self.interface.as_str(), "root", "netem"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// `tc` reports a missing qdisc in a few different ways depending on version
fn is_rule_absent(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("no such file or directory")
        || stderr.contains("cannot delete qdisc with handle of zero")
        || stderr.contains("invalid handle")
}

#[async_trait]
impl FaultInjector for NetemInjector {
    async fn set_latency(&self, pod: &str, namespace: &str, delay_ms: u64) -> Result<(), ChaosError> {
        let output = self
            .cluster
            .exec(pod, namespace, self.set_command(delay_ms))
            .await
            .map_err(|e| ChaosError::FaultInjection {
                pod: pod.to_string(),
                reason: e.to_string(),
            })?;

        if !output.success {
            return Err(ChaosError::FaultInjection {
                pod: pod.to_string(),
                reason: output.stderr.trim().to_string(),
            });
        }

        info!(pod, namespace, delay_ms, "Applied network latency");
        Ok(())
    }

    async fn clear_latency(&self, pod: &str, namespace: &str) -> Result<(), ChaosError> {
        let output = match self.cluster.exec(pod, namespace, self.clear_command()).await {
            Ok(output) => output,
            // A deleted pod takes its qdisc with it
            Err(e) if e.is_not_found() => {
                debug!(pod, "Pod gone, nothing to clear");
                return Ok(());
            }
            Err(e) => {
                return Err(ChaosError::FaultInjection {
                    pod: pod.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if output.success || is_rule_absent(&output.stderr) {
            info!(pod, namespace, "Cleared network latency");
            return Ok(());
        }

        Err(ChaosError::FaultInjection {
            pod: pod.to_string(),
            reason: output.stderr.trim().to_string(),
        })
    }
}

/// Run `body` with latency applied to every target.
///
/// Latency is cleared exactly once per target after `body` finishes, whether
/// it returns or panics. Injection and cleanup failures are logged and never
/// abort the body.
pub async fn with_latency<F, T>(
    injector: &dyn FaultInjector,
    targets: &[String],
    namespace: &str,
    delay_ms: u64,
    events: &EventEmitter,
    body: F,
) -> T
where
    F: Future<Output = T>,
{
    for pod in targets {
        match injector.set_latency(pod, namespace, delay_ms).await {
            Ok(()) => events.info(format!("Injected {}ms latency on pod {}", delay_ms, pod)),
            Err(e) => warn!(pod = %pod, error = %e, "Latency injection failed"),
        }
    }

    let outcome = AssertUnwindSafe(body).catch_unwind().await;

    for pod in targets {
        if let Err(e) = injector.clear_latency(pod, namespace).await {
            warn!(pod = %pod, error = %e, "Latency cleanup failed");
        }
    }

    match outcome {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
