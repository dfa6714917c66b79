//! Termination of target pods

use futures::future::join_all;
use tracing::{error, info};

use super::clock::Clock;
use super::events::EventEmitter;
use crate::error::ChaosError;
use crate::k8s::ClusterApi;
use crate::models::KillRecord;

#[derive(Debug)]
pub enum KillOutcome {
    Killed(KillRecord),
    Failed { pod: String, error: ChaosError },
}

/// Delete every target concurrently.
///
/// Each deletion is independent: a failure is recorded for that pod only.
/// The result keeps the order of `targets`.
pub async fn kill_targets(
    cluster: &dyn ClusterApi,
    clock: &dyn Clock,
    targets: &[String],
    namespace: &str,
    events: &EventEmitter,
) -> Vec<KillOutcome> {
    let deletions = targets.iter().map(|pod| async move {
        info!(pod = %pod, namespace, "Attempting to delete pod");
        match cluster.delete_pod(pod, namespace).await {
            Ok(()) => {
                let record = KillRecord {
                    killed_pod_name: pod.clone(),
                    namespace: namespace.to_string(),
                    deletion_time: clock.now(),
                };
                metrics::increment_counter!("podkiller_kills_total");
                events.kill(format!("Killed pod {}", pod));
                KillOutcome::Killed(record)
            }
            Err(e) => {
                error!(pod = %pod, error = %e, "Error killing pod");
                let error = ChaosError::Deletion {
                    pod: pod.clone(),
                    reason: e.to_string(),
                };
                events.error(error.to_string());
                KillOutcome::Failed {
                    pod: pod.clone(),
                    error,
                }
            }
        }
    });

    join_all(deletions).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::events::ProgressKind;
    use crate::experiment::testing::{names, FakeCluster, TestClock};

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_does_not_block_others() {
        let clock = TestClock::start();
        let cluster = FakeCluster::new(clock.clone());
        cluster.add_running("default", "a");
        cluster.add_running("default", "b");
        cluster.add_running("default", "c");
        cluster.fail_delete("b");

        let (events, mut rx) = EventEmitter::channel();
        let outcomes = kill_targets(
            &cluster,
            &*clock,
            &names(&["a", "b", "c"]),
            "default",
            &events,
        )
        .await;

        let order: Vec<&str> = outcomes
            .iter()
            .map(|o| match o {
                KillOutcome::Killed(record) => record.killed_pod_name.as_str(),
                KillOutcome::Failed { pod, .. } => pod.as_str(),
            })
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(matches!(outcomes[0], KillOutcome::Killed(_)));
        assert!(matches!(
            outcomes[1],
            KillOutcome::Failed {
                error: ChaosError::Deletion { .. },
                ..
            }
        ));
        assert!(matches!(outcomes[2], KillOutcome::Killed(_)));
        assert_eq!(cluster.deletions(), vec!["a", "c"]);

        drop(events);
        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds.iter().filter(|k| **k == ProgressKind::Kill).count(),
            2
        );
        assert_eq!(
            kinds.iter().filter(|k| **k == ProgressKind::Error).count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deletion_time_is_local_ack_instant() {
        let clock = TestClock::start();
        let cluster = FakeCluster::new(clock.clone());
        cluster.add_running("default", "a");

        tokio::time::sleep(std::time::Duration::from_secs(7)).await;
        let outcomes = kill_targets(
            &cluster,
            &*clock,
            &names(&["a"]),
            "default",
            &EventEmitter::disabled(),
        )
        .await;

        match &outcomes[0] {
            KillOutcome::Killed(record) => {
                assert_eq!(record.deletion_time, clock.at(std::time::Duration::from_secs(7)));
                assert_eq!(record.namespace, "default");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
