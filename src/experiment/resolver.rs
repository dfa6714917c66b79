//! Replacement resolution
//!
//! Maps a killed pod to the pod the controller created in its place. Two
//! heuristics, in order:
//!
//! 1. Pending: an alive, unclaimed pod still in `Pending`. First in list order.
//! 2. Recency: an alive, unclaimed pod created within 5s before to 60s after
//!    the deletion instant. Newest wins.
//!
//! Claims are session scoped. The resolver only reads the claim set; the
//! session claims the accepted name before resolving the next killed pod.

use std::collections::HashSet;

use chrono::Duration;
use tracing::{debug, info, warn};

use super::events::EventEmitter;
use super::PollSettings;
use crate::k8s::ClusterApi;
use crate::models::{KillRecord, MatchedBy, PodPhase, PodRef, ReplacementCandidate};

/// Tolerated clock skew between this process and the API server, in seconds
pub const PRE_KILL_SKEW_SECS: i64 = 5;

/// How long after a kill a newly created pod still counts as its replacement
pub const POST_KILL_WINDOW_SECS: i64 = 60;

/// Replacement names already attributed within one session
#[derive(Debug, Default)]
pub struct ClaimedReplacements {
    names: HashSet<String>,
}

impl ClaimedReplacements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Insert-if-absent. Returns false when the name was already claimed.
    pub fn claim(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }
}

/// Apply both heuristics to one pod listing
pub fn pick_replacement(
    pods: &[PodRef],
    kill: &KillRecord,
    claimed: &ClaimedReplacements,
) -> Option<ReplacementCandidate> {
    let eligible = || {
        pods.iter()
            .filter(|p| p.is_alive())
            .filter(|p| !claimed.contains(&p.name))
    };

    if let Some(pod) = eligible().find(|p| p.phase == PodPhase::Pending) {
        return Some(ReplacementCandidate {
            replacement_pod_name: pod.name.clone(),
            matched_by: MatchedBy::PendingHeuristic,
        });
    }

    let earliest = kill.deletion_time - Duration::seconds(PRE_KILL_SKEW_SECS);
    let latest = kill.deletion_time + Duration::seconds(POST_KILL_WINDOW_SECS);

    eligible()
        .filter_map(|p| p.creation_timestamp.map(|created| (p, created)))
        .filter(|(_, created)| *created >= earliest && *created <= latest)
        .max_by_key(|(_, created)| *created)
        .map(|(pod, _)| ReplacementCandidate {
            replacement_pod_name: pod.name.clone(),
            matched_by: MatchedBy::RecencyHeuristic,
        })
}

/// Poll the namespace until a replacement for `kill` shows up.
///
/// Returns `None` once the attempts are exhausted. List failures count as an
/// attempt and are retried.
pub async fn resolve_replacement(
    cluster: &dyn ClusterApi,
    kill: &KillRecord,
    claimed: &ClaimedReplacements,
    polling: PollSettings,
    events: &EventEmitter,
) -> Option<ReplacementCandidate> {
    for attempt in 1..=polling.attempts {
        match cluster.list_pods(&kill.namespace).await {
            Ok(pods) => {
                if let Some(candidate) = pick_replacement(&pods, kill, claimed) {
                    info!(
                        killed = %kill.killed_pod_name,
                        replacement = %candidate.replacement_pod_name,
                        matched_by = %candidate.matched_by,
                        attempt,
                        "Found replacement pod"
                    );
                    return Some(candidate);
                }
                debug!(killed = %kill.killed_pod_name, attempt, "No replacement yet");
            }
            Err(e) => {
                warn!(killed = %kill.killed_pod_name, attempt, error = %e, "Error checking for replacement pod");
            }
        }

        if attempt < polling.attempts {
            tokio::time::sleep(polling.interval).await;
        }
    }

    warn!(
        killed = %kill.killed_pod_name,
        attempts = polling.attempts,
        waited = ?polling.budget(),
        "No replacement pod found"
    );
    events.info(format!(
        "No replacement pod found for {} after {} attempts",
        kill.killed_pod_name, polling.attempts
    ));
    None
}
