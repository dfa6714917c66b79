use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// A pod whose deletion the cluster acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillRecord {
    pub killed_pod_name: String,
    pub namespace: String,
    /// Local wall-clock instant taken right after the delete call returned
    pub deletion_time: DateTime<Utc>,
}

/// Which heuristic attributed a replacement to a killed pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchedBy {
    PendingHeuristic,
    RecencyHeuristic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementCandidate {
    pub replacement_pod_name: String,
    pub matched_by: MatchedBy,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecoveryStatus {
    Recovered,
    NoReplacementFound,
    Timeout,
    DeletionFailed,
}

/// Outcome for one targeted pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryResult {
    pub killed_pod_name: String,
    pub replacement_pod_name: Option<String>,
    #[serde(default)]
    pub matched_by: Option<MatchedBy>,
    pub recovery_time_seconds: Option<f64>,
    pub status: RecoveryStatus,
}

impl RecoveryResult {
    pub fn recovered(killed: &str, candidate: &ReplacementCandidate, seconds: f64) -> Self {
        Self {
            killed_pod_name: killed.to_string(),
            replacement_pod_name: Some(candidate.replacement_pod_name.clone()),
            matched_by: Some(candidate.matched_by),
            recovery_time_seconds: Some(seconds.max(0.0)),
            status: RecoveryStatus::Recovered,
        }
    }

    pub fn timed_out(killed: &str, candidate: &ReplacementCandidate) -> Self {
        Self {
            killed_pod_name: killed.to_string(),
            replacement_pod_name: Some(candidate.replacement_pod_name.clone()),
            matched_by: Some(candidate.matched_by),
            recovery_time_seconds: None,
            status: RecoveryStatus::Timeout,
        }
    }

    pub fn no_replacement(killed: &str) -> Self {
        Self::without_replacement(killed, RecoveryStatus::NoReplacementFound)
    }

    pub fn deletion_failed(killed: &str) -> Self {
        Self::without_replacement(killed, RecoveryStatus::DeletionFailed)
    }

    fn without_replacement(killed: &str, status: RecoveryStatus) -> Self {
        Self {
            killed_pod_name: killed.to_string(),
            replacement_pod_name: None,
            matched_by: None,
            recovery_time_seconds: None,
            status,
        }
    }
}

/// One report per kill invocation, never mutated once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub id: Uuid,
    pub session_time: DateTime<Utc>,
    pub namespace: String,
    pub results: Vec<RecoveryResult>,
}

impl SessionReport {
    /// Sortable storage key: timestamp first, id suffix for uniqueness
    pub fn key(&self) -> String {
        let stamp = self
            .session_time
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let id = self.id.simple().to_string();
        format!("chaos-report-{}-{}", stamp, &id[..8])
    }

    pub fn recovered_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == RecoveryStatus::Recovered)
            .count()
    }

    /// Check the invariants every engine-built report holds.
    ///
    /// Each killed pod appears once, no replacement is attributed twice, and
    /// the nullable fields agree with the status.
    pub fn validate(&self) -> Result<(), String> {
        let mut killed = HashSet::new();
        let mut replacements = HashSet::new();

        for result in &self.results {
            let pod = &result.killed_pod_name;
            if !killed.insert(pod.as_str()) {
                return Err(format!("Pod '{}' appears in more than one result", pod));
            }
            if let Some(replacement) = &result.replacement_pod_name {
                if !replacements.insert(replacement.as_str()) {
                    return Err(format!(
                        "Replacement '{}' is attributed to more than one pod",
                        replacement
                    ));
                }
            }
            if let Some(seconds) = result.recovery_time_seconds {
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(format!("Invalid recovery time {} for pod '{}'", seconds, pod));
                }
            }

            let has_replacement = result.replacement_pod_name.is_some();
            let has_recovery = result.recovery_time_seconds.is_some();
            let consistent = match result.status {
                RecoveryStatus::Recovered => has_replacement && has_recovery,
                RecoveryStatus::Timeout => has_replacement && !has_recovery,
                RecoveryStatus::NoReplacementFound | RecoveryStatus::DeletionFailed => {
                    !has_replacement && !has_recovery && result.matched_by.is_none()
                }
            };
            if !consistent {
                return Err(format!(
                    "Result for pod '{}' does not match status {}",
                    pod, result.status
                ));
            }
        }

        Ok(())
    }
}
