//! Session orchestration: select, kill, resolve, measure, report

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use super::clock::{Clock, SystemClock};
use super::events::EventEmitter;
use super::executor::{kill_targets, KillOutcome};
use super::readiness::wait_for_ready;
use super::resolver::{resolve_replacement, ClaimedReplacements};
use super::selector::{resolve_namespace, select_targets};
use super::PollSettings;
use crate::chaos::{with_latency, FaultInjector, NetemInjector};
use crate::config::Config;
use crate::error::ChaosError;
use crate::k8s::ClusterApi;
use crate::models::{KillRecord, RecoveryResult, SessionReport};
use crate::reports::{build_report, ReportStore};

/// Body of a kill invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct KillRequest {
    /// Target namespace; auto-detected when absent
    pub namespace: Option<String>,
    /// Explicit targets; one random running pod when empty
    pub pod_names: Vec<String>,
    /// Network delay applied to the targets for the duration of the session
    pub latency_ms: Option<u64>,
}

/// Runs kill sessions against one cluster
pub struct ChaosEngine {
    cluster: Arc<dyn ClusterApi>,
    injector: Option<Arc<dyn FaultInjector>>,
    store: Arc<dyn ReportStore>,
    clock: Arc<dyn Clock>,
    discovery: PollSettings,
    readiness: PollSettings,
    default_namespace: Option<String>,
    excluded_namespaces: Vec<String>,
}

impl ChaosEngine {
    pub fn new(cluster: Arc<dyn ClusterApi>, store: Arc<dyn ReportStore>) -> Self {
        Self {
            cluster,
            injector: None,
            store,
            clock: Arc::new(SystemClock),
            discovery: PollSettings::discovery(),
            readiness: PollSettings::readiness(),
            default_namespace: None,
            excluded_namespaces: Vec::new(),
        }
    }

    /// Engine wired from service configuration, with netem latency support
    pub fn from_config(
        config: &Config,
        cluster: Arc<dyn ClusterApi>,
        store: Arc<dyn ReportStore>,
    ) -> Self {
        let injector = NetemInjector::new(cluster.clone(), config.network_interface.clone());
        Self::new(cluster, store)
            .with_injector(Arc::new(injector))
            .with_polling(config.discovery_polling(), config.readiness_polling())
            .with_default_namespace(config.default_namespace.clone())
            .with_excluded_namespaces(config.excluded_namespaces())
    }

    pub fn with_injector(mut self, injector: Arc<dyn FaultInjector>) -> Self {
        self.injector = Some(injector);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_polling(mut self, discovery: PollSettings, readiness: PollSettings) -> Self {
        self.discovery = discovery;
        self.readiness = readiness;
        self
    }

    pub fn with_default_namespace(mut self, namespace: Option<String>) -> Self {
        self.default_namespace = namespace;
        self
    }

    pub fn with_excluded_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.excluded_namespaces = namespaces;
        self
    }

    pub fn excluded_namespaces(&self) -> &[String] {
        &self.excluded_namespaces
    }

    /// Run one kill session to completion.
    ///
    /// Exactly one `done` event is emitted, after the report is built and
    /// before it is persisted. A persistence failure is logged and does not
    /// fail the session.
    #[instrument(skip_all, fields(namespace = ?request.namespace, targets = request.pod_names.len()))]
    pub async fn run(
        &self,
        request: KillRequest,
        events: &EventEmitter,
    ) -> Result<SessionReport, ChaosError> {
        let report = match self.execute(&request, events).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Kill session aborted");
                events.error(e.to_string());
                events.done("Chaos session aborted");
                return Err(e);
            }
        };

        events.success(format!(
            "Chaos completed: {}/{} pods recovered",
            report.recovered_count(),
            report.results.len()
        ));
        events.done("Chaos session finished");

        match self.store.append(&report).await {
            Ok(key) => info!(key = %key, "Session report persisted"),
            Err(e) => error!(error = %e, id = %report.id, "Failed to persist session report"),
        }

        Ok(report)
    }

    async fn execute(
        &self,
        request: &KillRequest,
        events: &EventEmitter,
    ) -> Result<SessionReport, ChaosError> {
        let requested = request
            .namespace
            .as_deref()
            .or(self.default_namespace.as_deref());
        let namespace =
            resolve_namespace(self.cluster.as_ref(), requested, &self.excluded_namespaces).await?;
        events.info(format!("Using namespace {}", namespace));

        let targets = select_targets(self.cluster.as_ref(), &namespace, &request.pod_names).await?;
        events.info(format!(
            "Targeting {} pod(s): {}",
            targets.len(),
            targets.join(", ")
        ));

        let session_time = self.clock.now();
        let recover = self.kill_and_recover(&targets, &namespace, events);

        let results = match (request.latency_ms, &self.injector) {
            (Some(delay_ms), Some(injector)) if delay_ms > 0 => {
                with_latency(injector.as_ref(), &targets, &namespace, delay_ms, events, recover).await
            }
            (Some(delay_ms), None) if delay_ms > 0 => {
                warn!(delay_ms, "Latency requested but no fault injector configured");
                recover.await
            }
            _ => recover.await,
        };

        Ok(build_report(session_time, namespace, results))
    }

    async fn kill_and_recover(
        &self,
        targets: &[String],
        namespace: &str,
        events: &EventEmitter,
    ) -> Vec<RecoveryResult> {
        let outcomes = kill_targets(
            self.cluster.as_ref(),
            self.clock.as_ref(),
            targets,
            namespace,
            events,
        )
        .await;

        // Sequential: each accepted replacement is claimed before the next
        // killed pod is resolved
        let mut claimed = ClaimedReplacements::new();
        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let result = match outcome {
                KillOutcome::Killed(record) => self.recover(&record, &mut claimed, events).await,
                KillOutcome::Failed { pod, .. } => RecoveryResult::deletion_failed(&pod),
            };
            metrics::increment_counter!("podkiller_results_total", "status" => result.status.to_string());
            results.push(result);
        }
        results
    }

    async fn recover(
        &self,
        kill: &KillRecord,
        claimed: &mut ClaimedReplacements,
        events: &EventEmitter,
    ) -> RecoveryResult {
        let killed = kill.killed_pod_name.as_str();
        events.info(format!("Looking for replacement of {}", killed));

        let candidate =
            match resolve_replacement(self.cluster.as_ref(), kill, claimed, self.discovery, events)
                .await
            {
                Some(candidate) => candidate,
                None => return RecoveryResult::no_replacement(killed),
            };

        if !claimed.claim(&candidate.replacement_pod_name) {
            warn!(replacement = %candidate.replacement_pod_name, "Replacement already claimed");
            return RecoveryResult::no_replacement(killed);
        }
        events.replacement(format!(
            "Replacement pod for {}: {}",
            killed, candidate.replacement_pod_name
        ));

        match wait_for_ready(
            self.cluster.as_ref(),
            self.clock.as_ref(),
            &kill.namespace,
            &candidate.replacement_pod_name,
            self.readiness,
            events,
        )
        .await
        {
            Some(seconds) => {
                metrics::histogram!("podkiller_recovery_seconds", seconds);
                events.recovery(format!(
                    "Pod {} recovered in {:.2}s",
                    candidate.replacement_pod_name, seconds
                ));
                RecoveryResult::recovered(killed, &candidate, seconds)
            }
            None => {
                events.info(format!(
                    "Timeout waiting for pod {} to be ready",
                    candidate.replacement_pod_name
                ));
                RecoveryResult::timed_out(killed, &candidate)
            }
        }
    }
}
