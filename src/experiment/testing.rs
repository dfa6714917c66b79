//! In-memory cluster and clock for engine tests.
//!
//! `TestClock` follows tokio's clock, so under `start_paused = true` every
//! poll interval advances wall-clock time exactly as the engine observes it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::clock::Clock;
use crate::error::ClusterError;
use crate::k8s::{ClusterApi, ExecOutput};
use crate::models::{PodPhase, PodRef};

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub struct TestClock {
    base: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl TestClock {
    pub fn start() -> Arc<Self> {
        Arc::new(Self {
            base: "2025-03-01T12:00:00Z".parse().expect("valid timestamp"),
            origin: tokio::time::Instant::now(),
        })
    }

    pub fn at(&self, offset: Duration) -> DateTime<Utc> {
        self.base + chrono::Duration::from_std(offset).expect("offset in range")
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        self.at(tokio::time::Instant::now() - self.origin)
    }
}

#[derive(Debug, Clone)]
struct FakePod {
    name: String,
    namespace: String,
    created: DateTime<Utc>,
    /// Phase before `ready_at`; after it the pod is Running with ready containers
    phase: PodPhase,
    containers: usize,
    ready_at: Option<DateTime<Utc>>,
    deleted: bool,
}

impl FakePod {
    fn snapshot(&self, now: DateTime<Utc>) -> PodRef {
        let ready = self.ready_at.is_some_and(|at| now >= at);
        let phase = if self.deleted {
            PodPhase::Terminating
        } else if ready {
            PodPhase::Running
        } else {
            self.phase
        };
        PodRef {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            creation_timestamp: Some(self.created),
            phase,
            container_ready: vec![ready && !self.deleted; self.containers],
            marked_for_deletion: self.deleted,
        }
    }
}

/// A pod the fake controller creates after a kill
#[derive(Debug, Clone)]
pub struct ScriptedReplacement {
    pub name: String,
    pub appears_after: Duration,
    /// `None` keeps the pod Pending forever
    pub ready_after: Option<Duration>,
}

#[derive(Default)]
struct State {
    namespaces: Vec<String>,
    pods: Vec<FakePod>,
    scripts: Vec<(String, ScriptedReplacement)>,
    failing_deletes: HashSet<String>,
    failing_lists: usize,
    failing_execs: Vec<(String, String)>,
    deletions: Vec<String>,
    execs: Vec<(String, Vec<String>)>,
}

pub struct FakeCluster {
    clock: Arc<TestClock>,
    state: Mutex<State>,
}

impl FakeCluster {
    pub fn new(clock: Arc<TestClock>) -> Self {
        Self {
            clock,
            state: Mutex::new(State::default()),
        }
    }

    pub fn add_namespace(&self, namespace: &str) {
        let mut state = self.state.lock().unwrap();
        if !state.namespaces.iter().any(|ns| ns == namespace) {
            state.namespaces.push(namespace.to_string());
        }
    }

    /// A long-lived Running pod with one ready container
    pub fn add_running(&self, namespace: &str, name: &str) {
        let created = self.clock.now() - chrono::Duration::hours(1);
        self.insert(namespace, name, created, PodPhase::Running, 1, Some(created));
    }

    /// A pod stuck in `phase`; containers ready only if every flag is true
    pub fn add_pod(&self, namespace: &str, name: &str, phase: PodPhase, ready: Vec<bool>) {
        let created = self.clock.now() - chrono::Duration::minutes(10);
        let ready_at = (phase == PodPhase::Running && ready.iter().all(|r| *r)).then_some(created);
        self.insert(namespace, name, created, phase, ready.len(), ready_at);
    }

    fn insert(
        &self,
        namespace: &str,
        name: &str,
        created: DateTime<Utc>,
        phase: PodPhase,
        containers: usize,
        ready_at: Option<DateTime<Utc>>,
    ) {
        self.add_namespace(namespace);
        self.state.lock().unwrap().pods.push(FakePod {
            name: name.to_string(),
            namespace: namespace.to_string(),
            created,
            phase,
            containers,
            ready_at,
            deleted: false,
        });
    }

    /// When `killed` is deleted, create `replacement` in the same namespace
    pub fn on_delete(&self, killed: &str, replacement: ScriptedReplacement) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .push((killed.to_string(), replacement));
    }

    pub fn fail_delete(&self, name: &str) {
        self.state.lock().unwrap().failing_deletes.insert(name.to_string());
    }

    /// Make the next `count` list calls return an error
    pub fn fail_next_lists(&self, count: usize) {
        self.state.lock().unwrap().failing_lists = count;
    }

    /// Make exec in `pod` exit unsuccessfully with `stderr`
    pub fn fail_exec(&self, pod: &str, stderr: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_execs
            .push((pod.to_string(), stderr.to_string()));
    }

    pub fn deletions(&self) -> Vec<String> {
        self.state.lock().unwrap().deletions.clone()
    }

    pub fn execs(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().unwrap().execs.clone()
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRef>, ClusterError> {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        if state.failing_lists > 0 {
            state.failing_lists -= 1;
            return Err(ClusterError::Exec("injected list failure".to_string()));
        }
        Ok(state
            .pods
            .iter()
            .filter(|p| p.namespace == namespace && p.created <= now)
            .map(|p| p.snapshot(now))
            .collect())
    }

    async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), ClusterError> {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        if state.failing_deletes.contains(name) {
            return Err(ClusterError::Exec(format!("refusing to delete {}", name)));
        }

        let pod = state
            .pods
            .iter_mut()
            .find(|p| p.name == name && p.namespace == namespace && !p.deleted)
            .ok_or_else(|| ClusterError::NotFound {
                kind: "Pod",
                name: name.to_string(),
            })?;
        pod.deleted = true;
        state.deletions.push(name.to_string());

        let scripted: Vec<ScriptedReplacement> = state
            .scripts
            .iter()
            .filter(|(killed, _)| killed == name)
            .map(|(_, r)| r.clone())
            .collect();
        for replacement in scripted {
            let created = now + chrono::Duration::from_std(replacement.appears_after).unwrap();
            let ready_at = replacement
                .ready_after
                .map(|d| now + chrono::Duration::from_std(d).unwrap());
            state.pods.push(FakePod {
                name: replacement.name,
                namespace: namespace.to_string(),
                created,
                phase: PodPhase::Pending,
                containers: 1,
                ready_at,
                deleted: false,
            });
        }
        Ok(())
    }

    async fn get_pod(&self, name: &str, namespace: &str) -> Result<PodRef, ClusterError> {
        let now = self.clock.now();
        let state = self.state.lock().unwrap();
        state
            .pods
            .iter()
            .rev()
            .find(|p| p.name == name && p.namespace == namespace && p.created <= now)
            .map(|p| p.snapshot(now))
            .ok_or_else(|| ClusterError::NotFound {
                kind: "Pod",
                name: name.to_string(),
            })
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        Ok(self.state.lock().unwrap().namespaces.clone())
    }

    async fn exec(
        &self,
        pod: &str,
        _namespace: &str,
        command: Vec<String>,
    ) -> Result<ExecOutput, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.execs.push((pod.to_string(), command));
        match state.failing_execs.iter().find(|(name, _)| name == pod) {
            Some((_, stderr)) => Ok(ExecOutput {
                stderr: stderr.clone(),
                ..Default::default()
            }),
            None => Ok(ExecOutput {
                success: true,
                ..Default::default()
            }),
        }
    }
}
