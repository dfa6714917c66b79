//! Target selection: which namespace, which pods

use std::collections::HashSet;

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::error::ChaosError;
use crate::k8s::ClusterApi;
use crate::models::PodPhase;

/// Pick the namespace a session operates in.
///
/// An explicit request wins. Otherwise the first non-excluded namespace that
/// currently holds pods is used.
pub async fn resolve_namespace(
    cluster: &dyn ClusterApi,
    requested: Option<&str>,
    excluded: &[String],
) -> Result<String, ChaosError> {
    if let Some(ns) = requested.filter(|ns| !ns.is_empty()) {
        info!(namespace = ns, "Using requested namespace");
        return Ok(ns.to_string());
    }

    let candidates: Vec<String> = cluster
        .list_namespaces()
        .await?
        .into_iter()
        .filter(|ns| !excluded.contains(ns))
        .collect();
    debug!(?candidates, "Auto-detecting namespace");

    for ns in candidates {
        match cluster.list_pods(&ns).await {
            Ok(pods) if !pods.is_empty() => {
                info!(namespace = %ns, "Auto-detected namespace with pods");
                return Ok(ns);
            }
            Ok(_) => {}
            Err(e) => warn!(namespace = %ns, error = %e, "Skipping namespace"),
        }
    }

    Err(ChaosError::NoTargets {
        namespace: "<any>".to_string(),
    })
}

/// Choose the pods to kill.
///
/// Explicit names are validated all-or-nothing against the current pod list;
/// with no names, one running pod is picked uniformly at random.
pub async fn select_targets(
    cluster: &dyn ClusterApi,
    namespace: &str,
    explicit: &[String],
) -> Result<Vec<String>, ChaosError> {
    let pods = cluster.list_pods(namespace).await?;

    if !explicit.is_empty() {
        let existing: HashSet<&str> = pods.iter().map(|p| p.name.as_str()).collect();

        let mut seen = HashSet::new();
        let targets: Vec<String> = explicit
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();

        let missing: Vec<String> = targets
            .iter()
            .filter(|name| !existing.contains(name.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            warn!(namespace, ?missing, "Rejecting kill request");
            return Err(ChaosError::Validation {
                namespace: namespace.to_string(),
                missing,
            });
        }
        return Ok(targets);
    }

    let running: Vec<&str> = pods
        .iter()
        .filter(|p| p.is_alive() && p.phase == PodPhase::Running)
        .map(|p| p.name.as_str())
        .collect();

    let picked = {
        let mut rng = rand::thread_rng();
        running.choose(&mut rng).map(|name| name.to_string())
    };

    match picked {
        Some(name) => {
            info!(namespace, pod = %name, candidates = running.len(), "Picked random target");
            Ok(vec![name])
        }
        None => Err(ChaosError::NoTargets {
            namespace: namespace.to_string(),
        }),
    }
}
