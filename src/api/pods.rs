//! Namespace and pod listing for the dashboard

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::AppState;
use crate::error::AppResult;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NamespaceInfo {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NamespacesResponse {
    pub namespaces: Vec<NamespaceInfo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PodSummary {
    pub name: String,
    /// Pod phase, or `Terminating` once the pod is marked for deletion
    pub status: String,
    pub namespace: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PodsResponse {
    pub pods: Vec<PodSummary>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PodsQuery {
    /// Defaults to `default`
    pub namespace: Option<String>,
}

/// List namespaces that may hold kill targets
#[utoipa::path(
    get,
    path = "/api/namespaces",
    tag = "pods",
    responses(
        (status = 200, description = "Namespaces without system namespaces", body = NamespacesResponse),
    )
)]
pub async fn list_namespaces(State(state): State<AppState>) -> Json<NamespacesResponse> {
    let excluded = state.engine.excluded_namespaces();
    let names = match state.cluster.list_namespaces().await {
        Ok(names) => names
            .into_iter()
            .filter(|ns| !excluded.contains(ns))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Error getting namespaces, falling back to default");
            vec!["default".to_string()]
        }
    };

    Json(NamespacesResponse {
        namespaces: names.into_iter().map(|name| NamespaceInfo { name }).collect(),
    })
}

/// List pods in a namespace
#[utoipa::path(
    get,
    path = "/api/pods",
    tag = "pods",
    params(PodsQuery),
    responses(
        (status = 200, description = "Pods in the namespace", body = PodsResponse),
        (status = 502, description = "Kubernetes API error"),
    )
)]
pub async fn list_pods(
    State(state): State<AppState>,
    Query(query): Query<PodsQuery>,
) -> AppResult<Json<PodsResponse>> {
    let namespace = query.namespace.unwrap_or_else(|| "default".to_string());
    pods_in(&state, &namespace).await
}

/// Path form of [`list_pods`]
pub async fn list_pods_in_namespace(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> AppResult<Json<PodsResponse>> {
    pods_in(&state, &namespace).await
}

async fn pods_in(state: &AppState, namespace: &str) -> AppResult<Json<PodsResponse>> {
    let pods = state.cluster.list_pods(namespace).await?;

    Ok(Json(PodsResponse {
        pods: pods
            .into_iter()
            .map(|pod| PodSummary {
                status: pod.phase.to_string(),
                name: pod.name,
                namespace: pod.namespace,
            })
            .collect(),
    }))
}
