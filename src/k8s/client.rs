//! Kubernetes client wrapper for PodKiller

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::{
    api::{Api, AttachParams, DeleteParams, ListParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument};

use super::cluster::{ClusterApi, ExecOutput};
use crate::error::ClusterError;
use crate::models::PodRef;

/// Wrapper around kube::Client implementing [`ClusterApi`]
#[derive(Clone)]
pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    /// Create a new K8sClient from an explicit kubeconfig path, or the
    /// default kubeconfig / in-cluster config when none is given
    #[instrument(skip_all)]
    pub async fn new(kubeconfig: Option<&str>) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                let kc = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kc, &KubeConfigOptions::default()).await?
            }
            None => Config::infer().await?,
        };
        let client = Client::try_from(config)?;

        info!("Connected to Kubernetes cluster");

        Ok(Self { client })
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Check if cluster is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let version = self.client.apiserver_version().await?;
        info!(version = %version.git_version, "Kubernetes cluster is healthy");
        Ok(true)
    }
}

#[async_trait]
impl ClusterApi for K8sClient {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRef>, ClusterError> {
        let list = self.pods(namespace).list(&ListParams::default()).await?;
        Ok(list.items.iter().map(PodRef::from).collect())
    }

    #[instrument(skip(self))]
    async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), ClusterError> {
        match self.pods(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => {
                info!(name, namespace, "Deleted pod");
                Ok(())
            }
            Err(kube::Error::Api(e)) if e.code == 404 => Err(ClusterError::NotFound {
                kind: "Pod",
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_pod(&self, name: &str, namespace: &str) -> Result<PodRef, ClusterError> {
        match self.pods(namespace).get_opt(name).await? {
            Some(pod) => Ok(PodRef::from(&pod)),
            None => Err(ClusterError::NotFound {
                kind: "Pod",
                name: name.to_string(),
            }),
        }
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces.list(&ListParams::default()).await?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    #[instrument(skip(self, command), fields(command = %command.join(" ")))]
    async fn exec(
        &self,
        pod: &str,
        namespace: &str,
        command: Vec<String>,
    ) -> Result<ExecOutput, ClusterError> {
        let ap = AttachParams::default().stdout(true).stderr(true);

        let mut attached = match self.pods(namespace).exec(pod, command, &ap).await {
            Ok(attached) => attached,
            Err(kube::Error::Api(e)) if e.code == 404 => {
                return Err(ClusterError::NotFound {
                    kind: "Pod",
                    name: pod.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let mut output = ExecOutput::default();
        if let Some(mut stdout) = attached.stdout() {
            stdout
                .read_to_string(&mut output.stdout)
                .await
                .map_err(|e| ClusterError::Exec(e.to_string()))?;
        }
        if let Some(mut stderr) = attached.stderr() {
            stderr
                .read_to_string(&mut output.stderr)
                .await
                .map_err(|e| ClusterError::Exec(e.to_string()))?;
        }

        let status = match attached.take_status() {
            Some(status) => status.await,
            None => None,
        };
        output.success = status.and_then(|s| s.status).as_deref() == Some("Success");

        attached
            .join()
            .await
            .map_err(|e| ClusterError::Exec(e.to_string()))?;

        debug!(pod, success = output.success, "Exec finished");
        Ok(output)
    }
}
