pub mod health;
pub mod kill;
pub mod metrics;
pub mod openapi;
pub mod pods;
pub mod reports;

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::experiment::ChaosEngine;
use crate::k8s::ClusterApi;
use crate::reports::ReportStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cluster: Arc<dyn ClusterApi>,
    pub engine: Arc<ChaosEngine>,
    pub store: Arc<dyn ReportStore>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, cluster: Arc<dyn ClusterApi>, store: Arc<dyn ReportStore>) -> Self {
        let engine = ChaosEngine::from_config(&config, cluster.clone(), store.clone());
        Self {
            config,
            cluster,
            engine: Arc::new(engine),
            store,
            metrics: None,
        }
    }

    /// Replace the engine built from configuration
    pub fn with_engine(mut self, engine: ChaosEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
