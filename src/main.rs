use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podkiller::{
    api::AppState,
    config::{Config, ReportBackend},
    create_router,
    db::Database,
    k8s::K8sClient,
    reports::{FileReportStore, ReportStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting PodKiller");

    // Load configuration
    let config = Config::load()?;
    tracing::info!(port = config.port, store = ?config.report_store, "Configuration loaded");

    let metrics = PrometheusBuilder::new().install_recorder()?;

    let k8s = K8sClient::new(config.kubeconfig.as_deref()).await?;
    match k8s.health_check().await {
        Ok(_) => tracing::info!("Kubernetes cluster reachable"),
        Err(e) => tracing::warn!(error = %e, "Kubernetes client created but cluster unreachable"),
    }

    let store: Arc<dyn ReportStore> = match config.report_store {
        ReportBackend::Files => {
            tracing::info!(dir = %config.reports_dir, "Storing reports as files");
            Arc::new(FileReportStore::new(&config.reports_dir))
        }
        ReportBackend::Sqlite => {
            let db = Database::new(&config.database_url).await?;
            db.run_migrations().await?;
            tracing::info!("Database initialized");
            Arc::new(db)
        }
    };

    let state = AppState::new(config.clone(), Arc::new(k8s), store).with_metrics(metrics);

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
