use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::experiment::PollSettings;

/// Where session reports are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportBackend {
    /// One JSON document per session in `reports_dir`
    Files,
    /// `session_reports` table in the service database
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default)]
    pub kubeconfig: Option<String>,

    /// Namespace used when a request names none; `None` means auto-detect
    #[serde(default)]
    pub default_namespace: Option<String>,

    /// Comma separated namespaces never offered as kill targets
    #[serde(default = "default_excluded_namespaces")]
    pub excluded_namespaces: String,

    #[serde(default = "default_report_store")]
    pub report_store: ReportBackend,

    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,

    #[serde(default = "default_discovery_attempts")]
    pub discovery_attempts: u32,

    #[serde(default = "default_interval_ms")]
    pub discovery_interval_ms: u64,

    #[serde(default = "default_readiness_attempts")]
    pub readiness_attempts: u32,

    #[serde(default = "default_interval_ms")]
    pub readiness_interval_ms: u64,

    /// Interface the netem delay rule is attached to inside target pods
    #[serde(default = "default_network_interface")]
    pub network_interface: String,
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite://podkiller.db".to_string()
}

fn default_excluded_namespaces() -> String {
    "kube-system,kube-public,kube-node-lease".to_string()
}

fn default_report_store() -> ReportBackend {
    ReportBackend::Files
}

fn default_reports_dir() -> String {
    "./reports".to_string()
}

fn default_discovery_attempts() -> u32 {
    30
}

fn default_readiness_attempts() -> u32 {
    60
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_network_interface() -> String {
    "eth0".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_environment(config::Environment::default())
    }

    /// Unset variables fall back to field defaults; a malformed one is an error
    fn from_environment(env: config::Environment) -> Result<Self> {
        let settings: Config = config::Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    pub fn excluded_namespaces(&self) -> Vec<String> {
        self.excluded_namespaces
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn discovery_polling(&self) -> PollSettings {
        PollSettings::new(
            self.discovery_attempts,
            Duration::from_millis(self.discovery_interval_ms),
        )
    }

    pub fn readiness_polling(&self) -> PollSettings {
        PollSettings::new(
            self.readiness_attempts,
            Duration::from_millis(self.readiness_interval_ms),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_url: default_database_url(),
            kubeconfig: None,
            default_namespace: None,
            excluded_namespaces: default_excluded_namespaces(),
            report_store: default_report_store(),
            reports_dir: default_reports_dir(),
            discovery_attempts: default_discovery_attempts(),
            discovery_interval_ms: default_interval_ms(),
            readiness_attempts: default_readiness_attempts(),
            readiness_interval_ms: default_interval_ms(),
            network_interface: default_network_interface(),
        }
    }
}
