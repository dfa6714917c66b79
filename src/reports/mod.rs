//! Session report assembly, persistence and export

mod file;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::ChaosError;
use crate::models::{RecoveryResult, SessionReport};

pub use file::FileReportStore;

/// Append-only storage of session reports.
///
/// Each report is written once under [`SessionReport::key`] and never
/// modified; `list` returns reports in key order, which is chronological.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a report and return the key it was stored under
    async fn append(&self, report: &SessionReport) -> Result<String, ChaosError>;

    async fn list(&self) -> Result<Vec<SessionReport>, ChaosError>;
}

pub fn build_report(
    session_time: DateTime<Utc>,
    namespace: impl Into<String>,
    results: Vec<RecoveryResult>,
) -> SessionReport {
    SessionReport {
        id: Uuid::new_v4(),
        session_time,
        namespace: namespace.into(),
        results,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

pub const CSV_HEADER: [&str; 8] = [
    "session_id",
    "session_time",
    "namespace",
    "killed_pod",
    "replacement_pod",
    "matched_by",
    "recovery_time_seconds",
    "status",
];

/// One row per recovery result, sessions in the order given
pub fn export_csv(reports: &[SessionReport]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for report in reports {
        let session_time = report.session_time.to_rfc3339_opts(SecondsFormat::Millis, true);
        for result in &report.results {
            wtr.write_record([
                report.id.to_string(),
                session_time.clone(),
                report.namespace.clone(),
                result.killed_pod_name.clone(),
                result.replacement_pod_name.clone().unwrap_or_default(),
                result.matched_by.map(|m| m.to_string()).unwrap_or_default(),
                result
                    .recovery_time_seconds
                    .map(|s| format!("{:.3}", s))
                    .unwrap_or_default(),
                result.status.to_string(),
            ])?;
        }
    }

    wtr.into_inner()
        .map_err(|e| std::io::Error::new(e.error().kind(), e.to_string()).into())
}
