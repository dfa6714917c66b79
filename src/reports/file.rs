use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::ReportStore;
use crate::error::ChaosError;
use crate::models::SessionReport;

/// One JSON document per session in a directory
#[derive(Debug, Clone)]
pub struct FileReportStore {
    dir: PathBuf,
}

impl FileReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

fn persistence(e: impl std::fmt::Display) -> ChaosError {
    ChaosError::Persistence(e.to_string())
}

#[async_trait]
impl ReportStore for FileReportStore {
    async fn append(&self, report: &SessionReport) -> Result<String, ChaosError> {
        fs::create_dir_all(&self.dir).await.map_err(persistence)?;

        let key = report.key();
        let path = self.dir.join(format!("{}.json", key));
        let body = serde_json::to_vec_pretty(report).map_err(persistence)?;

        // create_new: an existing document is never overwritten
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(persistence)?;
        file.write_all(&body).await.map_err(persistence)?;
        file.flush().await.map_err(persistence)?;

        info!(path = %path.display(), "Report saved");
        Ok(key)
    }

    async fn list(&self) -> Result<Vec<SessionReport>, ChaosError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence(e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(persistence)? {
            let path = entry.path();
            let is_report = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("chaos-report-") && n.ends_with(".json"));
            if is_report {
                paths.push(path);
            }
        }
        paths.sort();

        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = match fs::read(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable report");
                    continue;
                }
            };
            match serde_json::from_slice::<SessionReport>(&raw) {
                Ok(report) => reports.push(report),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping malformed report"),
            }
        }

        debug!(count = reports.len(), dir = %self.dir.display(), "Loaded reports");
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecoveryResult;
    use crate::reports::build_report;
    use chrono::{DateTime, Utc};

    fn temp_store() -> FileReportStore {
        FileReportStore::new(std::env::temp_dir().join(format!("podkiller-test-{}", uuid::Uuid::new_v4())))
    }

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().unwrap()
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let store = temp_store();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_then_list_in_key_order() {
        let store = temp_store();
        let later = build_report(at("2025-03-01T11:00:00Z"), "default", vec![]);
        let earlier = build_report(
            at("2025-03-01T10:00:00Z"),
            "default",
            vec![RecoveryResult::no_replacement("p1")],
        );

        let later_key = store.append(&later).await.unwrap();
        let earlier_key = store.append(&earlier).await.unwrap();
        assert!(earlier_key < later_key);
        assert!(store.dir().join(format!("{}.json", later_key)).exists());

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![earlier, later]);

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[tokio::test]
    async fn test_same_instant_sessions_do_not_collide() {
        let store = temp_store();
        let now = at("2025-03-01T10:00:00Z");
        store.append(&build_report(now, "default", vec![])).await.unwrap();
        store.append(&build_report(now, "default", vec![])).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[tokio::test]
    async fn test_malformed_reports_are_skipped() {
        let store = temp_store();
        store
            .append(&build_report(at("2025-03-01T10:00:00Z"), "default", vec![]))
            .await
            .unwrap();
        std::fs::write(store.dir().join("chaos-report-broken.json"), b"{not json").unwrap();
        std::fs::write(store.dir().join("notes.txt"), b"ignored").unwrap();

        assert_eq!(store.list().await.unwrap().len(), 1);

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[tokio::test]
    async fn test_existing_document_is_never_overwritten() {
        let store = temp_store();
        let report = build_report(at("2025-03-01T10:00:00Z"), "default", vec![]);
        store.append(&report).await.unwrap();

        let err = store.append(&report).await.unwrap_err();
        assert!(matches!(err, ChaosError::Persistence(_)));

        std::fs::remove_dir_all(store.dir()).ok();
    }
}
