use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, Pool, Sqlite};

use crate::error::ChaosError;
use crate::models::SessionReport;
use crate::reports::ReportStore;

pub type DbPool = Pool<Sqlite>;

#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

#[derive(FromRow)]
struct SessionReportRow {
    data: String,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create database file if it doesn't exist
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let in_memory = db_path.contains(":memory:");
        if !in_memory {
            if let Some(parent) = std::path::Path::new(db_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            if !std::path::Path::new(db_path).exists() {
                std::fs::File::create(db_path)?;
            }
        }

        // Every connection to :memory: opens a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ==================== Session Reports ====================

    /// Insert a report; fails if its key already exists
    pub async fn insert_session_report(&self, report: &SessionReport) -> Result<String, sqlx::Error> {
        let key = report.key();
        let data = serde_json::to_string(report).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        sqlx::query(
            r#"
            INSERT INTO session_reports (key, id, session_time, namespace, data)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&key)
        .bind(report.id.to_string())
        .bind(report.session_time.to_rfc3339())
        .bind(&report.namespace)
        .bind(&data)
        .execute(&self.pool)
        .await?;

        Ok(key)
    }

    /// All reports in key order
    pub async fn list_session_reports(&self) -> Result<Vec<SessionReport>, sqlx::Error> {
        let rows: Vec<SessionReportRow> =
            sqlx::query_as("SELECT data FROM session_reports ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_str(&row.data).map_err(|e| sqlx::Error::Decode(Box::new(e)))
            })
            .collect()
    }
}

#[async_trait]
impl ReportStore for Database {
    async fn append(&self, report: &SessionReport) -> Result<String, ChaosError> {
        self.insert_session_report(report)
            .await
            .map_err(|e| ChaosError::Persistence(e.to_string()))
    }

    async fn list(&self) -> Result<Vec<SessionReport>, ChaosError> {
        self.list_session_reports()
            .await
            .map_err(|e| ChaosError::Persistence(e.to_string()))
    }
}
