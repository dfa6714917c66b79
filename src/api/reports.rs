//! Reports API
//!
//! List stored session reports, store one, and export them

use std::str::FromStr;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::models::SessionReport;
use crate::reports::{export_csv, ExportFormat};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportsResponse {
    pub reports: Vec<SessionReport>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportSavedResponse {
    pub message: String,
    /// Storage key of the saved report
    pub filename: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `csv` or `pdf`
    pub format: Option<String>,
}

/// List stored session reports, oldest first
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "reports",
    responses(
        (status = 200, description = "All stored reports", body = ReportsResponse),
        (status = 500, description = "Failed to load reports"),
    )
)]
pub async fn list_reports(State(state): State<AppState>) -> AppResult<Json<ReportsResponse>> {
    let reports = state.store.list().await?;
    Ok(Json(ReportsResponse { reports }))
}

/// Store a session report
#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "reports",
    request_body = SessionReport,
    responses(
        (status = 201, description = "Report saved", body = ReportSavedResponse),
        (status = 400, description = "Report violates session invariants"),
        (status = 500, description = "Failed to save report"),
    )
)]
pub async fn create_report(
    State(state): State<AppState>,
    Json(report): Json<SessionReport>,
) -> AppResult<(StatusCode, Json<ReportSavedResponse>)> {
    report
        .validate()
        .map_err(|reason| AppError::bad_request(&reason))?;

    let key = state.store.append(&report).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReportSavedResponse {
            message: "Report saved".to_string(),
            filename: key,
        }),
    ))
}

/// Export every stored report
#[utoipa::path(
    get,
    path = "/api/reports/export",
    tag = "reports",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV document", content_type = "text/csv"),
        (status = 400, description = "Unsupported format"),
        (status = 404, description = "No reports stored"),
        (status = 501, description = "PDF export not implemented"),
    )
)]
pub async fn export_reports(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let requested = query.format.unwrap_or_else(|| "csv".to_string());
    let format = ExportFormat::from_str(&requested)
        .map_err(|_| AppError::bad_request(&format!("Unsupported export format '{}'", requested)))?;

    if format == ExportFormat::Pdf {
        return Err(AppError::NotImplemented(
            "PDF export is not implemented".to_string(),
        ));
    }

    let reports = state.store.list().await?;
    if reports.is_empty() {
        return Err(AppError::not_found("No reports to export"));
    }

    let body = export_csv(&reports)?;
    let filename = format!("chaos-reports-{}.csv", chrono::Utc::now().format("%Y%m%dT%H%M%SZ"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}
