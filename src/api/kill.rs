//! Kill session endpoints
//!
//! Sessions run in a spawned task so they finish even when the client goes
//! away mid-request.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};
use tracing::{error, info};

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::experiment::{EventEmitter, KillRequest, ProgressEvent};
use crate::models::SessionReport;

/// Run a kill session and return its report
#[utoipa::path(
    post,
    path = "/api/kill",
    tag = "chaos",
    request_body = KillRequest,
    responses(
        (status = 200, description = "Session report", body = SessionReport),
        (status = 400, description = "Malformed request or named pods not found in namespace"),
        (status = 404, description = "No pod available to kill"),
    )
)]
pub async fn kill(
    State(state): State<AppState>,
    Json(request): Json<KillRequest>,
) -> AppResult<Json<SessionReport>> {
    info!(?request, "Kill session requested");

    let engine = state.engine.clone();
    let session =
        tokio::spawn(async move { engine.run(request, &EventEmitter::disabled()).await });

    let report = session.await.map_err(|e| {
        error!(error = %e, "Kill session task failed");
        AppError::internal("Kill session task failed")
    })??;

    Ok(Json(report))
}

/// Run a kill session, streaming progress as Server-Sent Events.
///
/// Each event's data is a `{"type", "message"}` JSON object; the stream ends
/// after the single `done` event.
#[utoipa::path(
    post,
    path = "/api/kill/stream",
    tag = "chaos",
    request_body = KillRequest,
    responses(
        (status = 200, description = "text/event-stream of progress events", body = ProgressEvent),
        (status = 400, description = "Malformed request"),
    )
)]
pub async fn kill_stream(
    State(state): State<AppState>,
    Json(request): Json<KillRequest>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!(?request, "Streaming kill session requested");

    let (events, rx) = EventEmitter::channel();
    let engine = state.engine.clone();
    tokio::spawn(async move {
        // Errors already went out as progress events
        if let Err(e) = engine.run(request, &events).await {
            info!(error = %e, "Streaming kill session ended with error");
        }
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| Event::default().json_data(event));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
