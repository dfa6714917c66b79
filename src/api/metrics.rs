use axum::{extract::State, response::IntoResponse};

use crate::api::AppState;

/// Prometheus metrics endpoint
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "metrics",
    responses(
        (status = 200, description = "Prometheus text exposition", content_type = "text/plain"),
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = format!(
        "# HELP podkiller_info PodKiller build info\n# TYPE podkiller_info gauge\npodkiller_info{{version=\"{}\"}} 1\n",
        env!("CARGO_PKG_VERSION")
    );
    if let Some(handle) = &state.metrics {
        body.push_str(&handle.render());
    }

    ([("content-type", "text/plain; version=0.0.4; charset=utf-8")], body)
}
