use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::alerts::classify_str;
use crate::router::{AlertRouter, DispatchReport};

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub alert: &'static str,
    pub symbol: String,
    pub report: DispatchReport,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub bots: usize,
}

/// Classifies the body and dispatches the alert to every eligible bot.
///
/// The body is read as text so alert sources that send JSON with a
/// `text/plain` content type are accepted.
///
/// # Errors
/// Returns `StatusCode::BAD_REQUEST` when the payload fails classification.
/// Per-bot failures never fail the request; they are listed in the report.
pub async fn receive_alert(
    State(router): State<Arc<AlertRouter>>,
    body: String,
) -> Result<Json<AlertResponse>, (StatusCode, Json<ErrorResponse>)> {
    let alert = classify_str(&body).map_err(|e| {
        warn!(error = %e, "Rejected alert payload");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    let report = router.dispatch(&alert).await;

    Ok(Json(AlertResponse {
        alert: alert.signal.as_str(),
        symbol: alert.symbol,
        report,
    }))
}

pub async fn health(State(router): State<Arc<AlertRouter>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        bots: router.registry().len(),
    })
}
