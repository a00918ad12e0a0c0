//! Inference provider callback endpoint.
//!
//! The provider delivers callbacks at least once and retries on non-2xx
//! responses. Only a body we cannot attribute to a request (unparsable,
//! or missing `request_id`) earns a 400; every resolvable case answers
//! 200 with a descriptive message so the provider stops retrying
//! terminal or unknown jobs.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use vidova_core::webhook::ProviderCallback;
use vidova_engine::ReconcileOutcome;

use crate::error::AppResult;
use crate::state::AppState;

/// POST /api/v1/webhooks/inference
pub async fn inference_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let callback: ProviderCallback = match serde_json::from_slice(&body) {
        Ok(cb) => cb,
        Err(e) => {
            tracing::warn!(error = %e, "Unparsable inference callback body");
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid callback body" })),
            ));
        }
    };
    if callback.request_id.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing request_id" })),
        ));
    }

    let outcome = state.reconciler.reconcile(&callback).await?;
    let message = match outcome {
        ReconcileOutcome::Completed => "Job completed",
        ReconcileOutcome::Failed => "Job marked failed",
        ReconcileOutcome::AlreadyProcessed => "Job already processed",
        ReconcileOutcome::UnknownCorrelation => "No job matches this request_id",
        ReconcileOutcome::Ignored => "Status acknowledged",
    };
    Ok((StatusCode::OK, Json(json!({ "message": message }))))
}
