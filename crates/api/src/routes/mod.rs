//! Route table assembly.

pub mod health;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/generations",
            post(handlers::generations::create_generation)
                .get(handlers::generations::list_generations),
        )
        .route("/generations/{id}", get(handlers::generations::get_generation))
        .route(
            "/generations/{id}/name",
            patch(handlers::generations::rename_generation),
        )
        .route("/uploads/presign", post(handlers::uploads::presign_upload))
        .route("/credits", get(handlers::credits::get_balance))
        .route(
            "/webhooks/inference",
            post(handlers::webhooks::inference_callback),
        )
        .route("/webhooks/billing", post(handlers::billing::billing_callback))
}
