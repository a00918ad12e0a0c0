use std::sync::Arc;

use tokio::sync::Notify;
use vidova_core::collab::StorageSigner;
use vidova_core::store::GenerationStore;
use vidova_engine::WebhookReconciler;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`. Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Durable job/credit store (Postgres in production).
    pub store: Arc<dyn GenerationStore>,
    /// Presigned-URL issuer for client uploads.
    pub signer: Arc<dyn StorageSigner>,
    /// Applies inference provider callbacks to suspended jobs.
    pub reconciler: Arc<WebhookReconciler>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Wakes the dispatcher immediately after a job is created.
    pub jobs_notify: Arc<Notify>,
}
