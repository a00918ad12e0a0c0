//! Orchestration engine for generation jobs.
//!
//! The engine owns everything between "job row exists in `queued`" and "job
//! row is terminal": admission control ([`AdmissionController`]), the
//! memoized step executor ([`StepContext`]), the per-kind pipelines
//! ([`Pipelines`]), the provider-callback reconciler
//! ([`WebhookReconciler`]), and the background [`Dispatcher`] loop that
//! ties them together.
//!
//! The engine is written entirely against the `GenerationStore` trait and
//! the collaborator traits from `vidova_core`; it has no knowledge of
//! Postgres, S3, or any concrete provider client.

pub mod admission;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod step;

pub use admission::{AdmissionController, AdmissionPermit};
pub use dispatcher::Dispatcher;
pub use error::EngineError;
pub use pipeline::{Collaborators, PipelineOutcome, Pipelines};
pub use reconcile::{ReconcileOutcome, WebhookReconciler};
pub use step::StepContext;
