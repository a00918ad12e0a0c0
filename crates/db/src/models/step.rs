//! Row types for the `job_steps` table.

use sqlx::FromRow;
use vidova_core::types::{Id, Timestamp};

/// A memoized pipeline step result, keyed by `(job_id, step)`.
#[derive(Debug, Clone, FromRow)]
pub struct StepRow {
    pub job_id: Id,
    pub step: String,
    pub result: serde_json::Value,
    pub recorded_at: Timestamp,
}
