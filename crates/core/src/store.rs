//! Durable store contract for jobs, step results, and credit balances.
//!
//! The engine is written against this trait so the same orchestration code
//! runs over Postgres in production and over the in-memory store in tests.
//! Implementations must uphold the lifecycle invariants:
//!
//! - Status transitions follow [`crate::job::state_machine`]; writes that
//!   would move a job out of a terminal state are rejected by returning
//!   `false` (idempotent re-delivery), never by corrupting the record.
//! - `provider_correlation_id` is unique across all jobs of all kinds.
//! - Credit mutations are atomic increments/decrements, never
//!   read-modify-write.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::job::{Job, NewJob};
use crate::types::Id;

/// Durable storage for the orchestration core.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    // -- job records --------------------------------------------------------

    /// Create a job in `Queued` status. Assigns id and timestamps.
    async fn create_job(&self, new: NewJob) -> Result<Job, CoreError>;

    /// Fetch a job by id.
    async fn job(&self, id: Id) -> Result<Option<Job>, CoreError>;

    /// Fetch a job by id, scoped to its owner.
    async fn job_for_owner(&self, id: Id, owner_id: Id) -> Result<Option<Job>, CoreError>;

    /// Look up a job from a provider correlation id, across all kinds.
    async fn job_by_correlation(&self, correlation_id: &str)
        -> Result<Option<Job>, CoreError>;

    /// List an owner's jobs, newest first.
    async fn jobs_for_owner(
        &self,
        owner_id: Id,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, CoreError>;

    /// List queued jobs in FIFO order by creation time.
    async fn queued_jobs(&self, limit: i64) -> Result<Vec<Job>, CoreError>;

    /// List jobs stuck in `Processing` with no provider correlation id,
    /// oldest first. Only a process dying mid-pipeline leaves a job in
    /// this state; jobs suspended on the provider carry a correlation id
    /// and are excluded.
    async fn stalled_jobs(&self, limit: i64) -> Result<Vec<Job>, CoreError>;

    /// Rename a job; `false` when no job matches id and owner.
    async fn rename_job(&self, id: Id, owner_id: Id, name: &str) -> Result<bool, CoreError>;

    // -- status transitions -------------------------------------------------

    /// Transition `Queued -> Processing`. `false` if the job already left
    /// `Queued` (idempotent replay).
    async fn mark_processing(&self, id: Id) -> Result<bool, CoreError>;

    /// Record the provider correlation id on a job.
    ///
    /// Fails with [`CoreError::Conflict`] when the id is already taken by
    /// another job (global correlation namespace).
    async fn record_correlation(&self, id: Id, correlation_id: &str) -> Result<(), CoreError>;

    /// Terminal write: set `output_key` and transition to `Completed`.
    /// Returns `false` without mutating when the job is already terminal.
    async fn complete_job(&self, id: Id, output_key: &str) -> Result<bool, CoreError>;

    /// Terminal write: transition to `Failed` with a failure detail.
    /// Returns `false` without mutating when the job is already terminal.
    async fn fail_job(&self, id: Id, reason: &str) -> Result<bool, CoreError>;

    /// Terminal write: transition to `NoCredits`.
    /// Returns `false` without mutating when the job is already terminal.
    async fn mark_no_credits(&self, id: Id) -> Result<bool, CoreError>;

    // -- step memoization ---------------------------------------------------

    /// Fetch the memoized result for `(job, step)`, if recorded.
    async fn step_result(
        &self,
        job_id: Id,
        step: &str,
    ) -> Result<Option<serde_json::Value>, CoreError>;

    /// Durably record a step result. Recording the same `(job, step)` twice
    /// keeps the first write (the replay discards its recomputed value).
    async fn record_step(
        &self,
        job_id: Id,
        step: &str,
        result: &serde_json::Value,
    ) -> Result<(), CoreError>;

    // -- credit ledger ------------------------------------------------------

    /// Current credit balance for a user.
    async fn credit_balance(&self, user_id: Id) -> Result<i64, CoreError>;

    /// Atomically decrement the user's balance by one; returns the new
    /// balance. Callers gate this behind step memoization so a replayed
    /// debit is a no-op.
    async fn debit_credit(&self, user_id: Id) -> Result<i64, CoreError>;

    /// Atomically add purchased credits; returns the new balance. Additive
    /// only: positive amounts are never clamped or rejected.
    async fn add_credits(&self, user_id: Id, amount: i64) -> Result<i64, CoreError>;
}
