//! Postgres-backed [`GenerationStore`].
//!
//! Thin adapter between the repository layer and the engine's store
//! contract: rows become domain jobs, and sqlx errors are classified into
//! [`CoreError`] variants so nothing above this crate sees sqlx types.

use async_trait::async_trait;
use sqlx::PgPool;
use vidova_core::error::CoreError;
use vidova_core::job::{Job, NewJob};
use vidova_core::store::GenerationStore;
use vidova_core::types::Id;

use crate::models::job::JobRow;
use crate::repositories::{JobRepo, StepRepo, UserRepo};

/// Postgres implementation of the store contract.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Classify a sqlx error into a [`CoreError`].
///
/// Unique-constraint violations (constraint names starting with `uq_`)
/// map to `Conflict`; everything else is an internal error.
fn classify(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint.starts_with("uq_") {
                return CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                ));
            }
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal(format!("Database error: {err}"))
}

fn into_jobs(rows: Vec<JobRow>) -> Result<Vec<Job>, CoreError> {
    rows.into_iter().map(JobRow::into_job).collect()
}

#[async_trait]
impl GenerationStore for PgStore {
    async fn create_job(&self, new: NewJob) -> Result<Job, CoreError> {
        let input = serde_json::to_value(&new.input)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize job input: {e}")))?;
        let row = JobRepo::create(
            &self.pool,
            uuid::Uuid::new_v4(),
            new.owner_id,
            new.input.kind().as_str(),
            &new.name,
            &input,
        )
        .await
        .map_err(classify)?;
        row.into_job()
    }

    async fn job(&self, id: Id) -> Result<Option<Job>, CoreError> {
        JobRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(JobRow::into_job)
            .transpose()
    }

    async fn job_for_owner(&self, id: Id, owner_id: Id) -> Result<Option<Job>, CoreError> {
        JobRepo::find_by_id_for_owner(&self.pool, id, owner_id)
            .await
            .map_err(classify)?
            .map(JobRow::into_job)
            .transpose()
    }

    async fn job_by_correlation(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Job>, CoreError> {
        JobRepo::find_by_correlation(&self.pool, correlation_id)
            .await
            .map_err(classify)?
            .map(JobRow::into_job)
            .transpose()
    }

    async fn jobs_for_owner(
        &self,
        owner_id: Id,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, CoreError> {
        into_jobs(
            JobRepo::list_for_owner(&self.pool, owner_id, limit, offset)
                .await
                .map_err(classify)?,
        )
    }

    async fn queued_jobs(&self, limit: i64) -> Result<Vec<Job>, CoreError> {
        into_jobs(JobRepo::list_queued(&self.pool, limit).await.map_err(classify)?)
    }

    async fn stalled_jobs(&self, limit: i64) -> Result<Vec<Job>, CoreError> {
        into_jobs(JobRepo::list_stalled(&self.pool, limit).await.map_err(classify)?)
    }

    async fn rename_job(&self, id: Id, owner_id: Id, name: &str) -> Result<bool, CoreError> {
        JobRepo::rename(&self.pool, id, owner_id, name)
            .await
            .map_err(classify)
    }

    async fn mark_processing(&self, id: Id) -> Result<bool, CoreError> {
        JobRepo::mark_processing(&self.pool, id).await.map_err(classify)
    }

    async fn record_correlation(&self, id: Id, correlation_id: &str) -> Result<(), CoreError> {
        JobRepo::set_correlation(&self.pool, id, correlation_id)
            .await
            .map_err(classify)
    }

    async fn complete_job(&self, id: Id, output_key: &str) -> Result<bool, CoreError> {
        JobRepo::complete(&self.pool, id, output_key)
            .await
            .map_err(classify)
    }

    async fn fail_job(&self, id: Id, reason: &str) -> Result<bool, CoreError> {
        JobRepo::fail(&self.pool, id, reason).await.map_err(classify)
    }

    async fn mark_no_credits(&self, id: Id) -> Result<bool, CoreError> {
        JobRepo::mark_no_credits(&self.pool, id).await.map_err(classify)
    }

    async fn step_result(
        &self,
        job_id: Id,
        step: &str,
    ) -> Result<Option<serde_json::Value>, CoreError> {
        StepRepo::find(&self.pool, job_id, step).await.map_err(classify)
    }

    async fn record_step(
        &self,
        job_id: Id,
        step: &str,
        result: &serde_json::Value,
    ) -> Result<(), CoreError> {
        StepRepo::record(&self.pool, job_id, step, result)
            .await
            .map_err(classify)
    }

    async fn credit_balance(&self, user_id: Id) -> Result<i64, CoreError> {
        UserRepo::find_by_id(&self.pool, user_id)
            .await
            .map_err(classify)?
            .map(|user| user.credits)
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })
    }

    async fn debit_credit(&self, user_id: Id) -> Result<i64, CoreError> {
        UserRepo::debit_credit(&self.pool, user_id)
            .await
            .map_err(classify)?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })
    }

    async fn add_credits(&self, user_id: Id, amount: i64) -> Result<i64, CoreError> {
        UserRepo::add_credits(&self.pool, user_id, amount)
            .await
            .map_err(classify)?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })
    }
}
