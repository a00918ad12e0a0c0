//! Repository for the `jobs` table.
//!
//! Status transitions are expressed as conditional UPDATEs so lifecycle
//! invariants hold under concurrent writers: a terminal row is never
//! mutated again, and `rows_affected` tells the caller whether the write
//! applied or was an idempotent replay.

use sqlx::PgPool;
use vidova_core::job::JobStatus;
use vidova_core::types::Id;

use crate::models::job::JobRow;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, owner_id, kind, name, status, input, \
    provider_correlation_id, output_key, error_detail, \
    created_at, updated_at";

/// Statuses from which no further transition is allowed.
const TERMINAL_STATUSES: [&str; 3] = [
    JobStatus::Completed.as_str(),
    JobStatus::Failed.as_str(),
    JobStatus::NoCredits.as_str(),
];

/// Provides CRUD operations for generation jobs.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new queued job.
    pub async fn create(
        pool: &PgPool,
        id: Id,
        owner_id: Id,
        kind: &str,
        name: &str,
        input: &serde_json::Value,
    ) -> Result<JobRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (id, owner_id, kind, name, status, input) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(kind)
            .bind(name)
            .bind(JobStatus::Queued.as_str())
            .bind(input)
            .fetch_one(pool)
            .await
    }

    /// Find a job by its id.
    pub async fn find_by_id(pool: &PgPool, id: Id) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, JobRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a job by id, scoped to its owner.
    pub async fn find_by_id_for_owner(
        pool: &PgPool,
        id: Id,
        owner_id: Id,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, JobRow>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Find the job holding a provider correlation id, across all kinds.
    pub async fn find_by_correlation(
        pool: &PgPool,
        correlation_id: &str,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE provider_correlation_id = $1");
        sqlx::query_as::<_, JobRow>(&query)
            .bind(correlation_id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's jobs, newest first.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: Id,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List queued jobs in FIFO order by creation time.
    pub async fn list_queued(pool: &PgPool, limit: i64) -> Result<Vec<JobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE status = $1 \
             ORDER BY created_at ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(JobStatus::Queued.as_str())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// List jobs claimed by a previous process but never suspended or
    /// finished: `processing` with no correlation id, oldest first.
    pub async fn list_stalled(pool: &PgPool, limit: i64) -> Result<Vec<JobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE status = $1 AND provider_correlation_id IS NULL \
             ORDER BY created_at ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(JobStatus::Processing.as_str())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Transition `queued -> processing`. Returns `false` when the job has
    /// already left `queued` (a replayed step).
    pub async fn mark_processing(pool: &PgPool, id: Id) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(JobStatus::Processing.as_str())
        .bind(JobStatus::Queued.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the provider correlation id. The partial unique index on
    /// `provider_correlation_id` rejects a duplicate across all kinds.
    pub async fn set_correlation(
        pool: &PgPool,
        id: Id,
        correlation_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET provider_correlation_id = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(correlation_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Terminal write: set the output artifact and complete the job.
    ///
    /// Returns `false` without mutating when the job is already terminal,
    /// which makes duplicate webhook deliveries no-ops.
    pub async fn complete(
        pool: &PgPool,
        id: Id,
        output_key: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status = $2, output_key = $3, updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ($4, $5, $6)",
        )
        .bind(id)
        .bind(JobStatus::Completed.as_str())
        .bind(output_key)
        .bind(TERMINAL_STATUSES[0])
        .bind(TERMINAL_STATUSES[1])
        .bind(TERMINAL_STATUSES[2])
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminal write: mark the job failed with a detail message.
    pub async fn fail(pool: &PgPool, id: Id, reason: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status = $2, error_detail = $3, updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ($4, $5, $6)",
        )
        .bind(id)
        .bind(JobStatus::Failed.as_str())
        .bind(reason)
        .bind(TERMINAL_STATUSES[0])
        .bind(TERMINAL_STATUSES[1])
        .bind(TERMINAL_STATUSES[2])
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminal write: reject a queued job for lack of credits. Only valid
    /// from `queued`; the pipeline never starts for these jobs.
    pub async fn mark_no_credits(pool: &PgPool, id: Id) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(JobStatus::NoCredits.as_str())
        .bind(JobStatus::Queued.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rename a job on behalf of its owner.
    pub async fn rename(
        pool: &PgPool,
        id: Id,
        owner_id: Id,
        name: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET name = $3, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
