//! Repository for memoized pipeline step results.

use sqlx::PgPool;
use vidova_core::types::Id;

use crate::models::step::StepRow;

/// Provides the `(job_id, step)` keyed result cache.
pub struct StepRepo;

impl StepRepo {
    /// Fetch the memoized result for a step, if one was recorded.
    pub async fn find(
        pool: &PgPool,
        job_id: Id,
        step: &str,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        let row: Option<StepRow> = sqlx::query_as(
            "SELECT job_id, step, result, recorded_at FROM job_steps \
             WHERE job_id = $1 AND step = $2",
        )
        .bind(job_id)
        .bind(step)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|r| r.result))
    }

    /// Record a step result. `ON CONFLICT DO NOTHING` keeps the first
    /// write, so a racing replay cannot overwrite the durable result.
    pub async fn record(
        pool: &PgPool,
        job_id: Id,
        step: &str,
        result: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO job_steps (job_id, step, result) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (job_id, step) DO NOTHING",
        )
        .bind(job_id)
        .bind(step)
        .bind(result)
        .execute(pool)
        .await?;
        Ok(())
    }
}
