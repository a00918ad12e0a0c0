//! Row types for the `jobs` table.

use sqlx::FromRow;
use vidova_core::error::CoreError;
use vidova_core::job::{Job, JobInput, JobKind, JobStatus};
use vidova_core::types::{Id, Timestamp};

/// A raw row from the `jobs` table. Converted into the domain
/// [`Job`] via [`JobRow::into_job`] so the core crate stays sqlx-free.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: Id,
    pub owner_id: Id,
    pub kind: String,
    pub name: String,
    pub status: String,
    pub input: serde_json::Value,
    pub provider_correlation_id: Option<String>,
    pub output_key: Option<String>,
    pub error_detail: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobRow {
    /// Parse the stored strings/JSON back into domain types.
    pub fn into_job(self) -> Result<Job, CoreError> {
        let kind = JobKind::parse(&self.kind)?;
        let status = JobStatus::parse(&self.status)?;
        let input: JobInput = serde_json::from_value(self.input)
            .map_err(|e| CoreError::Internal(format!("Corrupt job input JSON: {e}")))?;

        if input.kind() != kind {
            return Err(CoreError::Internal(format!(
                "Job {} kind column ({}) disagrees with input payload ({})",
                self.id,
                self.kind,
                input.kind().as_str()
            )));
        }

        Ok(Job {
            id: self.id,
            owner_id: self.owner_id,
            kind,
            name: self.name,
            status,
            input,
            provider_correlation_id: self.provider_correlation_id,
            output_key: self.output_key,
            error_detail: self.error_detail,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
