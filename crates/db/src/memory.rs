//! In-memory [`GenerationStore`] for tests and DB-less tooling.
//!
//! Enforces the same lifecycle invariants as the Postgres store (forward
//! transitions, idempotent terminal writes, globally unique correlation
//! ids, first-write-wins step results) so engine and API tests exercise
//! the real orchestration semantics without a running database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use vidova_core::error::CoreError;
use vidova_core::job::{state_machine, Job, JobStatus, NewJob};
use vidova_core::store::GenerationStore;
use vidova_core::types::Id;

#[derive(Default)]
struct Inner {
    jobs: Vec<Job>,
    steps: HashMap<(Id, String), serde_json::Value>,
    credits: HashMap<Id, i64>,
}

/// In-memory store. Cheap to construct per test.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user with a starting credit balance.
    pub fn insert_user(&self, user_id: Id, credits: i64) {
        self.inner.lock().unwrap().credits.insert(user_id, credits);
    }

    /// Number of recorded step results for a job (test assertions).
    pub fn recorded_steps(&self, job_id: Id) -> usize {
        self.inner
            .lock()
            .unwrap()
            .steps
            .keys()
            .filter(|(id, _)| *id == job_id)
            .count()
    }

    fn with_job<T>(
        inner: &mut Inner,
        id: Id,
        f: impl FnOnce(&mut Job) -> T,
    ) -> Result<T, CoreError> {
        inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .map(f)
            .ok_or(CoreError::NotFound {
                entity: "Job",
                id,
            })
    }

    /// Apply a terminal transition if the job is not already terminal.
    fn terminal_write(
        &self,
        id: Id,
        to: JobStatus,
        apply: impl FnOnce(&mut Job),
    ) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::with_job(&mut inner, id, |job| {
            if !state_machine::can_transition(job.status, to) {
                return false;
            }
            job.status = to;
            job.updated_at = chrono::Utc::now();
            apply(job);
            true
        })
    }
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn create_job(&self, new: NewJob) -> Result<Job, CoreError> {
        let now = chrono::Utc::now();
        let job = Job {
            id: uuid::Uuid::new_v4(),
            owner_id: new.owner_id,
            kind: new.input.kind(),
            name: new.name,
            status: JobStatus::Queued,
            input: new.input,
            provider_correlation_id: None,
            output_key: None,
            error_detail: None,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().jobs.push(job.clone());
        Ok(job)
    }

    async fn job(&self, id: Id) -> Result<Option<Job>, CoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn job_for_owner(&self, id: Id, owner_id: Id) -> Result<Option<Job>, CoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .jobs
            .iter()
            .find(|j| j.id == id && j.owner_id == owner_id)
            .cloned())
    }

    async fn job_by_correlation(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Job>, CoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .jobs
            .iter()
            .find(|j| j.provider_correlation_id.as_deref() == Some(correlation_id))
            .cloned())
    }

    async fn jobs_for_owner(
        &self,
        owner_id: Id,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, CoreError> {
        let inner = self.inner.lock().unwrap();
        let mut jobs: Vec<Job> = inner
            .jobs
            .iter()
            .filter(|j| j.owner_id == owner_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn queued_jobs(&self, limit: i64) -> Result<Vec<Job>, CoreError> {
        let inner = self.inner.lock().unwrap();
        let mut jobs: Vec<Job> = inner
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Queued)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        jobs.truncate(limit.max(0) as usize);
        Ok(jobs)
    }

    async fn stalled_jobs(&self, limit: i64) -> Result<Vec<Job>, CoreError> {
        let inner = self.inner.lock().unwrap();
        let mut jobs: Vec<Job> = inner
            .jobs
            .iter()
            .filter(|j| {
                j.status == JobStatus::Processing && j.provider_correlation_id.is_none()
            })
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        jobs.truncate(limit.max(0) as usize);
        Ok(jobs)
    }

    async fn rename_job(&self, id: Id, owner_id: Id, name: &str) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id && j.owner_id == owner_id)
        {
            Some(job) => {
                job.name = name.to_string();
                job.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_processing(&self, id: Id) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::with_job(&mut inner, id, |job| {
            if job.status != JobStatus::Queued {
                return false;
            }
            job.status = JobStatus::Processing;
            job.updated_at = chrono::Utc::now();
            true
        })
    }

    async fn record_correlation(&self, id: Id, correlation_id: &str) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let taken = inner
            .jobs
            .iter()
            .any(|j| j.id != id && j.provider_correlation_id.as_deref() == Some(correlation_id));
        if taken {
            return Err(CoreError::Conflict(format!(
                "Correlation id already assigned: {correlation_id}"
            )));
        }
        Self::with_job(&mut inner, id, |job| {
            job.provider_correlation_id = Some(correlation_id.to_string());
            job.updated_at = chrono::Utc::now();
        })
    }

    async fn complete_job(&self, id: Id, output_key: &str) -> Result<bool, CoreError> {
        self.terminal_write(id, JobStatus::Completed, |job| {
            job.output_key = Some(output_key.to_string());
        })
    }

    async fn fail_job(&self, id: Id, reason: &str) -> Result<bool, CoreError> {
        self.terminal_write(id, JobStatus::Failed, |job| {
            job.error_detail = Some(reason.to_string());
        })
    }

    async fn mark_no_credits(&self, id: Id) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::with_job(&mut inner, id, |job| {
            if job.status != JobStatus::Queued {
                return false;
            }
            job.status = JobStatus::NoCredits;
            job.updated_at = chrono::Utc::now();
            true
        })
    }

    async fn step_result(
        &self,
        job_id: Id,
        step: &str,
    ) -> Result<Option<serde_json::Value>, CoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.steps.get(&(job_id, step.to_string())).cloned())
    }

    async fn record_step(
        &self,
        job_id: Id,
        step: &str,
        result: &serde_json::Value,
    ) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .steps
            .entry((job_id, step.to_string()))
            .or_insert_with(|| result.clone());
        Ok(())
    }

    async fn credit_balance(&self, user_id: Id) -> Result<i64, CoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .credits
            .get(&user_id)
            .copied()
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })
    }

    async fn debit_credit(&self, user_id: Id) -> Result<i64, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let balance = inner
            .credits
            .get_mut(&user_id)
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;
        *balance -= 1;
        Ok(*balance)
    }

    async fn add_credits(&self, user_id: Id, amount: i64) -> Result<i64, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let balance = inner
            .credits
            .get_mut(&user_id)
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;
        *balance += amount;
        Ok(*balance)
    }
}
