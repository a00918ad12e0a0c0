//! Memoized step executor.
//!
//! A pipeline is a strictly ordered sequence of named steps. Each step's
//! side-effecting portion runs at most once per job: before executing, the
//! executor consults the durable step-result cache and serves a replay
//! from the recorded value instead of re-running the closure. This is what
//! makes pipeline replays safe under at-least-once execution (a replayed
//! submission returns the original correlation id, a replayed debit never
//! touches the ledger again).

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use vidova_core::store::GenerationStore;
use vidova_core::types::Id;

use crate::error::EngineError;

/// Step execution context for one job.
pub struct StepContext {
    store: Arc<dyn GenerationStore>,
    job_id: Id,
}

impl StepContext {
    pub fn new(store: Arc<dyn GenerationStore>, job_id: Id) -> Self {
        Self { store, job_id }
    }

    /// Run a named step, memoizing its result by `(job_id, name)`.
    ///
    /// On replay the cached value is returned and `f` never runs. When two
    /// replays race, the store keeps the first recorded value and both
    /// callers observe it.
    pub async fn run<T, F, Fut>(&self, name: &str, f: F) -> Result<T, EngineError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        if let Some(cached) = self.store.step_result(self.job_id, name).await? {
            tracing::debug!(job_id = %self.job_id, step = name, "Step served from cache");
            return decode(name, cached);
        }

        let value = f().await?;
        let encoded = serde_json::to_value(&value).map_err(|e| EngineError::StepDecode {
            step: name.to_string(),
            source: e,
        })?;
        self.store.record_step(self.job_id, name, &encoded).await?;

        // A racing replay may have recorded first; its value wins.
        match self.store.step_result(self.job_id, name).await? {
            Some(recorded) if recorded != encoded => decode(name, recorded),
            _ => Ok(value),
        }
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: serde_json::Value) -> Result<T, EngineError> {
    serde_json::from_value(value).map_err(|e| EngineError::StepDecode {
        step: name.to_string(),
        source: e,
    })
}
