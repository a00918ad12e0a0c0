//! Per-user concurrency admission.
//!
//! Each user may have at most `limit` jobs in active execution at once.
//! A slot is held from the moment a job is claimed until its pipeline run
//! ends, whether that run completes, fails, or suspends awaiting a
//! provider callback; a suspended job holds no compute and therefore no
//! slot. Counters are only touched from the dispatcher task and from
//! permit drops, so admission decisions are effectively serialized.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use vidova_core::types::Id;

/// Default per-user concurrency limit.
pub const DEFAULT_PER_USER_LIMIT: usize = 5;

/// Tracks in-flight pipeline runs per user.
pub struct AdmissionController {
    limit: usize,
    in_flight: Mutex<HashMap<Id, usize>>,
}

impl AdmissionController {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Try to claim a slot for `owner_id`. Returns `None` when the user is
    /// already at the limit; the permit releases the slot on drop.
    pub fn try_acquire(self: &Arc<Self>, owner_id: Id) -> Option<AdmissionPermit> {
        let mut in_flight = self.in_flight.lock().unwrap();
        let count = in_flight.entry(owner_id).or_insert(0);
        if *count >= self.limit {
            return None;
        }
        *count += 1;
        Some(AdmissionPermit {
            owner_id,
            controller: Arc::clone(self),
        })
    }

    /// Current in-flight count for a user.
    pub fn in_flight(&self, owner_id: Id) -> usize {
        self.in_flight
            .lock()
            .unwrap()
            .get(&owner_id)
            .copied()
            .unwrap_or(0)
    }

    fn release(&self, owner_id: Id) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(count) = in_flight.get_mut(&owner_id) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(&owner_id);
            }
        }
    }
}

/// A held concurrency slot. Dropping it frees the slot.
pub struct AdmissionPermit {
    owner_id: Id,
    controller: Arc<AdmissionController>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.controller.release(self.owner_id);
    }
}
