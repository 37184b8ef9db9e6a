use std::sync::{Mutex, MutexGuard, PoisonError};

use client_config::BatchingConfig;
use client_runtime::OperationId;
use serde_json::Value;

use crate::{batch::BatchScheduler, cache::ResultCache, in_flight::InFlightTracker, resolver::CacheLookup};

/// Mutable state of one engine. Every read and write goes through a single lock so that
/// looking a fingerprint up, marking it in flight and enqueueing it happen as one step.
pub(super) struct EngineState {
    pub cache: ResultCache,
    pub in_flight: InFlightTracker,
    pub batches: BatchScheduler,
    next_operation_id: u64,
}

impl EngineState {
    pub fn new(batching: BatchingConfig) -> Self {
        EngineState {
            cache: ResultCache::default(),
            in_flight: InFlightTracker::default(),
            batches: BatchScheduler::new(batching),
            next_operation_id: 0,
        }
    }

    pub fn next_operation_id(&mut self) -> OperationId {
        self.next_operation_id += 1;
        OperationId(self.next_operation_id)
    }
}

pub(super) struct SharedState(Mutex<EngineState>);

impl SharedState {
    pub fn new(state: EngineState) -> Self {
        SharedState(Mutex::new(state))
    }

    /// Nothing in the critical sections can leave the state half updated, a poisoned lock is
    /// still usable.
    pub fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheLookup for SharedState {
    fn read_field(&self, path: &str) -> Option<Value> {
        self.lock().cache.read_field(path).cloned()
    }
}
