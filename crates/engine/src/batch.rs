use std::{collections::HashMap, time::Duration};

use client_config::BatchingConfig;
use client_runtime::{BatchKey, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct BatchId(u64);

/// What happened to an enqueued operation.
#[derive(Debug)]
pub(crate) enum Enqueued {
    /// Joined a pending batch whose timer is already running.
    Joined,
    /// Opened a new batch: the caller starts its coalescing timer.
    Started(BatchId),
    /// The batch is complete and must be dispatched right away.
    Ready(Vec<Operation>),
}

struct PendingBatch {
    id: BatchId,
    operations: Vec<Operation>,
}

/// Groups operations per batch key within a trailing coalescing window.
///
/// The window opens with the first operation of a batch and is never extended by the ones that
/// join it later.
pub(crate) struct BatchScheduler {
    config: BatchingConfig,
    pending: HashMap<BatchKey, PendingBatch>,
    next_id: u64,
}

impl BatchScheduler {
    pub fn new(config: BatchingConfig) -> Self {
        BatchScheduler {
            config,
            pending: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn enqueue(&mut self, operation: Operation) -> Enqueued {
        if !self.config.enabled {
            return Enqueued::Ready(vec![operation]);
        }

        let key = operation.batch_key.clone();
        let started = match self.pending.get_mut(&key) {
            Some(batch) => {
                batch.operations.push(operation);
                None
            }
            None => {
                self.next_id += 1;
                let id = BatchId(self.next_id);
                self.pending.insert(
                    key.clone(),
                    PendingBatch {
                        id,
                        operations: vec![operation],
                    },
                );
                Some(id)
            }
        };

        let full = self
            .pending
            .get(&key)
            .is_some_and(|batch| batch.operations.len() >= self.config.max_size);

        if full {
            let operations = self
                .pending
                .remove(&key)
                .map(|batch| batch.operations)
                .unwrap_or_default();
            return Enqueued::Ready(operations);
        }

        match started {
            Some(id) => Enqueued::Started(id),
            None => Enqueued::Joined,
        }
    }

    /// Takes the batch a timer was started for. `None` if that batch was already flushed.
    pub fn take(&mut self, key: &BatchKey, id: BatchId) -> Option<Vec<Operation>> {
        if self.pending.get(key)?.id != id {
            return None;
        }

        self.pending.remove(key).map(|batch| batch.operations)
    }

    /// Takes every pending batch, oldest first.
    pub fn take_all(&mut self) -> Vec<Vec<Operation>> {
        let mut batches = self.pending.drain().map(|(_, batch)| batch).collect::<Vec<_>>();
        batches.sort_by_key(|batch| batch.id);
        batches.into_iter().map(|batch| batch.operations).collect()
    }

    pub fn pending_operations(&self) -> usize {
        self.pending.values().map(|batch| batch.operations.len()).sum()
    }
}
