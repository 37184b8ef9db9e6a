use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Instant,
};

use client_runtime::{GraphqlResponse, OperationId};
use futures::channel::oneshot;

use crate::{error::NetworkError, Fingerprint};

pub(crate) type NetworkOutcome = Result<Arc<GraphqlResponse>, NetworkError>;

/// Receiving half of a waiter. Resolves once the network call it waits on completes.
pub(crate) struct Waiter(oneshot::Receiver<NetworkOutcome>);

impl Waiter {
    pub async fn wait(self) -> NetworkOutcome {
        self.0.await.unwrap_or_else(|_| Err(NetworkError::Canceled))
    }
}

struct InFlightEntry {
    operation_id: OperationId,
    cache_key: Fingerprint,
    write_cache: bool,
    dispatched_at: Option<Instant>,
    waiters: VecDeque<oneshot::Sender<NetworkOutcome>>,
}

/// Network calls that were submitted and did not resolve yet, one per deduplication key.
#[derive(Default)]
pub(crate) struct InFlightTracker {
    entries: HashMap<Fingerprint, InFlightEntry>,
    operations: HashMap<OperationId, Fingerprint>,
}

/// An entry taken out of the tracker, ready to be delivered.
pub(crate) struct Resolution {
    pub cache_key: Fingerprint,
    pub write_cache: bool,
    pub dispatched_at: Option<Instant>,
    waiters: VecDeque<oneshot::Sender<NetworkOutcome>>,
}

impl Resolution {
    /// Delivers the same outcome to every waiter, in the order they attached.
    pub fn deliver(self, outcome: &NetworkOutcome) -> usize {
        let mut delivered = 0;
        for waiter in self.waiters {
            // A waiter whose caller stopped listening is still counted as resolved.
            let _ = waiter.send(outcome.clone());
            delivered += 1;
        }
        delivered
    }
}

impl InFlightTracker {
    /// Joins an existing entry. `write_cache` is sticky: the result is cached as soon as one
    /// of the waiters asked for it.
    pub fn attach_waiter(&mut self, key: &Fingerprint, write_cache: bool) -> Option<Waiter> {
        let entry = self.entries.get_mut(key)?;
        let (sender, receiver) = oneshot::channel();
        entry.waiters.push_back(sender);
        entry.write_cache |= write_cache;
        Some(Waiter(receiver))
    }

    /// Creates the entry for `key`, registering the caller as its first waiter.
    ///
    /// Callers look the key up with [`Self::attach_waiter`] first, within the same critical
    /// section. An existing entry is replaced, which only happens on misuse.
    pub fn mark_in_flight(
        &mut self,
        key: Fingerprint,
        cache_key: Fingerprint,
        operation_id: OperationId,
        write_cache: bool,
    ) -> Waiter {
        let (sender, receiver) = oneshot::channel();
        self.operations.insert(operation_id, key.clone());

        let previous = self.entries.insert(
            key,
            InFlightEntry {
                operation_id,
                cache_key,
                write_cache,
                dispatched_at: None,
                waiters: VecDeque::from([sender]),
            },
        );

        if let Some(previous) = previous {
            tracing::warn!(operation_id = %previous.operation_id, "replaced an in-flight entry");
            self.operations.remove(&previous.operation_id);
        }

        Waiter(receiver)
    }

    pub fn mark_dispatched(&mut self, operation_ids: impl IntoIterator<Item = OperationId>, now: Instant) {
        for id in operation_ids {
            if let Some(entry) = self.operations.get(&id).and_then(|key| self.entries.get_mut(key)) {
                entry.dispatched_at = Some(now);
            }
        }
    }

    /// Removes the entry owning `operation_id`. Returns `None` for unknown or already resolved
    /// operations.
    pub fn resolve(&mut self, operation_id: OperationId) -> Option<Resolution> {
        let key = self.operations.remove(&operation_id)?;
        let entry = self.entries.remove(&key)?;

        Some(Resolution {
            cache_key: entry.cache_key,
            write_cache: entry.write_cache,
            dispatched_at: entry.dispatched_at,
            waiters: entry.waiters,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
