mod state;

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use client_config::{Config, FetchPolicy};
use client_runtime::{BatchKey, GraphqlResponse, Operation, OperationId, Runtime, TransportError, TransportLink};
use futures::{future::BoxFuture, FutureExt, StreamExt};

use self::state::{EngineState, SharedState};
use crate::{
    batch::{BatchId, Enqueued},
    error::{ConfigurationError, ExecutionError, NetworkError},
    in_flight::{NetworkOutcome, Waiter},
    query::QueryDescriptor,
    resolver::ClientResolvers,
    response::{build_response, NetworkPart},
    Fingerprint, Response,
};

/// Future returned by [`Engine::execute`]. The query is already submitted when it is created.
pub type ExecuteFuture = BoxFuture<'static, Result<Response, ExecutionError>>;

/// Per-call settings, every `None` falls back to the engine configuration.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    pub fetch_policy: Option<FetchPolicy>,
    /// Transport endpoint the operation is batched with.
    pub batch_key: Option<BatchKey>,
}

impl ExecuteOptions {
    #[must_use]
    pub fn with_fetch_policy(mut self, fetch_policy: FetchPolicy) -> Self {
        self.fetch_policy = Some(fetch_policy);
        self
    }

    #[must_use]
    pub fn with_batch_key(mut self, batch_key: BatchKey) -> Self {
        self.batch_key = Some(batch_key);
        self
    }
}

pub struct EngineBuilder<R> {
    runtime: R,
    config: Config,
    resolvers: ClientResolvers,
}

impl<R: Runtime> EngineBuilder<R> {
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn resolvers(mut self, resolvers: ClientResolvers) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn build(self) -> Arc<Engine<R>> {
        let Config {
            batching,
            deduplication,
            cache,
        } = self.config;

        Arc::new(Engine {
            runtime: self.runtime,
            resolvers: self.resolvers,
            deduplication: deduplication.enabled,
            default_fetch_policy: cache.default_fetch_policy,
            state: SharedState::new(EngineState::new(batching)),
        })
    }
}

/// Executes queries, sharing network calls between identical ones.
///
/// Each engine owns its cache, its in-flight operations and its pending batches. Several
/// engines can live side by side without seeing each other.
pub struct Engine<R> {
    runtime: R,
    resolvers: ClientResolvers,
    deduplication: bool,
    default_fetch_policy: FetchPolicy,
    state: SharedState,
}

enum Submission {
    /// Only client fields, nothing to wait for.
    Local,
    Cached(Arc<GraphqlResponse>),
    Network(Waiter),
}

impl<R: Runtime> Engine<R> {
    pub fn builder(runtime: R) -> EngineBuilder<R> {
        EngineBuilder {
            runtime,
            config: Config::default(),
            resolvers: ClientResolvers::default(),
        }
    }

    /// Executes a query with the default options.
    pub fn execute(self: &Arc<Self>, query: impl Into<QueryDescriptor>) -> ExecuteFuture {
        self.execute_with(query, ExecuteOptions::default())
    }

    /// Submits a query and returns a future resolving to its response.
    ///
    /// Submission happens before this returns: the query joins the pending batch or an
    /// in-flight operation even if the future is never polled. Two calls made back to back
    /// for the same network part therefore share one network call.
    pub fn execute_with(self: &Arc<Self>, query: impl Into<QueryDescriptor>, options: ExecuteOptions) -> ExecuteFuture {
        let descriptor = query.into();
        let submission = self.submit(&descriptor, &options);
        let engine = Arc::clone(self);

        async move {
            let submission = match submission {
                Ok(submission) => submission,
                Err(error) => return Err(error),
            };

            let outcome = match submission {
                Submission::Local => None,
                Submission::Cached(response) => Some(Ok(response)),
                Submission::Network(waiter) => Some(waiter.wait().await),
            };

            let network = match &outcome {
                None => NetworkPart::Absent,
                Some(Ok(response)) => NetworkPart::Resolved(response),
                Some(Err(error)) => NetworkPart::Failed(error),
            };

            Ok(build_response(
                descriptor.document().plan(),
                network,
                &engine.resolvers,
                descriptor.variables(),
                &engine.state,
            ))
        }
        .boxed()
    }

    /// Checks that every client field of the query has a resolver.
    pub fn validate(&self, query: &QueryDescriptor) -> Result<(), ConfigurationError> {
        self.resolvers.validate(query.document())
    }

    /// Deduplication and cache key of the query on the default batch key, `None` for queries
    /// without network fields.
    pub fn fingerprint(&self, query: &QueryDescriptor) -> Option<Fingerprint> {
        let network_query = query.document().network_query()?;
        Some(Fingerprint::new(
            &BatchKey::default(),
            network_query,
            &query.network_variables(),
        ))
    }

    /// Drops the cached result of the query. Returns whether there was one.
    pub fn invalidate(&self, query: &QueryDescriptor) -> bool {
        match self.fingerprint(query) {
            Some(key) => self.state.lock().cache.invalidate(&key),
            None => false,
        }
    }

    pub fn reset_cache(&self) {
        self.state.lock().cache.clear();
    }

    /// Number of network calls submitted and not yet resolved.
    pub fn in_flight_count(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Sends every pending batch now instead of waiting for their coalescing window.
    pub fn flush(self: &Arc<Self>) {
        let batches = self.state.lock().batches.take_all();
        for operations in batches {
            self.spawn_dispatch(operations);
        }
    }

    fn submit(
        self: &Arc<Self>,
        descriptor: &QueryDescriptor,
        options: &ExecuteOptions,
    ) -> Result<Submission, ExecutionError> {
        let document = descriptor.document();
        self.resolvers.validate(document)?;

        let Some(network_query) = document.network_query() else {
            return Ok(Submission::Local);
        };

        let policy = options.fetch_policy.unwrap_or(self.default_fetch_policy);
        let batch_key = options.batch_key.clone().unwrap_or_default();
        let variables = descriptor.network_variables();
        let cache_key = Fingerprint::new(&batch_key, network_query, &variables);

        let mut state = self.state.lock();

        if policy.reads_cache() {
            if let Some(entry) = state.cache.get(&cache_key) {
                tracing::debug!(fingerprint = %cache_key, version = entry.version, "cache hit");
                return Ok(Submission::Cached(Arc::clone(&entry.response)));
            }
        }

        if !policy.uses_network() {
            return Err(ExecutionError::CacheMiss);
        }

        if self.deduplication {
            if let Some(waiter) = state.in_flight.attach_waiter(&cache_key, policy.writes_cache()) {
                tracing::debug!(fingerprint = %cache_key, "joined an in-flight operation");
                return Ok(Submission::Network(waiter));
            }
        }

        let operation_id = state.next_operation_id();
        let in_flight_key = if self.deduplication {
            cache_key.clone()
        } else {
            cache_key.for_operation(operation_id)
        };

        let waiter = state
            .in_flight
            .mark_in_flight(in_flight_key, cache_key.clone(), operation_id, policy.writes_cache());

        let enqueued = state.batches.enqueue(Operation {
            id: operation_id,
            name: document.operation_name().map(str::to_string),
            query: network_query.to_string(),
            variables: variables.to_value(),
            batch_key: batch_key.clone(),
        });
        let interval = state.batches.interval();
        let pending = state.batches.pending_operations();
        drop(state);

        tracing::debug!(
            fingerprint = %cache_key,
            %operation_id,
            batch_key = %batch_key,
            pending,
            "enqueued operation"
        );

        match enqueued {
            Enqueued::Joined => {}
            Enqueued::Started(batch_id) => self.schedule_flush(batch_key, batch_id, interval),
            Enqueued::Ready(operations) => self.spawn_dispatch(operations),
        }

        Ok(Submission::Network(waiter))
    }

    fn schedule_flush(self: &Arc<Self>, batch_key: BatchKey, batch_id: BatchId, interval: Duration) {
        let engine = Arc::clone(self);

        self.runtime.spawn(
            async move {
                engine.runtime.sleep(interval).await;

                let operations = engine.state.lock().batches.take(&batch_key, batch_id);
                match operations {
                    Some(operations) => engine.dispatch(operations).await,
                    None => tracing::trace!(batch_key = %batch_key, "batch already flushed"),
                }
            }
            .boxed(),
        );
    }

    fn spawn_dispatch(self: &Arc<Self>, operations: Vec<Operation>) {
        let engine = Arc::clone(self);
        self.runtime.spawn(async move { engine.dispatch(operations).await }.boxed());
    }

    /// Sends one batch and routes every reply to the in-flight entry of its operation.
    async fn dispatch(&self, operations: Vec<Operation>) {
        let Some(batch_key) = operations.first().map(|operation| operation.batch_key.clone()) else {
            return;
        };
        let ids = operations.iter().map(|operation| operation.id).collect::<Vec<_>>();
        let mut unresolved = ids.iter().copied().collect::<HashSet<_>>();

        tracing::debug!(batch_key = %batch_key, batch_size = ids.len(), "flushing batch");
        self.state.lock().in_flight.mark_dispatched(ids.iter().copied(), Instant::now());

        let mut replies = self.runtime.link().send(operations);

        while let Some(reply) = replies.next().await {
            match reply {
                Ok(reply) => {
                    if !unresolved.remove(&reply.id) {
                        tracing::warn!(operation_id = %reply.id, batch_key = %batch_key, "reply for an unknown operation");
                        continue;
                    }

                    let outcome = if reply.response.data.is_none() && !reply.response.errors.is_empty() {
                        Err(NetworkError::Operation(reply.response.errors))
                    } else {
                        Ok(Arc::new(reply.response))
                    };
                    self.complete(reply.id, outcome);
                }
                Err(error) => {
                    tracing::error!(%error, batch_key = %batch_key, "transport link failed");
                    let outcome = Err(NetworkError::Transport(error));
                    for id in ids.iter().filter(|id| unresolved.contains(*id)) {
                        self.complete(*id, outcome.clone());
                    }
                    return;
                }
            }
        }

        for id in ids.iter().filter(|id| unresolved.contains(*id)) {
            tracing::error!(operation_id = %id, batch_key = %batch_key, "transport link did not reply");
            self.complete(*id, Err(NetworkError::Transport(TransportError::MissingReply(*id))));
        }
    }

    /// Caches the outcome, removes the in-flight entry and wakes its waiters in one step. A
    /// submission can never observe the entry gone while the cache is still empty.
    fn complete(&self, operation_id: OperationId, outcome: NetworkOutcome) {
        let mut state = self.state.lock();

        let Some(resolution) = state.in_flight.resolve(operation_id) else {
            return;
        };

        if let (Ok(response), true) = (&outcome, resolution.write_cache) {
            state.cache.put(resolution.cache_key.clone(), Arc::clone(response));
        }

        let elapsed = resolution.dispatched_at.map(|at| at.elapsed());
        let fingerprint = resolution.cache_key.clone();
        let waiters = resolution.deliver(&outcome);

        tracing::debug!(
            %fingerprint,
            %operation_id,
            waiters,
            success = outcome.is_ok(),
            ?elapsed,
            "operation resolved"
        );
    }
}
