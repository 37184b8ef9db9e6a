//! Batched, deduplicating execution of GraphQL queries on the client side.
//!
//! A query is split into the fields resolved over the network and the `@client` fields resolved
//! locally. The network part is what gets deduplicated, cached and batched:
//!
//! 1. The network part is printed and fingerprinted together with its variables.
//! 2. A cached result for that fingerprint answers the query without any network call.
//! 3. Otherwise the query joins the operation already in flight for the fingerprint, or starts
//!    a new one that waits in the pending batch of its endpoint.
//! 4. When the batch window closes the operations go out through the transport link, and each
//!    reply is routed back by operation id.
//! 5. The network data is merged with the client fields, in the order the query asked for.
//!
//! Steps 2 and 3 happen under one lock, as does the caching of a result and the removal of its
//! in-flight entry, so a fingerprint is never sent twice while a call for it is outstanding.

mod batch;
mod cache;
mod engine;
mod error;
mod fingerprint;
mod in_flight;
mod query;
mod resolver;
mod response;

pub use client_config::{Config, FetchPolicy};

pub use self::{
    engine::{Engine, EngineBuilder, ExecuteFuture, ExecuteOptions},
    error::{ConfigurationError, ExecutionError, QueryError, ResolverError},
    fingerprint::Fingerprint,
    query::{QueryDescriptor, QueryDocument, Variables},
    resolver::{ClientResolvers, ClientResolversBuilder, ResolverContext},
    response::{ErrorCode, Response, ResponseError},
};
