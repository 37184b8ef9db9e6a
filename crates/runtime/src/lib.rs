pub mod link;

use std::{future::Future, time::Duration};

use futures_util::future::BoxFuture;

pub use link::{BatchKey, GraphqlError, GraphqlResponse, Operation, OperationId, OperationReply, TransportError, TransportLink};

/// Everything the engine needs from its host environment.
///
/// Timers and task spawning go through this trait so tests can drive time deterministically
/// and the engine never depends on a specific executor.
pub trait Runtime: Send + Sync + 'static {
    type Link: TransportLink;

    fn link(&self) -> &Self::Link;
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
    /// Runs a detached task. The task must be driven to completion even if nobody awaits it.
    fn spawn(&self, future: BoxFuture<'static, ()>);
}
