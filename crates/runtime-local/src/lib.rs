mod http;

use std::time::Duration;

use client_runtime::{Runtime, TransportLink};
use futures_util::future::BoxFuture;

pub use http::BatchHttpLink;

/// Runtime backed by the ambient tokio executor.
pub struct TokioRuntime<L> {
    link: L,
}

impl<L: TransportLink> TokioRuntime<L> {
    pub fn new(link: L) -> Self {
        TokioRuntime { link }
    }
}

impl<L: TransportLink> Runtime for TokioRuntime<L> {
    type Link = L;

    fn link(&self) -> &Self::Link {
        &self.link
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }

    fn spawn(&self, future: BoxFuture<'static, ()>) {
        tokio::spawn(future);
    }
}
