use std::{fmt, sync::Arc};

use base64::{display::Base64Display, engine::general_purpose::URL_SAFE_NO_PAD};
use client_runtime::{BatchKey, OperationId};

use crate::query::Variables;

/// Deduplication and cache key of the network part of a query.
///
/// Stable across runs: it only depends on the transport endpoint, the printed network query
/// and the canonical form of the variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(Arc<str>);

impl Fingerprint {
    pub(crate) fn new(batch_key: &BatchKey, network_query: &str, variables: &Variables) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(batch_key.as_str().as_bytes());
        // NULL bytes acting as separators, they cannot be present in GraphQL text.
        hasher.update(&[0x00]);
        hasher.update(network_query.as_bytes());
        hasher.update(&[0x00]);
        hasher.update(variables.canonical().as_bytes());
        let hash = hasher.finalize();

        Fingerprint(Arc::from(format!(
            "op.blake3.{}",
            Base64Display::new(hash.as_bytes(), &URL_SAFE_NO_PAD)
        )))
    }

    /// Key that is unique to one operation, used when deduplication is turned off.
    pub(crate) fn for_operation(&self, id: OperationId) -> Self {
        Fingerprint(Arc::from(format!("{}.{}", self.0, id.0)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
