use std::{fmt, sync::Arc};

use futures_util::stream::BoxStream;
use serde_json::Value;

/// Identity of an operation inside a dispatched batch. Replies are matched back to their
/// operation with it, never by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Logical transport endpoint. Operations are only ever batched with operations sharing
/// the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey(Arc<str>);

impl BatchKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        BatchKey(Arc::from(key.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BatchKey {
    fn default() -> Self {
        BatchKey::new("default")
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A network-bound query, as handed to the transport link.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub id: OperationId,
    pub name: Option<String>,
    /// GraphQL text containing only the fields the network must resolve.
    pub query: String,
    pub variables: Value,
    pub batch_key: BatchKey,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphqlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

impl GraphqlResponse {
    pub fn data(data: serde_json::Map<String, Value>) -> Self {
        GraphqlResponse {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn error(error: GraphqlError) -> Self {
        GraphqlResponse {
            data: None,
            errors: vec![error],
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Map<String, Value>>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        GraphqlError {
            message: message.into(),
            path: None,
            extensions: None,
        }
    }
}

impl fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationReply {
    pub id: OperationId,
    pub response: GraphqlResponse,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request returned status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no reply received for operation {0}")]
    MissingReply(OperationId),
}

impl TransportError {
    pub fn request(error: impl ToString) -> Self {
        TransportError::Request(error.to_string())
    }
}

/// Sends batches of operations and streams back one reply per operation.
///
/// Replies may arrive in any order and over any period of time. An `Err` item fails every
/// operation of the batch still waiting for a reply.
pub trait TransportLink: Send + Sync + 'static {
    fn send(&self, operations: Vec<Operation>) -> BoxStream<'static, Result<OperationReply, TransportError>>;
}

impl<T: TransportLink + ?Sized> TransportLink for Arc<T> {
    fn send(&self, operations: Vec<Operation>) -> BoxStream<'static, Result<OperationReply, TransportError>> {
        self.as_ref().send(operations)
    }
}
