use client_runtime::{GraphqlError, TransportError};

/// Problems with a query document or its variables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("could not parse the query: {0}")]
    Parse(String),
    #[error("the document does not contain any operation")]
    MissingOperation,
    #[error("the document contains several operations, an operation name is required")]
    AmbiguousOperation,
    #[error("unknown operation named '{0}'")]
    UnknownOperation(String),
    #[error("{0} operations are not supported")]
    UnsupportedOperation(&'static str),
    #[error("unknown fragment named '{0}'")]
    UnknownFragment(String),
    #[error("fragment '{0}' spreads itself")]
    FragmentCycle(String),
    #[error("variables must be a JSON object")]
    InvalidVariables,
}

/// A client field cannot be resolved with the registered resolvers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no resolver registered for the client field '{path}'")]
    MissingResolver { path: String },
}

/// Failure of a single client field resolver. Ends up as a field error in the response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ResolverError {
    pub message: String,
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        ResolverError {
            message: message.into(),
        }
    }
}

/// Reasons `execute` does not produce a response at all. Network and resolver failures are
/// reported inside the response instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("no cached result and the fetch policy forbids network access")]
    CacheMiss,
}

/// Outcome of a network resolution shared by every waiter of an in-flight entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(crate) enum NetworkError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("the operation failed")]
    Operation(Vec<GraphqlError>),
    #[error("the engine dropped the request before it resolved")]
    Canceled,
}
