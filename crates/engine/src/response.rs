mod merge;

use client_runtime::GraphqlError;
use serde_json::{Map, Value};

pub(crate) use merge::{build_response, NetworkPart};

/// Result of an execution, in the shape of a GraphQL response. Fields appear in the order the
/// query requested them.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Response {
    pub data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,
}

impl Response {
    /// Value of a root field, `None` when absent or when there is no data at all.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.get(key)
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResponseError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl ResponseError {
    pub(crate) fn new(message: impl Into<String>, path: Vec<Value>, code: ErrorCode) -> Self {
        let mut extensions = Map::new();
        extensions.insert("code".into(), Value::String(code.to_string()));

        ResponseError {
            message: message.into(),
            path,
            extensions,
        }
    }

    /// `extensions.code`, when set.
    pub fn code(&self) -> Option<&str> {
        self.extensions.get("code")?.as_str()
    }

    /// Converts an error received from the network, tagging it with `code` unless the server
    /// already provided one.
    pub(crate) fn from_network(error: &GraphqlError, code: ErrorCode) -> Self {
        let mut extensions = error.extensions.clone().unwrap_or_default();
        extensions
            .entry("code")
            .or_insert_with(|| Value::String(code.to_string()));

        ResponseError {
            message: error.message.clone(),
            path: error.path.clone().unwrap_or_default(),
            extensions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The transport link failed or dropped the operation.
    TransportError,
    /// The server answered with errors for the operation.
    OperationError,
    /// A client field resolver failed.
    ResolverError,
}
