use std::time::Duration;

use client_runtime::{GraphqlResponse, Operation, OperationId, OperationReply, TransportError, TransportLink};
use futures_util::{stream::BoxStream, StreamExt};
use serde_json::Value;
use url::Url;

/// Sends every batch as a single HTTP POST carrying a JSON array of GraphQL requests.
///
/// The server must answer with a JSON array of responses in request order. That order is
/// turned back into operation ids here, the engine never relies on it.
#[derive(Clone)]
pub struct BatchHttpLink {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEntry<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<&'a str>,
    query: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    variables: &'a Value,
}

impl BatchHttpLink {
    pub fn new(url: Url) -> Self {
        BatchHttpLink {
            client: reqwest::Client::new(),
            url,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn post(
        client: reqwest::Client,
        url: Url,
        timeout: Duration,
        operations: Vec<Operation>,
    ) -> Result<Vec<OperationReply>, TransportError> {
        let body = operations
            .iter()
            .map(|operation| BatchEntry {
                operation_name: operation.name.as_deref(),
                query: &operation.query,
                variables: &operation.variables,
            })
            .collect::<Vec<_>>();

        tracing::debug!(url = %url, batch_size = operations.len(), "sending batch");

        let response = client
            .post(url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(TransportError::request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let responses: Vec<GraphqlResponse> = response
            .json()
            .await
            .map_err(|err| TransportError::InvalidResponse(err.to_string()))?;

        if responses.len() != operations.len() {
            return Err(TransportError::InvalidResponse(format!(
                "expected {} responses, received {}",
                operations.len(),
                responses.len()
            )));
        }

        Ok(operations
            .iter()
            .map(|operation| operation.id)
            .zip(responses)
            .map(|(id, response)| OperationReply { id, response })
            .collect())
    }
}

impl TransportLink for BatchHttpLink {
    fn send(&self, operations: Vec<Operation>) -> BoxStream<'static, Result<OperationReply, TransportError>> {
        let ids = operations.iter().map(|operation| operation.id).collect::<Vec<OperationId>>();
        let request = Self::post(self.client.clone(), self.url.clone(), self.timeout, operations);

        futures_util::stream::once(request)
            .flat_map(move |result| {
                let items = match result {
                    Ok(replies) => replies.into_iter().map(Ok).collect(),
                    Err(error) => {
                        tracing::error!(batch = ?ids, "batch request failed: {error}");
                        vec![Err(error)]
                    }
                };
                futures_util::stream::iter(items)
            })
            .boxed()
    }
}
