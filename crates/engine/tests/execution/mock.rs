use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use client_runtime::{GraphqlResponse, Operation, OperationId, OperationReply, TransportError, TransportLink};
use futures::{
    stream::{self, BoxStream},
    StreamExt,
};
use serde_json::Value;

/// Batched link with scripted responses per operation name, recording every operation it
/// receives.
#[derive(Clone, Default)]
pub struct MockLink {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    batches: Vec<Vec<Operation>>,
    responses: HashMap<String, GraphqlResponse>,
    latency: Duration,
    reversed: bool,
    failure: Option<TransportError>,
    unanswered: Vec<String>,
    orphan_reply: bool,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_data(self, operation: &str, data: Value) -> Self {
        let Value::Object(data) = data else {
            unreachable!("data must be an object")
        };
        self.with_response(operation, GraphqlResponse::data(data))
    }

    pub fn with_response(self, operation: &str, response: GraphqlResponse) -> Self {
        self.state().responses.insert(operation.to_string(), response);
        self
    }

    /// Time between receiving a batch and sending its first reply.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state().latency = latency;
        self
    }

    /// Replies in reverse submission order.
    pub fn reversed(self) -> Self {
        self.state().reversed = true;
        self
    }

    pub fn failing(self, error: TransportError) -> Self {
        self.state().failure = Some(error);
        self
    }

    pub fn without_reply_for(self, operation: &str) -> Self {
        self.state().unanswered.push(operation.to_string());
        self
    }

    /// Adds a reply for an operation id that was never sent.
    pub fn with_orphan_reply(self) -> Self {
        self.state().orphan_reply = true;
        self
    }

    /// Names of every operation sent, in dispatch order.
    pub fn performed(&self) -> Vec<String> {
        self.batches().into_iter().flatten().collect()
    }

    /// Operation names grouped per transport call.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.state()
            .batches
            .iter()
            .map(|batch| batch.iter().map(operation_name).collect())
            .collect()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.state().batches.iter().flatten().cloned().collect()
    }
}

fn operation_name(operation: &Operation) -> String {
    operation.name.clone().unwrap_or_else(|| "anonymous".to_string())
}

impl TransportLink for MockLink {
    fn send(&self, operations: Vec<Operation>) -> BoxStream<'static, Result<OperationReply, TransportError>> {
        let mut state = self.state();
        state.batches.push(operations.clone());

        let replies = match &state.failure {
            Some(error) => vec![Err(error.clone())],
            None => {
                let mut replies = operations
                    .iter()
                    .filter(|operation| !state.unanswered.contains(&operation_name(operation)))
                    .map(|operation| {
                        let response = state
                            .responses
                            .get(&operation_name(operation))
                            .cloned()
                            .unwrap_or_else(|| GraphqlResponse::data(Default::default()));
                        Ok(OperationReply {
                            id: operation.id,
                            response,
                        })
                    })
                    .collect::<Vec<_>>();

                if state.orphan_reply {
                    replies.insert(
                        0,
                        Ok(OperationReply {
                            id: OperationId(u64::MAX),
                            response: GraphqlResponse::default(),
                        }),
                    );
                }
                if state.reversed {
                    replies.reverse();
                }
                replies
            }
        };

        let latency = state.latency;
        drop(state);

        stream::once(async move {
            tokio::time::sleep(latency).await;
            stream::iter(replies)
        })
        .flatten()
        .boxed()
    }
}
