use client_runtime::GraphqlResponse;
use serde_json::{Map, Value};

use super::{ErrorCode, Response, ResponseError};
use crate::{
    error::NetworkError,
    query::{Field, FieldSource, QueryPlan, Selection, Variables},
    resolver::{CacheLookup, ClientResolvers, ResolverContext},
};

/// What became of the network part of a query.
#[derive(Clone, Copy)]
pub(crate) enum NetworkPart<'a> {
    /// The query only has client fields.
    Absent,
    Resolved(&'a GraphqlResponse),
    Failed(&'a NetworkError),
}

/// Merges network data and client field values into the response the caller asked for.
///
/// A network failure leaves the client fields untouched: they are resolved as usual and the
/// network fields are null.
pub(crate) fn build_response(
    plan: &QueryPlan,
    network: NetworkPart<'_>,
    resolvers: &ClientResolvers,
    variables: &Variables,
    cache: &dyn CacheLookup,
) -> Response {
    let mut errors = Vec::new();

    let root = match network {
        NetworkPart::Absent => None,
        NetworkPart::Resolved(response) => {
            errors.extend(
                response
                    .errors
                    .iter()
                    .map(|error| ResponseError::from_network(error, ErrorCode::OperationError)),
            );
            Some(response.data.as_ref())
        }
        NetworkPart::Failed(error) => {
            errors.extend(network_errors(error));
            None
        }
    };

    if root.is_none() && plan.client_paths.is_empty() {
        return Response { data: None, errors };
    }

    let mut builder = ResponseBuilder {
        resolvers,
        variables,
        cache,
        errors,
        response_path: Vec::new(),
        field_path: Vec::new(),
    };

    let mut data = Map::new();
    builder.selection_set(&plan.selection_set, root.flatten(), &mut data);

    Response {
        data: Some(data),
        errors: builder.errors,
    }
}

fn network_errors(error: &NetworkError) -> Vec<ResponseError> {
    match error {
        NetworkError::Operation(errors) => errors
            .iter()
            .map(|error| ResponseError::from_network(error, ErrorCode::OperationError))
            .collect(),
        NetworkError::Transport(_) | NetworkError::Canceled => {
            vec![ResponseError::new(error.to_string(), Vec::new(), ErrorCode::TransportError)]
        }
    }
}

struct ResponseBuilder<'a> {
    resolvers: &'a ClientResolvers,
    variables: &'a Variables,
    cache: &'a dyn CacheLookup,
    errors: Vec<ResponseError>,
    response_path: Vec<Value>,
    field_path: Vec<&'a str>,
}

impl<'a> ResponseBuilder<'a> {
    /// Fills `output` with the fields of `selection_set`. `parent` is the object the fields are
    /// read from: network data, or the value a client resolver returned.
    fn selection_set(
        &mut self,
        selection_set: &'a [Selection],
        parent: Option<&Map<String, Value>>,
        output: &mut Map<String, Value>,
    ) {
        for selection in selection_set {
            match selection {
                Selection::Field(field) => {
                    self.response_path.push(Value::String(field.response_key().to_string()));
                    self.field_path.push(&field.name);

                    let value = self.field(field, parent);
                    insert_merged(output, field.response_key(), value);

                    self.field_path.pop();
                    self.response_path.pop();
                }
                Selection::InlineFragment(fragment) => {
                    if type_condition_matches(fragment.type_condition.as_deref(), parent) {
                        self.selection_set(&fragment.selection_set, parent, output);
                    }
                }
            }
        }
    }

    fn field(&mut self, field: &'a Field, parent: Option<&Map<String, Value>>) -> Value {
        match field.source {
            FieldSource::Network | FieldSource::Projected => {
                let value = parent.and_then(|parent| {
                    parent
                        .get(field.response_key())
                        .or_else(|| parent.get(&field.name))
                });
                match value {
                    Some(value) => self.complete(&field.selection_set, value),
                    None => Value::Null,
                }
            }
            FieldSource::Client => {
                let path = self.field_path.join(".");
                let context = ResolverContext::new(&path, &field.arguments, parent, self.variables, self.cache);

                match self.resolvers.resolve(&context) {
                    Ok(value) => self.complete(&field.selection_set, &value),
                    Err(error) => {
                        tracing::debug!(field = %path, %error, "client resolver failed");
                        self.errors.push(ResponseError::new(
                            error.message,
                            self.response_path.clone(),
                            ErrorCode::ResolverError,
                        ));
                        Value::Null
                    }
                }
            }
            FieldSource::Local => {
                let mut object = Map::new();
                self.selection_set(&field.selection_set, None, &mut object);
                Value::Object(object)
            }
        }
    }

    /// Applies the sub-selection of a field to the value it resolved to.
    fn complete(&mut self, selection_set: &'a [Selection], value: &Value) -> Value {
        if selection_set.is_empty() {
            return value.clone();
        }

        match value {
            Value::Object(object) => {
                let mut output = Map::new();
                self.selection_set(selection_set, Some(object), &mut output);
                Value::Object(output)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.response_path.push(Value::from(index));
                        let item = self.complete(selection_set, item);
                        self.response_path.pop();
                        item
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// The printed network query requests `__typename` next to type conditions. Objects without it
/// (client values, local fields) match every condition.
fn type_condition_matches(type_condition: Option<&str>, parent: Option<&Map<String, Value>>) -> bool {
    let typename = parent
        .and_then(|parent| parent.get("__typename"))
        .and_then(Value::as_str);

    match (type_condition, typename) {
        (Some(condition), Some(typename)) => condition == typename,
        _ => true,
    }
}

/// The same response key may be selected more than once, through fragments. Objects are merged.
fn insert_merged(output: &mut Map<String, Value>, key: &str, value: Value) {
    let Some(existing) = output.get_mut(key) else {
        output.insert(key.to_string(), value);
        return;
    };

    match (existing, value) {
        (Value::Object(existing), Value::Object(object)) => {
            for (key, value) in object {
                insert_merged(existing, &key, value);
            }
        }
        (existing, value) => {
            if !value.is_null() || existing.is_null() {
                *existing = value;
            }
        }
    }
}
