mod plan;
mod print;

use std::{collections::BTreeSet, fmt, str::FromStr, sync::Arc};

use serde_json::Value;

use crate::error::QueryError;

pub(crate) use plan::{Field, FieldSource, QueryPlan, Selection};

/// A parsed and planned query document, cheap to clone.
#[derive(Clone)]
pub struct QueryDocument {
    inner: Arc<DocumentInner>,
}

struct DocumentInner {
    plan: QueryPlan,
    network_query: Option<String>,
}

impl QueryDocument {
    /// Parses a document holding a single operation.
    pub fn parse(document: &str) -> Result<Self, QueryError> {
        Self::parse_operation(document, None)
    }

    /// Parses a document and selects one of its operations by name.
    pub fn parse_operation(document: &str, operation_name: Option<&str>) -> Result<Self, QueryError> {
        let document =
            cynic_parser::parse_executable_document(document).map_err(|err| QueryError::Parse(err.to_string()))?;
        let plan = QueryPlan::build(&document, operation_name)?;
        let network_query = print::network_query(&plan);

        Ok(QueryDocument {
            inner: Arc::new(DocumentInner { plan, network_query }),
        })
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.inner.plan.operation_name.as_deref()
    }

    /// The query sent over the network, `None` when every field is resolved locally.
    pub fn network_query(&self) -> Option<&str> {
        self.inner.network_query.as_deref()
    }

    /// Dotted paths of the fields marked `@client`.
    pub fn client_fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.plan.client_paths.iter().map(String::as_str)
    }

    /// Variables referenced by the network query. Variables only client fields use are
    /// neither sent nor part of the fingerprint.
    pub fn network_variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.plan.network_variables.iter().map(String::as_str)
    }

    pub(crate) fn plan(&self) -> &QueryPlan {
        &self.inner.plan
    }
}

impl FromStr for QueryDocument {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for QueryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDocument")
            .field("operation_name", &self.operation_name())
            .field("network_query", &self.network_query())
            .field("client_fields", &self.inner.plan.client_paths)
            .finish()
    }
}

/// Variables of a query. Key order never matters for deduplication.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Variables(serde_json::Map<String, Value>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn to_value(&self) -> Value {
        if self.0.is_empty() {
            Value::Null
        } else {
            Value::Object(self.0.clone())
        }
    }

    /// The variables among `names`, missing ones are left out.
    pub(crate) fn restricted_to(&self, names: &BTreeSet<String>) -> Variables {
        Variables(
            self.0
                .iter()
                .filter(|(name, _)| names.contains(name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    /// JSON text with object keys sorted at every level.
    pub(crate) fn canonical(&self) -> String {
        canonicalize(&Value::Object(self.0.clone())).to_string()
    }
}

impl From<serde_json::Map<String, Value>> for Variables {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Variables(map)
    }
}

impl TryFrom<Value> for Variables {
    type Error = QueryError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Variables::default()),
            Value::Object(map) => Ok(Variables(map)),
            _ => Err(QueryError::InvalidVariables),
        }
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries = map.iter().collect::<Vec<_>>();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), canonicalize(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// A query document bound to its variables: the unit the engine executes.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    document: QueryDocument,
    variables: Variables,
}

impl QueryDescriptor {
    pub fn new(document: QueryDocument) -> Self {
        QueryDescriptor {
            document,
            variables: Variables::default(),
        }
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn document(&self) -> &QueryDocument {
        &self.document
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// The variables the network query needs.
    pub(crate) fn network_variables(&self) -> Variables {
        self.variables.restricted_to(&self.document.plan().network_variables)
    }
}

impl From<QueryDocument> for QueryDescriptor {
    fn from(document: QueryDocument) -> Self {
        QueryDescriptor::new(document)
    }
}
