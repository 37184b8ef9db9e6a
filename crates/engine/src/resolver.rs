use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::{Map, Value};

use crate::{
    error::{ConfigurationError, ResolverError},
    query::{QueryDocument, Variables},
};

type ResolverFn = dyn Fn(&ResolverContext<'_>) -> Result<Value, ResolverError> + Send + Sync;

/// Resolvers of the `@client` fields, keyed by dotted field path (`user.fullName`).
///
/// Built once and immutable afterwards. Resolvers are plain functions: they cannot reach the
/// network and only see the cache through [`ResolverContext::read_field`].
#[derive(Clone, Default)]
pub struct ClientResolvers {
    fields: Arc<HashMap<String, Arc<ResolverFn>>>,
}

impl ClientResolvers {
    pub fn builder() -> ClientResolversBuilder {
        ClientResolversBuilder::default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    /// Every client field of the document needs a resolver.
    pub fn validate(&self, document: &QueryDocument) -> Result<(), ConfigurationError> {
        match document.client_fields().find(|path| !self.contains(path)) {
            Some(path) => Err(ConfigurationError::MissingResolver { path: path.to_string() }),
            None => Ok(()),
        }
    }

    pub(crate) fn resolve(&self, context: &ResolverContext<'_>) -> Result<Value, ResolverError> {
        match self.fields.get(context.path) {
            Some(resolver) => resolver(context),
            None => Err(ResolverError::new(format!(
                "no resolver registered for the client field '{}'",
                context.path
            ))),
        }
    }
}

impl fmt::Debug for ClientResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths = self.fields.keys().collect::<Vec<_>>();
        paths.sort();
        f.debug_struct("ClientResolvers").field("fields", &paths).finish()
    }
}

#[derive(Default)]
pub struct ClientResolversBuilder {
    fields: HashMap<String, Arc<ResolverFn>>,
}

impl ClientResolversBuilder {
    /// Registers the resolver of a field. A second registration for the same path replaces
    /// the first one.
    #[must_use]
    pub fn field<F>(mut self, path: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&ResolverContext<'_>) -> Result<Value, ResolverError> + Send + Sync + 'static,
    {
        self.fields.insert(path.into(), Arc::new(resolver));
        self
    }

    pub fn build(self) -> ClientResolvers {
        ClientResolvers {
            fields: Arc::new(self.fields),
        }
    }
}

/// Read access to cached root fields.
pub(crate) trait CacheLookup {
    fn read_field(&self, path: &str) -> Option<Value>;
}

/// Everything a client field resolver can look at.
pub struct ResolverContext<'a> {
    path: &'a str,
    arguments: &'a str,
    parent: Option<&'a Map<String, Value>>,
    variables: &'a Variables,
    cache: &'a dyn CacheLookup,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(
        path: &'a str,
        arguments: &'a str,
        parent: Option<&'a Map<String, Value>>,
        variables: &'a Variables,
        cache: &'a dyn CacheLookup,
    ) -> Self {
        ResolverContext {
            path,
            arguments,
            parent,
            variables,
            cache,
        }
    }

    /// Dotted path of the field being resolved.
    pub fn path(&self) -> &'a str {
        self.path
    }

    /// Field arguments as written in the query, e.g. `(format: "long")`. Empty without arguments.
    pub fn arguments(&self) -> &'a str {
        self.arguments
    }

    /// Network data of the object holding the field, `None` when that object has no network
    /// part or the network call failed.
    pub fn parent(&self) -> Option<&'a Map<String, Value>> {
        self.parent
    }

    pub fn variables(&self) -> &'a Variables {
        self.variables
    }

    /// Reads a cached value by dotted path, e.g. `user.name` or `users.0.name`.
    pub fn read_field(&self, path: &str) -> Option<Value> {
        self.cache.read_field(path)
    }
}
