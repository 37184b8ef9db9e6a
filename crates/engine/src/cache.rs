use std::{collections::HashMap, sync::Arc};

use client_runtime::GraphqlResponse;
use serde_json::Value;

use crate::Fingerprint;

/// Network results of previous executions.
///
/// Keyed by fingerprint, with a second view over root fields so client resolvers can read
/// individual values. Freshness is binary: an entry is usable until it is invalidated.
///
/// The root field view only knows response keys, not arguments: `user(id: 1)` and
/// `user(id: 2)` share the `user` key. Its values are stacked per key, the most recent write
/// is read and invalidating it uncovers the previous one.
#[derive(Default)]
pub(crate) struct ResultCache {
    key_to_entry: HashMap<Fingerprint, CacheEntry>,
    root_fields: HashMap<String, Vec<RootField>>,
    next_version: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub response: Arc<GraphqlResponse>,
    /// Increases with every write, the most recent resolution wins.
    pub version: u64,
}

struct RootField {
    value: Value,
    owner: Fingerprint,
}

impl ResultCache {
    pub fn get(&self, key: &Fingerprint) -> Option<&CacheEntry> {
        self.key_to_entry.get(key)
    }

    pub fn put(&mut self, key: Fingerprint, response: Arc<GraphqlResponse>) -> u64 {
        self.next_version += 1;
        let version = self.next_version;

        if let Some(data) = &response.data {
            for (name, value) in data {
                let stack = self.root_fields.entry(name.clone()).or_default();
                stack.retain(|field| field.owner != key);
                stack.push(RootField {
                    value: value.clone(),
                    owner: key.clone(),
                });
            }
        }

        self.key_to_entry.insert(key, CacheEntry { response, version });
        version
    }

    pub fn invalidate(&mut self, key: &Fingerprint) -> bool {
        self.root_fields.retain(|_, stack| {
            stack.retain(|field| &field.owner != key);
            !stack.is_empty()
        });
        self.key_to_entry.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.key_to_entry.clear();
        self.root_fields.clear();
    }

    /// Reads a cached value by dotted path starting at a root field, e.g. `user.name`.
    pub fn read_field(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let root = segments.next()?;
        let mut value = &self.root_fields.get(root)?.last()?.value;

        for segment in segments {
            value = match value {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(value)
    }
}
