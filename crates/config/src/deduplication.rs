#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeduplicationConfig {
    /// Share a single network call between identical queries that are in flight at the same time.
    pub enabled: bool,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
