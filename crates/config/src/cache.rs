/// Where the engine is allowed to look for the result of a query.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FetchPolicy {
    /// Use a cached result when present, otherwise go to the network.
    #[default]
    CacheFirst,
    /// Always go to the network, then store the result.
    NetworkOnly,
    /// Never go to the network.
    CacheOnly,
    /// Always go to the network and leave the cache untouched.
    NoCache,
}

impl FetchPolicy {
    pub fn reads_cache(self) -> bool {
        matches!(self, FetchPolicy::CacheFirst | FetchPolicy::CacheOnly)
    }

    pub fn writes_cache(self) -> bool {
        matches!(self, FetchPolicy::CacheFirst | FetchPolicy::NetworkOnly)
    }

    pub fn uses_network(self) -> bool {
        !matches!(self, FetchPolicy::CacheOnly)
    }
}

#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Policy used when a query is executed without explicit options.
    pub default_fetch_policy: FetchPolicy,
}
