use std::time::Duration;

/// How network-bound operations are coalesced before being handed to the transport link.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchingConfig {
    /// When disabled, every operation is sent on its own as soon as it is enqueued.
    pub enabled: bool,
    /// Coalescing window, measured from the first operation entering an empty batch.
    /// The window is not extended by later operations. Defaults to 10ms.
    #[serde(deserialize_with = "duration_str::deserialize_duration")]
    pub interval: Duration,
    /// A batch reaching this many operations is flushed without waiting for the window.
    pub max_size: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_millis(10),
            max_size: 10,
        }
    }
}
