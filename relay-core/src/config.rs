//! Configuration
//!
//! Caches and queues are usable without any configuration. A [`Config`]
//! document only attaches labels, which show up as the `cache` and `queue`
//! fields on every tracing event the instance emits.
//!
//! ```json
//! { "cache": { "label": "session" }, "queue": { "label": "alerts" } }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings for a [`DataCache`](crate::cache::DataCache).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Name used in log output.
    pub label: Option<String>,
}

/// Settings for an [`ActionsQueue`](crate::queue::ActionsQueue).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Name used in log output.
    pub label: Option<String>,
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cache: CacheConfig,
    pub queue: QueueConfig,
}

impl Config {
    /// Parse a configuration document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize this configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) const DEFAULT_CACHE_LABEL: &str = "data_cache";
pub(crate) const DEFAULT_QUEUE_LABEL: &str = "actions_queue";
