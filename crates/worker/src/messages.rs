//! Page-to-worker control messages.
//!
//! Messages are JSON objects tagged by `type`. Anything that doesn't parse
//! into a known command is dropped without a reply.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate the waiting worker now.
    SkipWaiting,
    GetVersion,
    /// Delete every store, current or not.
    ClearCache,
    /// Fetch and store `urls` into the dynamic store.
    CacheUrls { urls: Vec<String> },
}

impl ControlMessage {
    /// Parse a posted message; `None` for unknown or malformed ones.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value.clone()) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring message");
                None
            }
        }
    }
}

/// Reply posted back on the message port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum MessageReply {
    Version {
        version: String,
    },
    Done {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl MessageReply {
    pub fn success() -> Self {
        MessageReply::Done { success: true, error: None }
    }

    pub fn failure(error: impl ToString) -> Self {
        MessageReply::Done { success: false, error: Some(error.to_string()) }
    }
}
