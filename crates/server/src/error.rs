//! Errors raised by the tool layer itself.
//!
//! Worker and store failures arrive as `swcache_core::Error` and convert
//! directly; these cover what only the host surface can get wrong.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid tool parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No current store holds an entry for the URL.
    #[error("CACHE_MISS: {0}")]
    NotCached(String),

    /// Tool output could not be serialized.
    #[error("INTERNAL: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) => -32602,
            ToolError::NotCached(_) => -32004,
            ToolError::Serialize(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
