//! Error types for the MCP server.
//!
//! Maps upstream HTTP, query engine and resolver failures to MCP-friendly error responses.

use serde::{Deserialize, Serialize};

/// MCP server errors.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum McpError {
    /// A search or lookup returned zero candidates.
    #[error("not found: {0}")]
    NotFound(String),

    /// An expected token is missing from an otherwise successful upstream response.
    #[error("parse error: {0}")]
    Parse(String),

    /// An upstream response does not have the expected shape.
    #[error("unexpected upstream response: {0}")]
    UpstreamFormat(String),

    /// Transport failure or non-success status from an upstream service.
    #[error("http error: {0}")]
    Http(String),

    /// Failure inside the analytic query engine.
    #[error("query error: {0}")]
    Query(String),

    /// Unknown tool requested.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// Invalid argument value.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// JSON-RPC protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Protocol(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        McpError::Http(err.to_string())
    }
}

impl From<duckdb::Error> for McpError {
    fn from(err: duckdb::Error) -> Self {
        McpError::Query(err.to_string())
    }
}

impl From<tokio::task::JoinError> for McpError {
    fn from(err: tokio::task::JoinError) -> Self {
        McpError::Internal(format!("task failed: {}", err))
    }
}

/// JSON-RPC error codes.
pub mod rpc_codes {
    /// Parse error - Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl McpError {
    /// Convert to JSON-RPC error code.
    pub fn rpc_code(&self) -> i32 {
        match self {
            McpError::UnknownTool(_) => rpc_codes::METHOD_NOT_FOUND,
            McpError::MissingArg(_) | McpError::InvalidArg { .. } | McpError::NotFound(_) => {
                rpc_codes::INVALID_PARAMS
            }
            McpError::Protocol(_) => rpc_codes::INVALID_REQUEST,
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }

    /// Stable machine-readable error kind, sent as JSON-RPC error data.
    pub fn kind(&self) -> &'static str {
        match self {
            McpError::NotFound(_) => "NOT_FOUND",
            McpError::Parse(_) => "PARSE_ERROR",
            McpError::UpstreamFormat(_) => "UPSTREAM_FORMAT",
            McpError::Http(_) => "HTTP_ERROR",
            McpError::Query(_) => "QUERY_ERROR",
            McpError::UnknownTool(_) => "UNKNOWN_TOOL",
            McpError::MissingArg(_) => "MISSING_ARG",
            McpError::InvalidArg { .. } => "INVALID_ARG",
            McpError::Protocol(_) => "PROTOCOL_ERROR",
            McpError::Io(_) => "IO_ERROR",
            McpError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_invalid_params() {
        let err = McpError::NotFound("no candidates for 'Bern'".to_string());
        assert_eq!(err.rpc_code(), rpc_codes::INVALID_PARAMS);
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[test]
    fn test_upstream_errors_are_internal() {
        assert_eq!(
            McpError::UpstreamFormat("missing key".to_string()).rpc_code(),
            rpc_codes::INTERNAL_ERROR
        );
        assert_eq!(
            McpError::Parse("no digits".to_string()).rpc_code(),
            rpc_codes::INTERNAL_ERROR
        );
    }

    #[test]
    fn test_display_includes_argument_name() {
        let err = McpError::InvalidArg {
            name: "egrid".to_string(),
            reason: "must start with 'CH'".to_string(),
        };
        assert_eq!(err.to_string(), "invalid argument 'egrid': must start with 'CH'");
    }
}
