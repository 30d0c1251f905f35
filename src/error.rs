//! Error types for ocapi-tools

use std::io;

use thiserror::Error;

/// Result type alias for ocapi-tools
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the dispatch engine and its collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool name not present in the endpoint registry
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// Missing or malformed tool argument
    #[error("{0}")]
    Validation(String),

    /// Descriptor declares a verb the dispatcher cannot send
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Capability gate closed, no dispatcher available
    #[error("Data API client not initialized. {0}")]
    ClientNotInitialized(String),

    /// Network or API failure (including non-2xx responses)
    #[error("{0}")]
    Transport(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Envelope status code reported for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownEndpoint(_) | Self::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Convert to JSON-RPC error code
    #[must_use]
    pub fn to_rpc_code(&self) -> i32 {
        match self {
            Self::Json(_) => rpc_codes::PARSE_ERROR,
            Self::Protocol(_) => rpc_codes::INVALID_REQUEST,
            Self::UnknownEndpoint(_) => rpc_codes::METHOD_NOT_FOUND,
            Self::Validation(_) => rpc_codes::INVALID_PARAMS,
            Self::Transport(_) | Self::Http(_) | Self::ClientNotInitialized(_) => {
                rpc_codes::SERVER_ERROR_START
            }
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }
}

/// Standard JSON-RPC error codes
pub mod rpc_codes {
    /// Parse error - Invalid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - Not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Server error range start
    pub const SERVER_ERROR_START: i32 = -32000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_endpoint_message_and_status() {
        let err = Error::UnknownEndpoint("get_widgets".to_string());
        assert_eq!(err.to_string(), "Unknown endpoint: get_widgets");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_rpc_code(), rpc_codes::METHOD_NOT_FOUND);
    }

    #[test]
    fn unsupported_method_is_server_side() {
        let err = Error::UnsupportedMethod("TRACE".to_string());
        assert_eq!(err.to_string(), "Unsupported HTTP method: TRACE");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn transport_error_keeps_message_verbatim() {
        let err = Error::Transport("API returned 404 Not Found: {}".to_string());
        assert_eq!(err.to_string(), "API returned 404 Not Found: {}");
        assert_eq!(err.status_code(), 500);
    }
}
