//! Error types for the AskDocs client

use std::fmt;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Backend operation an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Document upload (`POST /api/upload`)
    Upload,
    /// Question answering (`POST /api/query`)
    Query,
    /// Liveness check (`GET /api/health`)
    Health,
    /// Index listing (`GET /api/documents`)
    ListDocuments,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Upload => "Upload",
            Operation::Query => "Query",
            Operation::Health => "Health check",
            Operation::ListDocuments => "Document listing",
        };
        f.write_str(name)
    }
}

/// Client errors
#[derive(Debug, Error)]
pub enum Error {
    /// Blank input rejected before any request was built
    #[error("Please enter {0}")]
    EmptyInput(String),

    /// Transport failure, no HTTP response was received
    #[error("{operation} failed (network error: {reason})")]
    Network { operation: Operation, reason: String },

    /// Non-2xx response; `detail` is shown to the user verbatim
    #[error("{detail}")]
    Backend {
        operation: Operation,
        status: u16,
        detail: String,
    },

    /// Request could not be built locally; nothing was sent
    #[error("Could not prepare {operation} request: {message}")]
    Request { operation: Operation, message: String },

    /// 2xx response whose body does not match the endpoint schema
    #[error("{operation} returned an unreadable response: {message}")]
    Decode { operation: Operation, message: String },

    /// A query is already pending
    #[error("A query is already in progress")]
    QueryInFlight,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an empty-input error naming what was missing
    pub fn empty_input(what: impl Into<String>) -> Self {
        Self::EmptyInput(what.into())
    }

    /// Create a network error
    pub fn network(operation: Operation, reason: impl fmt::Display) -> Self {
        Self::Network {
            operation,
            reason: reason.to_string(),
        }
    }

    /// Create a backend error
    pub fn backend(operation: Operation, status: u16, detail: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            status,
            detail: detail.into(),
        }
    }

    /// Create a request-construction error
    pub fn request(operation: Operation, message: impl fmt::Display) -> Self {
        Self::Request {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a decode error
    pub fn decode(operation: Operation, message: impl fmt::Display) -> Self {
        Self::Decode {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Message suitable for an upload log line or an errored session
    ///
    /// Network failures collapse to a generic per-operation message; the
    /// transport reason is only kept in the `Display` output and logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network { operation, .. } => format!("{} failed", operation),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detail_is_verbatim() {
        let err = Error::backend(Operation::Query, 500, "Query failed: index missing");
        assert_eq!(err.to_string(), "Query failed: index missing");
        assert_eq!(err.user_message(), "Query failed: index missing");
    }

    #[test]
    fn test_network_message_is_generic() {
        let err = Error::network(Operation::Upload, "connection refused");
        assert_eq!(err.user_message(), "Upload failed");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_request_error_is_not_reported_as_failed_upload() {
        let err = Error::request(Operation::Upload, "invalid mime type");
        assert_eq!(err.user_message(), "Could not prepare Upload request: invalid mime type");
    }

    #[test]
    fn test_empty_input_message() {
        let err = Error::empty_input("a question");
        assert_eq!(err.to_string(), "Please enter a question");
    }
}
