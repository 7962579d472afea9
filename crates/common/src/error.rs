//! Error types for defi-compare.
//!
//! Every error carries a machine-readable code and a category. The category
//! decides the CLI exit code when an error escapes a command:
//! - `1`: user error (validation, config)
//! - `2`: network or remote failure
//! - `3`: payload the remote returned but we could not read

use serde::Serialize;
use thiserror::Error;

/// Error class: determines exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Network,
    Payload,
    Validation,
    Config,
}

impl ErrorCategory {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Validation => 1,
            ErrorCategory::Config => 1,
            ErrorCategory::Network => 2,
            ErrorCategory::Payload => 3,
        }
    }
}

/// Structured error detail for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub category: ErrorCategory,
}

#[derive(Debug, Error)]
pub enum CompareError {
    /// The remote answered with a non-success status.
    #[error("Failed to fetch {endpoint}: HTTP {status}")]
    Fetch { endpoint: String, status: u16 },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body was not the JSON shape we expected.
    #[error("Unexpected payload from {endpoint}: {message}")]
    Payload { endpoint: String, message: String },

    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CompareError {
    pub fn code(&self) -> &'static str {
        match self {
            CompareError::Fetch { .. } => "FETCH_FAILED",
            CompareError::Network(_) => "NETWORK_ERROR",
            CompareError::Payload { .. } => "UNEXPECTED_PAYLOAD",
            CompareError::UnknownProtocol(_) => "UNKNOWN_PROTOCOL",
            CompareError::Config(_) => "CONFIG_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CompareError::Fetch { .. } | CompareError::Network(_) => ErrorCategory::Network,
            CompareError::Payload { .. } => ErrorCategory::Payload,
            CompareError::UnknownProtocol(_) => ErrorCategory::Validation,
            CompareError::Config(_) => ErrorCategory::Config,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            code: self.code().into(),
            message: self.to_string(),
            category: self.category(),
        }
    }

    /// `{"ok": false, "error": {...}}` envelope, matching successful output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ok": false,
            "error": self.detail(),
        })
    }
}

pub type CompareResult<T> = Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message() {
        let err = CompareError::Fetch {
            endpoint: "/protocols".into(),
            status: 503,
        };
        assert_eq!(err.to_string(), "Failed to fetch /protocols: HTTP 503");
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CompareError::Network("reset".into()).exit_code(), 2);
        assert_eq!(CompareError::UnknownProtocol("Foo".into()).exit_code(), 1);
        assert_eq!(CompareError::Config("bad url".into()).exit_code(), 1);
        let payload = CompareError::Payload {
            endpoint: "/protocols".into(),
            message: "expected array".into(),
        };
        assert_eq!(payload.exit_code(), 3);
    }

    #[test]
    fn test_error_json_format() {
        let err = CompareError::Fetch {
            endpoint: "/tvl/aave".into(),
            status: 404,
        };
        let json = err.to_json();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["code"], "FETCH_FAILED");
        assert_eq!(json["error"]["category"], "network");
    }
}
