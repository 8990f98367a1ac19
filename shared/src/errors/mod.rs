//! Error body returned by every failing HTTP endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// JSON error body
///
/// `message` is safe to show to clients. Token rejection details never go
/// here; they are logged server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// One of [`error_codes`]
    pub error: String,

    pub message: String,

    /// Structured context, e.g. the permission a forbidden request lacked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,

    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a detail; values that fail to serialize are dropped
    pub fn add_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.details
                .get_or_insert_with(HashMap::new)
                .insert(key.into(), value);
        }
        self
    }
}

/// Machine-readable codes for [`ErrorResponse::error`]
pub mod error_codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_details() {
        let response = ErrorResponse::new(error_codes::FORBIDDEN, "missing permission")
            .add_detail("required", vec!["sessions:revoke"]);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "FORBIDDEN");
        assert_eq!(json["details"]["required"][0], "sessions:revoke");
    }

    #[test]
    fn test_error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("X", "y")).unwrap();
        assert!(json.get("details").is_none());
    }
}
