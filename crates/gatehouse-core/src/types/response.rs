//! The `{code, message, data}` response envelope.

use serde::{Deserialize, Serialize};

/// Envelope code for a successful operation.
pub const CODE_SUCCESS: i32 = 1;
/// Envelope code for a failed operation.
pub const CODE_FAILURE: i32 = 0;

/// Standard response envelope used by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestResponse<T = serde_json::Value> {
    /// `1` on success, `0` on failure.
    pub code: i32,
    /// Human-readable outcome.
    pub message: String,
    /// Optional payload.
    pub data: Option<T>,
}

impl<T> RestResponse<T> {
    /// Successful response carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: CODE_SUCCESS,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Successful response without a payload.
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            code: CODE_SUCCESS,
            message: message.into(),
            data: None,
        }
    }

    /// Failure response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            code: CODE_FAILURE,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_serializes_null_data() {
        let body = serde_json::to_value(RestResponse::<String>::failure("forbidden")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"code": 0, "message": "forbidden", "data": null})
        );
    }

    #[test]
    fn ok_carries_payload() {
        let body = RestResponse::ok("read resource successfully", "resource");
        assert_eq!(body.code, CODE_SUCCESS);
        assert_eq!(body.data, Some("resource"));
    }
}
