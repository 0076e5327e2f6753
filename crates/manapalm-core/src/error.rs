use bytes::Bytes;
use http::StatusCode;

use manapalm_protocol::downstream::ErrorBody;

/// Shown to end users next to the raw error when generation fails outright.
pub const RETRY_SUGGESTION: &str =
    "سرویس هوش مصنوعی موقتاً در دسترس نیست. لطفاً چند لحظه دیگر دوباره تلاش کنید.";

#[derive(Debug)]
pub struct ProxyError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ProxyError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::new(message),
        }
    }

    /// The request body could not be read (too large, aborted mid-stream).
    pub fn unreadable_body(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::new(message),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            body: ErrorBody::new("Method not allowed"),
        }
    }

    /// Both the primary and (when attempted) the fallback provider failed.
    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody::new(message).with_suggestion(RETRY_SUGGESTION),
        }
    }

    pub fn body_bytes(&self) -> Bytes {
        // ErrorBody is two strings; serialization cannot fail.
        serde_json::to_vec(&self.body)
            .map(Bytes::from)
            .unwrap_or_else(|_| Bytes::from_static(br#"{"error":"internal error"}"#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failure_carries_raw_message_and_suggestion() {
        let err = ProxyError::generation_failed("upstream returned HTTP 503");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(&err.body_bytes()).unwrap();
        assert_eq!(body["error"], "upstream returned HTTP 503");
        assert_eq!(body["suggestion"], RETRY_SUGGESTION);
    }

    #[test]
    fn method_not_allowed_has_no_suggestion() {
        let err = ProxyError::method_not_allowed();
        let body: serde_json::Value = serde_json::from_slice(&err.body_bytes()).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Method not allowed"}));
    }
}
