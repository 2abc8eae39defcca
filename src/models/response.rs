use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Raw outcome of one HTTP exchange as seen by callers above the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub text: String,
    pub duration_ms: u64,
}

impl ApiResponse {
    pub fn new(status: u16, text: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            status,
            text: text.into(),
            duration_ms,
        }
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// 200 and 202 are the only statuses a running or finished query may return.
    pub fn is_query_status(&self) -> bool {
        matches!(self.status, 200 | 202)
    }

    /// Prefers the `message` field of a JSON error body over the raw text.
    pub fn error_message(&self) -> String {
        serde_json::from_str::<Value>(&self.text)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_status_accepts_only_200_and_202() {
        assert!(ApiResponse::new(200, "{}", 0).is_query_status());
        assert!(ApiResponse::new(202, "{}", 0).is_query_status());
        assert!(!ApiResponse::new(201, "{}", 0).is_query_status());
        assert!(!ApiResponse::new(204, "", 0).is_query_status());
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        let resp = ApiResponse::new(400, r#"{"message": "bad leql"}"#, 0);
        assert_eq!(resp.error_message(), "bad leql");

        let resp = ApiResponse::new(502, "upstream down", 0);
        assert_eq!(resp.error_message(), "upstream down");
    }

    #[test]
    fn test_json_rejects_non_json_body() {
        assert!(ApiResponse::new(200, "<html>", 0).json().is_err());
    }
}
