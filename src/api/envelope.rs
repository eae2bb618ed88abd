use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of every API response, success or failure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub status_code: u16,
    pub is_success: bool,
    #[serde(default)]
    pub error_messages: Vec<String>,
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<HashMap<String, String>>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(status_code: u16, result: Option<T>) -> Self {
        Self {
            status_code,
            is_success: true,
            error_messages: vec![],
            result,
            error_code: None,
            field_errors: None,
        }
    }

    pub fn failure(status_code: u16, messages: Vec<String>) -> Self {
        Self {
            status_code,
            is_success: false,
            error_messages: messages,
            result: None,
            error_code: None,
            field_errors: None,
        }
    }

    /// First error message, if any
    pub fn first_error(&self) -> Option<&str> {
        self.error_messages.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_uses_camel_case_keys() {
        let body = serde_json::to_value(ApiEnvelope::success(200, Some(json!({"id": 1})))).unwrap();
        assert_eq!(
            body,
            json!({"statusCode": 200, "isSuccess": true, "errorMessages": [], "result": {"id": 1}})
        );
    }

    #[test]
    fn decodes_bodies_without_result() {
        let env: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"statusCode":404,"isSuccess":false,"errorMessages":["Villa not found"]}"#)
                .unwrap();
        assert!(env.result.is_none());
        assert_eq!(env.first_error(), Some("Villa not found"));
    }
}
