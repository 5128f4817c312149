//! Response envelope shared by every endpoint

use axum::{http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

/// `{code, success, data?, message?, error?, timestamp}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unix seconds
    pub timestamp: i64,
}

impl<T> Envelope<T> {
    pub fn success(status: StatusCode, data: T) -> Self {
        Self {
            code: status.as_u16(),
            success: true,
            data: Some(data),
            message: Some("success".to_string()),
            error: None,
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn failure(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// 200 with data
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope::success(StatusCode::OK, data))
}

/// 201 with data
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::success(StatusCode::CREATED, data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_omits_data() {
        let json = serde_json::to_value(Envelope::<()>::failure(StatusCode::NOT_FOUND, "gone")).unwrap();
        assert_eq!(json["code"], 404);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "gone");
        assert!(json.get("data").is_none());
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_success_carries_data() {
        let json = serde_json::to_value(Envelope::success(StatusCode::OK, vec![1, 2])).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert!(json.get("error").is_none());
    }
}
