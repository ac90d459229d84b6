use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Uniform JSON body used by every endpoint of the service:
/// `{ success, message?, data?, count?, error? }`.
///
/// Absent optional members are omitted from the wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            count: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl<T> Envelope<Vec<T>> {
    /// Successful list envelope; `count` mirrors the number of items.
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self::ok(items).with_count(count)
    }
}

impl Envelope<()> {
    /// Failure envelope without data.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            count: None,
            error: None,
        }
    }
}

/// Axum response wrapper that renders a failure `Envelope` with its status code.
#[derive(Debug, Clone)]
pub struct EnvelopeResponse {
    pub status: StatusCode,
    pub body: Envelope<()>,
}

impl EnvelopeResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Envelope::failure(message),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.body = self.body.with_error(error);
        self
    }
}

impl IntoResponse for EnvelopeResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// Convenience constructors.
pub fn bad_request(message: impl Into<String>) -> EnvelopeResponse {
    EnvelopeResponse::new(StatusCode::BAD_REQUEST, message)
}

pub fn not_found(message: impl Into<String>) -> EnvelopeResponse {
    EnvelopeResponse::new(StatusCode::NOT_FOUND, message)
}

pub fn internal_error(message: impl Into<String>) -> EnvelopeResponse {
    EnvelopeResponse::new(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// 200 OK + envelope
pub fn ok_json<T: Serialize>(envelope: Envelope<T>) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(envelope))
}

/// 201 Created + envelope
pub fn created_json<T: Serialize>(envelope: Envelope<T>) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(envelope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_omits_absent_members() {
        let env = Envelope::ok(json!({"id": 1})).with_message("done");
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v, json!({"success": true, "message": "done", "data": {"id": 1}}));
    }

    #[test]
    fn list_envelope_counts_items() {
        let env = Envelope::list(vec![1, 2, 3]);
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v, json!({"success": true, "count": 3, "data": [1, 2, 3]}));
    }

    #[test]
    fn failure_envelope_has_no_data() {
        let env = Envelope::failure("Route not found").with_error("GET /nope");
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(
            v,
            json!({"success": false, "message": "Route not found", "error": "GET /nope"})
        );
    }

    #[tokio::test]
    async fn envelope_response_sets_status_and_body() {
        let resp = bad_request("Invalid input").with_error("name: too short").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let ct = resp
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert_eq!(ct, "application/json");

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["message"], "Invalid input");
        assert_eq!(v["error"], "name: too short");
    }

    #[test]
    fn convenience_constructors() {
        assert_eq!(bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(
            internal_error("x").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(created_json(Envelope::ok(1)).0, StatusCode::CREATED);
        assert_eq!(ok_json(Envelope::ok(1)).0, StatusCode::OK);
    }
}
