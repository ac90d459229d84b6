use axum::{
    extract::Request,
    http::{header, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use modkit::api::{not_found, EnvelopeResponse};
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Catch-all for unknown paths and unsupported methods on known paths.
pub async fn route_not_found(method: Method, uri: Uri) -> EnvelopeResponse {
    tracing::debug!(%method, path = %uri.path(), "No route matched");
    not_found("Route not found")
}

/// Rewrites bodies produced by the timeout and body-limit layers into failure envelopes.
///
/// Responses that already carry JSON pass through untouched.
pub async fn envelope_layer_rejections(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let message = match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => "Request body too large",
        StatusCode::REQUEST_TIMEOUT => "Request timed out",
        _ => return response,
    };
    if is_json_response(&response) {
        return response;
    }

    tracing::debug!(status = %response.status(), "Wrapping middleware rejection in envelope");
    EnvelopeResponse::new(response.status(), message).into_response()
}

fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}
