//! Storage failures surface as 500 envelopes without leaking details.

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use api_ingress::ApiIngress;
use users::contract::model::User;
use users::contract::UsersError;
use users::domain::repo::{RepoResult, UsersRepository};
use users::UsersModule;

const SECRET: &str = "password authentication failed for user \"svc\"";

/// Repository whose every call fails like a dropped database.
struct BrokenRepo;

#[async_trait::async_trait]
impl UsersRepository for BrokenRepo {
    async fn list_all(&self) -> RepoResult<Vec<User>> {
        Err(anyhow!(SECRET).into())
    }

    async fn find_by_id(&self, _id: Uuid) -> RepoResult<Option<User>> {
        Err(anyhow!(SECRET).into())
    }

    async fn email_exists(&self, _email: &str) -> RepoResult<bool> {
        Err(anyhow!(SECRET).into())
    }

    async fn insert(&self, _u: User) -> RepoResult<()> {
        Err(anyhow!(SECRET).into())
    }

    async fn update(&self, _u: User) -> RepoResult<bool> {
        Err(anyhow!(SECRET).into())
    }

    async fn delete(&self, _id: Uuid) -> RepoResult<Option<User>> {
        Err(anyhow!(SECRET).into())
    }
}

fn broken_app() -> Router {
    let module = UsersModule::with_repository(Arc::new(BrokenRepo));
    ApiIngress::default().build_router(module.register_rest(Router::new()))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_default();
    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn every_endpoint_maps_storage_failure_to_500() {
    let app = broken_app();
    let item = format!("/api/users/{}", Uuid::new_v4());
    let valid = json!({ "name": "Nia", "email": "nia@x.io" });

    let cases = [
        ("GET", "/api/users".to_string(), None, "Error fetching users"),
        ("POST", "/api/users".to_string(), Some(valid.clone()), "Error creating user"),
        ("PUT", item.clone(), Some(valid), "Error updating user"),
        ("DELETE", item, None, "Error deleting user"),
    ];

    for (method, uri, body, message) in cases {
        let (status, v) = call(&app, method, &uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert_eq!(v["success"], false);
        assert_eq!(v["message"], message);
        assert!(!v.to_string().contains("password"), "{v}");
    }
}

#[tokio::test]
async fn validation_still_wins_over_a_broken_store() {
    let app = broken_app();
    let (status, v) = call(&app, "POST", "/api/users", Some(json!({ "name": "N" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], "Name and email are required fields");
}

#[tokio::test]
async fn local_client_reports_internal() {
    let module = UsersModule::with_repository(Arc::new(BrokenRepo));
    let err = module.client().list_users().await.unwrap_err();
    assert_eq!(err, UsersError::Internal);
    assert_eq!(err.to_string(), "Internal error");
}
