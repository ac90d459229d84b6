use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    Extension, Json,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use modkit::api::{bad_request, created_json, ok_json, Envelope, EnvelopeResponse};

use crate::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use crate::api::rest::error::{map_domain_error, Operation, MSG_INVALID_ID};
use crate::domain::service::Service;

type EnvelopeJson<T> = (StatusCode, Json<Envelope<T>>);

fn parse_user_id(raw: &str) -> Result<Uuid, EnvelopeResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!(id = %raw, "Rejecting malformed user id");
        bad_request(MSG_INVALID_ID)
    })
}

/// Unreadable bodies (bad JSON, wrong field types, wrong content type) are a 400.
/// Bodies cut off by the ingress size limit keep their 413.
fn body_rejected(rejection: JsonRejection, op: Operation) -> EnvelopeResponse {
    warn!(error = %rejection.body_text(), "Rejecting request body");
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    EnvelopeResponse::new(status, op.failure_message()).with_error(rejection.body_text())
}

/// List all users
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
) -> Result<EnvelopeJson<Vec<UserDto>>, EnvelopeResponse> {
    info!("Listing users");

    match svc.list_users().await {
        Ok(users) => {
            let dto_users: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();
            Ok(ok_json(Envelope::list(dto_users)))
        }
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, Operation::List))
        }
    }
}

/// Create a new user
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<EnvelopeJson<UserDto>, EnvelopeResponse> {
    let Json(req_body) = body.map_err(|r| body_rejected(r, Operation::Create))?;
    info!("Creating user");

    match svc.create_user(req_body.into()).await {
        Ok(user) => Ok(created_json(
            Envelope::ok(UserDto::from(user)).with_message("User created successfully"),
        )),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, Operation::Create))
        }
    }
}

/// Update an existing user
pub async fn update_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserReq>, JsonRejection>,
) -> Result<EnvelopeJson<UserDto>, EnvelopeResponse> {
    let id = parse_user_id(&id)?;
    let Json(req_body) = body.map_err(|r| body_rejected(r, Operation::Update))?;
    info!("Updating user {}", id);

    match svc.update_user(id, req_body.into()).await {
        Ok(user) => Ok(ok_json(
            Envelope::ok(UserDto::from(user)).with_message("User updated successfully"),
        )),
        Err(e) => {
            error!("Failed to update user {}: {}", id, e);
            Err(map_domain_error(&e, Operation::Update))
        }
    }
}

/// Delete a user by ID, echoing the removed record
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> Result<EnvelopeJson<UserDto>, EnvelopeResponse> {
    let id = parse_user_id(&id)?;
    info!("Deleting user: {}", id);

    match svc.delete_user(id).await {
        Ok(user) => Ok(ok_json(
            Envelope::ok(UserDto::from(user)).with_message("User deleted successfully"),
        )),
        Err(e) => {
            error!("Failed to delete user {}: {}", id, e);
            Err(map_domain_error(&e, Operation::Delete))
        }
    }
}
