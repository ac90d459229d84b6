use std::sync::Arc;

use axum::{
    routing::{get, put},
    Extension, Router,
};

use crate::api::rest::handlers;
use crate::domain::service::Service;

pub const USERS_PATH: &str = "/api/users";
pub const USER_PATH: &str = "/api/users/{id}";

/// Mount the users endpoints onto `router`.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let users = Router::new()
        .route(
            USERS_PATH,
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            USER_PATH,
            put(handlers::update_user).delete(handlers::delete_user),
        )
        .layer(Extension(service));

    router.merge(users)
}
