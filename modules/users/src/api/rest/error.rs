use modkit::api::{bad_request, internal_error, not_found, EnvelopeResponse};

use crate::domain::error::DomainError;
use crate::contract::error::summarize;
use crate::domain::validation::has_missing_required;

pub const MSG_REQUIRED_FIELDS: &str = "Name and email are required fields";
pub const MSG_EMAIL_EXISTS: &str = "Email already exists";
pub const MSG_NOT_FOUND: &str = "User not found";
pub const MSG_INVALID_ID: &str = "Invalid user ID format";
const INTERNAL_DETAIL: &str = "An internal database error occurred";

/// Which endpoint is failing; picks the envelope message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Error fetching users",
            Operation::Create => "Error creating user",
            Operation::Update => "Error updating user",
            Operation::Delete => "Error deleting user",
        }
    }
}

/// Map domain error to the response envelope for `op`.
pub fn map_domain_error(e: &DomainError, op: Operation) -> EnvelopeResponse {
    match e {
        DomainError::UserNotFound { .. } => not_found(MSG_NOT_FOUND),
        DomainError::EmailAlreadyExists { .. } => bad_request(MSG_EMAIL_EXISTS),
        DomainError::Validation { violations } => {
            let message = if op == Operation::Create && has_missing_required(violations) {
                MSG_REQUIRED_FIELDS
            } else {
                op.failure_message()
            };
            bad_request(message).with_error(summarize(violations))
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            internal_error(op.failure_message()).with_error(INTERNAL_DETAIL)
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use uuid::Uuid;

    use super::*;
    use crate::contract::model::{NewUser, UserPatch};
    use crate::domain::validation::{validate_new_user, validate_patch};

    #[test]
    fn missing_fields_on_create_use_required_message() {
        let violations = validate_new_user(NewUser::default()).unwrap_err();
        let resp = map_domain_error(&DomainError::validation(violations), Operation::Create);
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.body.message.as_deref(), Some(MSG_REQUIRED_FIELDS));
        assert_eq!(
            resp.body.error.as_deref(),
            Some("name: Please provide a name, email: Please provide an email")
        );
    }

    #[test]
    fn other_violations_use_operation_message() {
        let violations = validate_new_user(NewUser {
            name: Some("Al".into()),
            email: Some("nope".into()),
            ..Default::default()
        })
        .unwrap_err();
        let resp = map_domain_error(&DomainError::validation(violations), Operation::Create);
        assert_eq!(resp.body.message.as_deref(), Some("Error creating user"));

        let violations = validate_patch(UserPatch {
            name: Some(None),
            ..Default::default()
        })
        .unwrap_err();
        let resp = map_domain_error(&DomainError::validation(violations), Operation::Update);
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.body.message.as_deref(), Some("Error updating user"));
    }

    #[test]
    fn status_mapping() {
        let resp = map_domain_error(&DomainError::user_not_found(Uuid::nil()), Operation::Delete);
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.body.message.as_deref(), Some(MSG_NOT_FOUND));

        let resp = map_domain_error(
            &DomainError::email_already_exists("a@b.co".into()),
            Operation::Update,
        );
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.body.message.as_deref(), Some(MSG_EMAIL_EXISTS));
        assert_eq!(resp.body.error, None);
    }

    #[test]
    fn database_errors_are_not_leaked() {
        let resp = map_domain_error(
            &DomainError::database("connection refused on 10.0.0.7"),
            Operation::List,
        );
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body.message.as_deref(), Some("Error fetching users"));
        assert_eq!(resp.body.error.as_deref(), Some(INTERNAL_DETAIL));
        assert!(!resp.body.success);
    }
}
