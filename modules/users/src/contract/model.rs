use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Pure user model for inter-module communication (no serde)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new user, exactly as supplied by the caller.
///
/// Required fields are optional here so that their absence is reported as a
/// validation violation instead of a decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

/// Partial update data for a user.
///
/// Outer `None`: field not supplied, left untouched.
/// `Some(None)`: field explicitly cleared (a violation for `name` / `email`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub age: Option<Option<i64>>,
    pub phone: Option<Option<String>>,
    pub city: Option<Option<String>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.phone.is_none()
            && self.city.is_none()
    }
}
