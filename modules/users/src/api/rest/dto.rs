use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::contract::model::{NewUser, User, UserPatch};

/// REST DTO for user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// REST DTO for creating a new user.
///
/// Every field is optional on the wire; missing required fields are
/// reported by validation, not by the JSON extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// REST DTO for updating a user (partial).
///
/// An absent key leaves the field alone; an explicit `null` clears it.
/// Keys outside these five (`id`, `createdAt`, ...) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserReq {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub age: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub city: Option<Option<String>>,
}

/// Only called when the key exists, so `null` becomes `Some(None)`.
fn present<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            age: user.age,
            phone: user.phone,
            city: user.city,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
            age: req.age,
            phone: req.phone,
            city: req.city,
        }
    }
}

impl From<UpdateUserReq> for UserPatch {
    fn from(req: UpdateUserReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
            age: req.age,
            phone: req.phone,
            city: req.city,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn user_dto_is_camel_case_and_omits_absent_fields() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let dto = UserDto::from(User {
            id: Uuid::nil(),
            name: "Al".into(),
            email: "a@b.co".into(),
            age: Some(0),
            phone: None,
            city: None,
            created_at: at,
            updated_at: at,
        });

        let v = serde_json::to_value(&dto).unwrap();
        assert_eq!(
            v,
            json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "name": "Al",
                "email": "a@b.co",
                "age": 0,
                "createdAt": "2024-05-01T08:30:00Z",
                "updatedAt": "2024-05-01T08:30:00Z",
            })
        );
    }

    #[test]
    fn update_distinguishes_absent_from_null() {
        let req: UpdateUserReq = serde_json::from_value(json!({
            "age": null,
            "city": "Rome",
            "id": "ignored",
            "createdAt": "ignored",
        }))
        .unwrap();

        let patch = UserPatch::from(req);
        assert_eq!(patch.name, None);
        assert_eq!(patch.email, None);
        assert_eq!(patch.age, Some(None));
        assert_eq!(patch.phone, None);
        assert_eq!(patch.city, Some(Some("Rome".into())));
    }

    #[test]
    fn empty_update_body_is_an_empty_patch() {
        let req: UpdateUserReq = serde_json::from_str("{}").unwrap();
        assert!(UserPatch::from(req).is_empty());
    }

    #[test]
    fn create_rejects_wrong_types() {
        assert!(serde_json::from_value::<CreateUserReq>(json!({ "age": "ten" })).is_err());
        let req: CreateUserReq = serde_json::from_value(json!({ "name": "Al" })).unwrap();
        assert_eq!(req.email, None);
    }
}
