use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::contract::model::User;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            age: m.age,
            phone: m.phone,
            city: m.city,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<User> for ActiveModel {
    fn from(u: User) -> Self {
        use sea_orm::Set;
        Self {
            id: Set(u.id),
            name: Set(u.name),
            email: Set(u.email),
            age: Set(u.age),
            phone: Set(u.phone),
            city: Set(u.city),
            created_at: Set(u.created_at),
            updated_at: Set(u.updated_at),
        }
    }
}
