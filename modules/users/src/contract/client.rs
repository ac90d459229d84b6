use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::UsersError,
    model::{NewUser, User, UserPatch},
};

/// Public API trait for the users module that other modules can use
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// List all users, oldest first
    async fn list_users(&self) -> Result<Vec<User>, UsersError>;

    /// Create a new user
    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersError>;

    /// Update a user with partial data
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, UsersError>;

    /// Delete a user by ID, returning its last state
    async fn delete_user(&self, id: Uuid) -> Result<User, UsersError>;
}
