use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::User;

#[derive(Debug, Error)]
pub enum RepoError {
    /// The store's unique email index rejected the write.
    #[error("email '{email}' is already taken")]
    DuplicateEmail { email: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// All users, oldest first.
    async fn list_all(&self) -> RepoResult<Vec<User>>;
    /// Load a user by id.
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;
    /// Check uniqueness by (already normalized) email.
    async fn email_exists(&self, email: &str) -> RepoResult<bool>;
    /// Insert a fully-formed domain user.
    ///
    /// Service computes id/timestamps/validation; repo persists.
    async fn insert(&self, u: User) -> RepoResult<()>;
    /// Replace an existing user (by primary key in `u.id`).
    /// Returns false if the row no longer exists.
    async fn update(&self, u: User) -> RepoResult<bool>;
    /// Delete by id, returning the row as it was before removal.
    async fn delete(&self, id: Uuid) -> RepoResult<Option<User>>;
}
