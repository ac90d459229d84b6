use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;
use crate::domain::validation::{validate_new_user, validate_patch};

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "users.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");
        let users = self.repo.list_all().await?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    #[instrument(name = "users.service.create_user", skip(self, new_user))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        let valid = validate_new_user(new_user).map_err(DomainError::validation)?;

        if self.repo.email_exists(&valid.email).await? {
            return Err(DomainError::email_already_exists(valid.email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: valid.name,
            email: valid.email,
            age: valid.age,
            phone: valid.phone,
            city: valid.city,
            created_at: now,
            updated_at: now,
        };

        // The unique index still guards against a concurrent insert racing the check above.
        self.repo.insert(user.clone()).await?;

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    #[instrument(name = "users.service.update_user", skip(self, patch), fields(user_id = %id))]
    pub async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating user");

        let patch = validate_patch(patch).map_err(DomainError::validation)?;

        let mut current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        if let Some(ref new_email) = patch.email {
            if new_email != &current.email && self.repo.email_exists(new_email).await? {
                return Err(DomainError::email_already_exists(new_email.clone()));
            }
        }

        if let Some(name) = patch.name {
            current.name = name;
        }
        if let Some(email) = patch.email {
            current.email = email;
        }
        if let Some(age) = patch.age {
            current.age = age;
        }
        if let Some(phone) = patch.phone {
            current.phone = phone;
        }
        if let Some(city) = patch.city {
            current.city = city;
        }
        current.updated_at = Utc::now();

        if !self.repo.update(current.clone()).await? {
            // Deleted between the load and the write.
            return Err(DomainError::user_not_found(id));
        }

        info!("Successfully updated user");
        Ok(current)
    }

    #[instrument(name = "users.service.delete_user", skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: Uuid) -> Result<User, DomainError> {
        info!("Deleting user");

        let deleted = self
            .repo
            .delete(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        info!("Successfully deleted user");
        Ok(deleted)
    }
}
