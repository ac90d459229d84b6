//! Process-local repository. Same contract as the SeaORM adapter, including
//! email uniqueness, so the service can run without a database.

use parking_lot::RwLock;
use uuid::Uuid;

use crate::contract::User;
use crate::domain::repo::{RepoError, RepoResult, UsersRepository};

#[derive(Default)]
pub struct InMemoryUsersRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUsersRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn list_all(&self) -> RepoResult<Vec<User>> {
        let mut all = self.users.read().clone();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        Ok(self.users.read().iter().any(|u| u.email == email))
    }

    async fn insert(&self, u: User) -> RepoResult<()> {
        let mut users = self.users.write();
        if users.iter().any(|x| x.email == u.email) {
            return Err(RepoError::DuplicateEmail { email: u.email });
        }
        users.push(u);
        Ok(())
    }

    async fn update(&self, u: User) -> RepoResult<bool> {
        let mut users = self.users.write();
        if users.iter().any(|x| x.email == u.email && x.id != u.id) {
            return Err(RepoError::DuplicateEmail { email: u.email });
        }
        match users.iter_mut().find(|x| x.id == u.id) {
            Some(slot) => {
                *slot = u;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> RepoResult<Option<User>> {
        let mut users = self.users.write();
        Ok(users
            .iter()
            .position(|u| u.id == id)
            .map(|idx| users.remove(idx)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Mem".into(),
            email: email.into(),
            age: None,
            phone: None,
            city: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn enforces_unique_email() {
        let repo = InMemoryUsersRepository::new();
        repo.insert(user("a@x.io")).await.unwrap();
        assert!(matches!(
            repo.insert(user("a@x.io")).await,
            Err(RepoError::DuplicateEmail { .. })
        ));

        let mut b = user("b@x.io");
        repo.insert(b.clone()).await.unwrap();
        // Re-saving with its own email is fine.
        assert!(repo.update(b.clone()).await.unwrap());
        b.email = "a@x.io".into();
        assert!(matches!(
            repo.update(b).await,
            Err(RepoError::DuplicateEmail { .. })
        ));
    }

    #[tokio::test]
    async fn delete_returns_prior_state() {
        let repo = InMemoryUsersRepository::new();
        let u = user("gone@x.io");
        repo.insert(u.clone()).await.unwrap();

        assert_eq!(repo.delete(u.id).await.unwrap(), Some(u.clone()));
        assert_eq!(repo.delete(u.id).await.unwrap(), None);
        assert!(repo.list_all().await.unwrap().is_empty());
        assert!(!repo.update(u).await.unwrap());
    }
}
