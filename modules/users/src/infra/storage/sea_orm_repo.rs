//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over `C: ConnectionTrait`, so it can be built from a pooled
//! `DatabaseConnection` or from a transaction.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr,
};
use uuid::Uuid;

use crate::contract::User;
use crate::domain::repo::{RepoError, RepoResult, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

/// Unique-index rejections become `DuplicateEmail`; anything else is opaque.
fn classify_write_error(err: DbErr, email: String, what: &'static str) -> RepoError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        tracing::debug!(%detail, "unique constraint violated on users write");
        return RepoError::DuplicateEmail { email };
    }
    RepoError::Other(anyhow::Error::new(err).context(what))
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_all(&self) -> RepoResult<Vec<User>> {
        let rows = UserEntity::find()
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("list_all failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let count = UserEntity::find()
            .filter(Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("email_exists failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, u: User) -> RepoResult<()> {
        let email = u.email.clone();
        let m: UserAM = u.into();
        m.insert(&self.conn)
            .await
            .map_err(|e| classify_write_error(e, email, "insert failed"))?;
        Ok(())
    }

    async fn update(&self, u: User) -> RepoResult<bool> {
        let email = u.email.clone();
        let m: UserAM = u.into();
        match m.update(&self.conn).await {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(e) => Err(classify_write_error(e, email, "update failed")),
        }
    }

    async fn delete(&self, id: Uuid) -> RepoResult<Option<User>> {
        let Some(existing) = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("delete lookup failed")?
        else {
            return Ok(None);
        };

        let res = UserEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok((res.rows_affected > 0).then(|| existing.into()))
    }
}
