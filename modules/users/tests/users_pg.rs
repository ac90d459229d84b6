#![cfg(feature = "integration")]

mod common;

use anyhow::Result;
use sea_orm::Database;

use users::contract::{NewUser, UserPatch, UsersError};
use users::domain::repo::{RepoError, UsersRepository};
use users::infra::storage::SeaOrmUsersRepository;
use users::UsersModule;

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: Some(name.into()),
        email: Some(email.into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn users_work_with_postgres() -> Result<()> {
    let pg = common::bring_up_postgres().await?;
    let db = Database::connect(&pg.url).await?;

    let module = UsersModule::init(db.clone()).await?;
    // Migrations are idempotent.
    UsersModule::migrate(&db).await?;

    let client = module.client();
    let ada = client
        .create_user(new_user("Ada", "Ada@Example.com"))
        .await?;
    assert_eq!(ada.email, "ada@example.com");

    let err = client
        .create_user(new_user("Ada Two", "ADA@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, UsersError::Conflict { .. }));

    let updated = client
        .update_user(
            ada.id,
            UserPatch {
                age: Some(Some(36)),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.age, Some(36));

    let listed = client.list_users().await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, ada.id);
    assert_eq!(listed[0].age, Some(36));

    let removed = client.delete_user(ada.id).await?;
    assert_eq!(removed.id, ada.id);
    assert!(client.list_users().await?.is_empty());

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn unique_index_is_reported_by_postgres() -> Result<()> {
    let pg = common::bring_up_postgres().await?;
    let db = Database::connect(&pg.url).await?;
    UsersModule::migrate(&db).await?;

    let module = UsersModule::init(db.clone()).await?;
    let first = module
        .client()
        .create_user(new_user("Bea", "bea@x.io"))
        .await?;

    // Bypass the service pre-check and hit the index directly.
    let repo = SeaOrmUsersRepository::new(db.clone());
    let mut clash = first.clone();
    clash.id = uuid::Uuid::new_v4();
    let err = repo.insert(clash).await.unwrap_err();
    assert!(matches!(err, RepoError::DuplicateEmail { .. }), "{err:?}");

    db.close().await?;
    Ok(())
}
