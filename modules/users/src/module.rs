use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::api::rest::routes;
use crate::contract::client::UsersApi;
use crate::domain::repo::UsersRepository;
use crate::domain::service::Service;
use crate::gateways::local::UsersLocalClient;
use crate::infra::storage::{migrations::Migrator, InMemoryUsersRepository, SeaOrmUsersRepository};

/// The users module: owns the domain service and hands out its REST routes
/// and in-process client.
#[derive(Clone)]
pub struct UsersModule {
    service: Arc<Service>,
}

impl UsersModule {
    pub const MODULE_NAME: &'static str = "users";

    /// Run migrations on `db` and wire the SeaORM repository.
    pub async fn init(db: DatabaseConnection) -> anyhow::Result<Self> {
        info!("Initializing users module");
        Self::migrate(&db).await?;
        Ok(Self::with_repository(Arc::new(SeaOrmUsersRepository::new(db))))
    }

    /// Wire the module over a process-local store.
    pub fn in_memory() -> Self {
        Self::with_repository(Arc::new(InMemoryUsersRepository::new()))
    }

    pub fn with_repository(repo: Arc<dyn UsersRepository>) -> Self {
        Self {
            service: Arc::new(Service::new(repo)),
        }
    }

    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running users database migrations");
        Migrator::up(db, None).await?;
        info!("Users database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// Local in-process client over the same service the routes use.
    pub fn client(&self) -> Arc<dyn UsersApi> {
        Arc::new(UsersLocalClient::new(self.service.clone()))
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering users REST routes");
        routes::register_routes(router, self.service.clone())
    }
}
