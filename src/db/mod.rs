use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod place_repository;
pub mod route_store;
#[cfg(feature = "sqlite")]
pub mod sqlite_repo;

pub use place_repository::{PgPlaceRepository, PlaceRepository};
pub use route_store::{MemoryRouteStore, PgRouteStore, RouteStore};
#[cfg(feature = "sqlite")]
pub use sqlite_repo::{SqlitePlaceRepository, SqliteRouteStore};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Create every table the service needs. Idempotent.
pub async fn create_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    PgPlaceRepository::create_schema(pool).await?;
    PgRouteStore::create_schema(pool).await
}
