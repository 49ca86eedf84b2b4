use crate::error::{AppError, Result};
use crate::models::{Route, Stop};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persisted routes, keyed by route id.
///
/// Writes are idempotent: saving the same id again overwrites the stored
/// copy. Routes saved with an owner are only visible to, deletable and
/// favoritable by that owner; ownerless routes are open to everyone.
#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn save(&self, route: &Route, user_id: Option<&str>) -> Result<Route>;

    async fn get(&self, id: Uuid) -> Result<Route>;

    /// Routes of one owner, or every route when `user_id` is `None`. Newest first.
    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Route>>;

    async fn delete(&self, id: Uuid, user_id: Option<&str>) -> Result<()>;

    async fn set_favorite(&self, id: Uuid, user_id: Option<&str>, favorite: bool) -> Result<Route>;

    async fn health_check(&self) -> bool;

    fn backend_name(&self) -> &'static str;
}

pub(super) fn owned_by(owner: Option<&str>, requester: Option<&str>) -> bool {
    match owner {
        None => true,
        Some(owner) => requester == Some(owner),
    }
}

pub(super) fn route_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Route {} not found", id))
}

/// Duration as stored in the INTEGER column.
fn duration_column(route: &Route) -> Result<i32> {
    i32::try_from(route.total_duration_minutes).map_err(|_| {
        AppError::Persistence(format!(
            "Route {} has invalid duration {}",
            route.id, route.total_duration_minutes
        ))
    })
}

// ---------------------------------------------------------------------------
// Shared row-to-Route conversion (used by both Pg and SQLite stores)
// ---------------------------------------------------------------------------

pub(super) struct RawRouteRow {
    pub id: Uuid,
    pub name: String,
    pub route_type: String,
    pub total_budget: f64,
    pub total_duration_minutes: i64,
    pub transportation_mode: String,
    pub city: Option<String>,
    pub is_favorite: bool,
    pub exceeds_budget: bool,
    pub stops: Vec<Stop>,
}

impl RawRouteRow {
    pub fn into_route(self) -> Result<Route> {
        let route_type = self.route_type.parse().map_err(AppError::Persistence)?;
        let transportation_mode = self
            .transportation_mode
            .parse()
            .map_err(AppError::Persistence)?;
        let total_duration_minutes = u32::try_from(self.total_duration_minutes).map_err(|_| {
            AppError::Persistence(format!(
                "Route {} has invalid duration {}",
                self.id, self.total_duration_minutes
            ))
        })?;

        Ok(Route {
            id: self.id,
            name: self.name,
            route_type,
            total_budget: self.total_budget,
            total_duration_minutes,
            transportation_mode,
            city: self.city,
            is_favorite: self.is_favorite,
            is_saved: true,
            exceeds_budget: self.exceeds_budget,
            stops: self.stops,
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

struct StoredRoute {
    route: Route,
    user_id: Option<String>,
    seq: u64,
}

/// Route store used when no database is configured.
#[derive(Default)]
pub struct MemoryRouteStore {
    routes: RwLock<HashMap<Uuid, StoredRoute>>,
    next_seq: AtomicU64,
}

impl MemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RouteStore for MemoryRouteStore {
    async fn save(&self, route: &Route, user_id: Option<&str>) -> Result<Route> {
        let mut stored = route.clone();
        stored.is_saved = true;

        let mut routes = self.routes.write().await;
        match routes.get_mut(&route.id) {
            Some(existing) => {
                if !owned_by(existing.user_id.as_deref(), user_id) {
                    return Err(route_not_found(route.id));
                }
                if user_id.is_some() {
                    existing.user_id = user_id.map(str::to_string);
                }
                existing.route = stored.clone();
            }
            None => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                routes.insert(
                    route.id,
                    StoredRoute {
                        route: stored.clone(),
                        user_id: user_id.map(str::to_string),
                        seq,
                    },
                );
            }
        }

        tracing::debug!(route_id = %route.id, "Saved route in memory store");
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Route> {
        self.routes
            .read()
            .await
            .get(&id)
            .map(|s| s.route.clone())
            .ok_or_else(|| route_not_found(id))
    }

    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Route>> {
        let routes = self.routes.read().await;
        let mut matching: Vec<&StoredRoute> = routes
            .values()
            .filter(|s| user_id.is_none() || s.user_id.as_deref() == user_id)
            .collect();
        matching.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(matching.into_iter().map(|s| s.route.clone()).collect())
    }

    async fn delete(&self, id: Uuid, user_id: Option<&str>) -> Result<()> {
        let mut routes = self.routes.write().await;
        let allowed = matches!(
            routes.get(&id),
            Some(stored) if owned_by(stored.user_id.as_deref(), user_id)
        );
        if !allowed {
            return Err(route_not_found(id));
        }
        routes.remove(&id);
        Ok(())
    }

    async fn set_favorite(&self, id: Uuid, user_id: Option<&str>, favorite: bool) -> Result<Route> {
        let mut routes = self.routes.write().await;
        match routes.get_mut(&id) {
            Some(stored) if owned_by(stored.user_id.as_deref(), user_id) => {
                stored.route.is_favorite = favorite;
                Ok(stored.route.clone())
            }
            _ => Err(route_not_found(id)),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL store
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct PgRouteRow {
    id: Uuid,
    name: String,
    route_type: String,
    total_budget: f64,
    total_duration_minutes: i32,
    transportation_mode: String,
    city: Option<String>,
    is_favorite: bool,
    exceeds_budget: bool,
    stops: Json<Vec<Stop>>,
}

impl PgRouteRow {
    fn into_route(self) -> Result<Route> {
        RawRouteRow {
            id: self.id,
            name: self.name,
            route_type: self.route_type,
            total_budget: self.total_budget,
            total_duration_minutes: i64::from(self.total_duration_minutes),
            transportation_mode: self.transportation_mode,
            city: self.city,
            is_favorite: self.is_favorite,
            exceeds_budget: self.exceeds_budget,
            stops: self.stops.0,
        }
        .into_route()
    }
}

const PG_ROUTE_COLUMNS: &str = "id, name, route_type, total_budget, total_duration_minutes,
     transportation_mode, city, is_favorite, exceeds_budget, stops";

pub struct PgRouteStore {
    pool: PgPool,
}

impl PgRouteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the routes table. Idempotent.
    pub async fn create_schema(pool: &PgPool) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS routes (
                id UUID PRIMARY KEY,
                user_id TEXT,
                name TEXT NOT NULL,
                route_type TEXT NOT NULL,
                total_budget DOUBLE PRECISION NOT NULL,
                total_duration_minutes INTEGER NOT NULL,
                transportation_mode TEXT NOT NULL,
                city TEXT,
                is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
                exceeds_budget BOOLEAN NOT NULL DEFAULT FALSE,
                stops JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_routes_user ON routes(user_id, created_at)")
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn owner_of(&self, id: Uuid) -> Result<Option<String>> {
        let owner: Option<(Option<String>,)> =
            sqlx::query_as("SELECT user_id FROM routes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        owner.map(|(user_id,)| user_id).ok_or_else(|| route_not_found(id))
    }
}

#[async_trait]
impl RouteStore for PgRouteStore {
    async fn save(&self, route: &Route, user_id: Option<&str>) -> Result<Route> {
        let now = time::OffsetDateTime::now_utc();
        let total_duration_minutes = duration_column(route)?;

        let result = sqlx::query(
            "INSERT INTO routes (id, user_id, name, route_type, total_budget, total_duration_minutes,
                                 transportation_mode, city, is_favorite, exceeds_budget, stops,
                                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
             ON CONFLICT (id) DO UPDATE SET
                user_id = COALESCE(EXCLUDED.user_id, routes.user_id),
                name = EXCLUDED.name,
                route_type = EXCLUDED.route_type,
                total_budget = EXCLUDED.total_budget,
                total_duration_minutes = EXCLUDED.total_duration_minutes,
                transportation_mode = EXCLUDED.transportation_mode,
                city = EXCLUDED.city,
                is_favorite = EXCLUDED.is_favorite,
                exceeds_budget = EXCLUDED.exceeds_budget,
                stops = EXCLUDED.stops,
                updated_at = EXCLUDED.updated_at
             WHERE routes.user_id IS NULL OR routes.user_id = EXCLUDED.user_id",
        )
        .bind(route.id)
        .bind(user_id)
        .bind(&route.name)
        .bind(route.route_type.wire_name())
        .bind(route.total_budget)
        .bind(total_duration_minutes)
        .bind(route.transportation_mode.wire_name())
        .bind(&route.city)
        .bind(route.is_favorite)
        .bind(route.exceeds_budget)
        .bind(Json(&route.stops))
        .bind(now)
        .execute(&self.pool)
        .await?;

        // the upsert skips routes owned by someone else
        if result.rows_affected() == 0 {
            return Err(route_not_found(route.id));
        }

        tracing::debug!(route_id = %route.id, "Saved route in PostgreSQL");

        let mut stored = route.clone();
        stored.is_saved = true;
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Route> {
        let sql = format!("SELECT {PG_ROUTE_COLUMNS} FROM routes WHERE id = $1");
        let row: Option<PgRouteRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| route_not_found(id))?.into_route()
    }

    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Route>> {
        let sql = format!(
            "SELECT {PG_ROUTE_COLUMNS} FROM routes
             WHERE $1::TEXT IS NULL OR user_id = $1
             ORDER BY created_at DESC, id"
        );
        let rows: Vec<PgRouteRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(PgRouteRow::into_route).collect()
    }

    async fn delete(&self, id: Uuid, user_id: Option<&str>) -> Result<()> {
        let owner = self.owner_of(id).await?;
        if !owned_by(owner.as_deref(), user_id) {
            return Err(route_not_found(id));
        }

        sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_favorite(&self, id: Uuid, user_id: Option<&str>, favorite: bool) -> Result<Route> {
        let owner = self.owner_of(id).await?;
        if !owned_by(owner.as_deref(), user_id) {
            return Err(route_not_found(id));
        }

        sqlx::query("UPDATE routes SET is_favorite = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(favorite)
            .bind(time::OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await?;

        self.get(id).await
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
