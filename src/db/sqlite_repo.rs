use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{BoundingBox, Place, PlaceCategory, Route, Stop};

use super::place_repository::{into_valid_places, PlaceRepository, RawPlaceRow};
use super::route_store::{owned_by, route_not_found, RawRouteRow, RouteStore};

/// Create the SQLite schema (places + routes). Idempotent.
pub async fn create_schema(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS places (
            rowid INTEGER PRIMARY KEY,
            id TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            lat REAL NOT NULL,
            lng REAL NOT NULL,
            address TEXT,
            description TEXT,
            average_cost REAL,
            estimated_wait_minutes INTEGER,
            estimated_visit_minutes INTEGER,
            cold_impact INTEGER NOT NULL DEFAULT 0,
            heat_impact INTEGER NOT NULL DEFAULT 0,
            humidity_impact INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_places_category ON places(category, lat, lng)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS routes (
            rowid INTEGER PRIMARY KEY,
            id TEXT UNIQUE NOT NULL,
            user_id TEXT,
            name TEXT NOT NULL,
            route_type TEXT NOT NULL,
            total_budget REAL NOT NULL,
            total_duration_minutes INTEGER NOT NULL,
            transportation_mode TEXT NOT NULL,
            city TEXT,
            is_favorite INTEGER NOT NULL DEFAULT 0,
            exceeds_budget INTEGER NOT NULL DEFAULT 0,
            stops TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_routes_user ON routes(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Places
// ---------------------------------------------------------------------------

pub struct SqlitePlaceRepository {
    pool: SqlitePool,
}

impl SqlitePlaceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a batch of places in a single transaction.
    ///
    /// Uses `INSERT OR IGNORE` so duplicate ids are silently skipped.
    /// Returns the number of places actually inserted.
    pub async fn insert_batch(&self, places: &[Place]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;

        for place in places {
            let result = insert_place_query(place).execute(&mut *tx).await?;
            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

fn insert_place_query(
    place: &Place,
) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(
        "INSERT OR IGNORE INTO places (id, name, category, lat, lng, address, description,
                                       average_cost, estimated_wait_minutes, estimated_visit_minutes,
                                       cold_impact, heat_impact, humidity_impact)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .bind(&place.id)
    .bind(&place.name)
    .bind(place.category.wire_name())
    .bind(place.coordinates.lat)
    .bind(place.coordinates.lng)
    .bind(&place.address)
    .bind(&place.description)
    .bind(place.average_cost)
    .bind(place.estimated_wait_minutes.map(i64::from))
    .bind(place.estimated_visit_minutes.map(i64::from))
    .bind(place.weather_impact.cold)
    .bind(place.weather_impact.heat)
    .bind(place.weather_impact.humidity)
}

#[async_trait]
impl PlaceRepository for SqlitePlaceRepository {
    async fn find_in_bbox(
        &self,
        bbox: &BoundingBox,
        category: PlaceCategory,
        limit: i64,
    ) -> Result<Vec<Place>> {
        let rows: Vec<RawPlaceRow> = sqlx::query_as(
            "SELECT id, name, category, lat, lng, address, description, average_cost,
                    estimated_wait_minutes, estimated_visit_minutes,
                    cold_impact, heat_impact, humidity_impact
             FROM places
             WHERE category = ?1
               AND lat BETWEEN ?2 AND ?3
               AND lng BETWEEN ?4 AND ?5
             ORDER BY rowid
             LIMIT ?6",
        )
        .bind(category.wire_name())
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lng)
        .bind(bbox.max_lng)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_valid_places(rows))
    }

    async fn insert(&self, place: &Place) -> Result<()> {
        insert_place_query(place).execute(&self.pool).await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM places")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct SqliteRouteRow {
    id: String,
    name: String,
    route_type: String,
    total_budget: f64,
    total_duration_minutes: i64,
    transportation_mode: String,
    city: Option<String>,
    is_favorite: bool,
    exceeds_budget: bool,
    stops: String,
}

impl SqliteRouteRow {
    fn into_route(self) -> Result<Route> {
        let id = self
            .id
            .parse::<Uuid>()
            .map_err(|_| AppError::Persistence(format!("Invalid route id '{}'", self.id)))?;
        let stops: Vec<Stop> = serde_json::from_str(&self.stops)
            .map_err(|e| AppError::Persistence(format!("Corrupt stops for route {}: {}", id, e)))?;

        RawRouteRow {
            id,
            name: self.name,
            route_type: self.route_type,
            total_budget: self.total_budget,
            total_duration_minutes: self.total_duration_minutes,
            transportation_mode: self.transportation_mode,
            city: self.city,
            is_favorite: self.is_favorite,
            exceeds_budget: self.exceeds_budget,
            stops,
        }
        .into_route()
    }
}

const SQLITE_ROUTE_COLUMNS: &str = "id, name, route_type, total_budget, total_duration_minutes,
     transportation_mode, city, is_favorite, exceeds_budget, stops";

pub struct SqliteRouteStore {
    pool: SqlitePool,
}

impl SqliteRouteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn owner_of(&self, id: Uuid) -> Result<Option<String>> {
        let owner: Option<(Option<String>,)> =
            sqlx::query_as("SELECT user_id FROM routes WHERE id = ?1")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        owner.map(|(user_id,)| user_id).ok_or_else(|| route_not_found(id))
    }
}

fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[async_trait]
impl RouteStore for SqliteRouteStore {
    async fn save(&self, route: &Route, user_id: Option<&str>) -> Result<Route> {
        let stops = serde_json::to_string(&route.stops)
            .map_err(|e| AppError::Persistence(format!("Failed to encode stops: {}", e)))?;
        let now = unix_now();

        let result = sqlx::query(
            "INSERT INTO routes (id, user_id, name, route_type, total_budget, total_duration_minutes,
                                 transportation_mode, city, is_favorite, exceeds_budget, stops,
                                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             ON CONFLICT(id) DO UPDATE SET
                user_id = COALESCE(excluded.user_id, routes.user_id),
                name = excluded.name,
                route_type = excluded.route_type,
                total_budget = excluded.total_budget,
                total_duration_minutes = excluded.total_duration_minutes,
                transportation_mode = excluded.transportation_mode,
                city = excluded.city,
                is_favorite = excluded.is_favorite,
                exceeds_budget = excluded.exceeds_budget,
                stops = excluded.stops,
                updated_at = excluded.updated_at
             WHERE routes.user_id IS NULL OR routes.user_id = excluded.user_id",
        )
        .bind(route.id.to_string())
        .bind(user_id)
        .bind(&route.name)
        .bind(route.route_type.wire_name())
        .bind(route.total_budget)
        .bind(i64::from(route.total_duration_minutes))
        .bind(route.transportation_mode.wire_name())
        .bind(&route.city)
        .bind(route.is_favorite)
        .bind(route.exceeds_budget)
        .bind(stops)
        .bind(now)
        .execute(&self.pool)
        .await?;

        // the upsert skips routes owned by someone else
        if result.rows_affected() == 0 {
            return Err(route_not_found(route.id));
        }

        let mut stored = route.clone();
        stored.is_saved = true;
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Route> {
        let sql = format!("SELECT {SQLITE_ROUTE_COLUMNS} FROM routes WHERE id = ?1");
        let row: Option<SqliteRouteRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| route_not_found(id))?.into_route()
    }

    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Route>> {
        let sql = format!(
            "SELECT {SQLITE_ROUTE_COLUMNS} FROM routes
             WHERE ?1 IS NULL OR user_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        );
        let rows: Vec<SqliteRouteRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(SqliteRouteRow::into_route).collect()
    }

    async fn delete(&self, id: Uuid, user_id: Option<&str>) -> Result<()> {
        let owner = self.owner_of(id).await?;
        if !owned_by(owner.as_deref(), user_id) {
            return Err(route_not_found(id));
        }

        sqlx::query("DELETE FROM routes WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_favorite(&self, id: Uuid, user_id: Option<&str>, favorite: bool) -> Result<Route> {
        let owner = self.owner_of(id).await?;
        if !owned_by(owner.as_deref(), user_id) {
            return Err(route_not_found(id));
        }

        sqlx::query("UPDATE routes SET is_favorite = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id.to_string())
            .bind(favorite)
            .bind(unix_now())
            .execute(&self.pool)
            .await?;

        self.get(id).await
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
#[path = "sqlite_repo_tests.rs"]
mod sqlite_repo_tests;
