use crate::error::{AppError, Result};
use crate::models::{BoundingBox, Coordinates, Place, PlaceCategory, WeatherImpact};
use async_trait::async_trait;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Shared row-to-Place conversion (used by both Pg and SQLite repos)
// ---------------------------------------------------------------------------

/// Raw place fields extracted from a database row, before validation.
#[derive(sqlx::FromRow)]
pub(super) struct RawPlaceRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
    pub description: Option<String>,
    pub average_cost: Option<f64>,
    pub estimated_wait_minutes: Option<i32>,
    pub estimated_visit_minutes: Option<i32>,
    pub cold_impact: i32,
    pub heat_impact: i32,
    pub humidity_impact: i32,
}

impl RawPlaceRow {
    /// Convert and validate. Rows that would corrupt route arithmetic are
    /// rejected rather than patched with fallbacks.
    pub fn into_place(self) -> std::result::Result<Place, String> {
        let category: PlaceCategory = self.category.parse()?;
        let coordinates = Coordinates::new(self.lat, self.lng)
            .map_err(|e| format!("Place '{}': {}", self.id, e))?;

        let place = Place {
            estimated_wait_minutes: non_negative_minutes(self.estimated_wait_minutes, "wait", &self.id),
            estimated_visit_minutes: non_negative_minutes(self.estimated_visit_minutes, "visit", &self.id),
            id: self.id,
            name: self.name,
            category,
            coordinates,
            address: self.address,
            description: self.description,
            average_cost: self.average_cost,
            weather_impact: WeatherImpact {
                cold: self.cold_impact,
                heat: self.heat_impact,
                humidity: self.humidity_impact,
            },
        };
        place.validate()?;
        Ok(place)
    }
}

fn non_negative_minutes(value: Option<i32>, what: &str, id: &str) -> Option<u32> {
    value.and_then(|m| {
        if m >= 0 {
            Some(m as u32)
        } else {
            tracing::warn!("Negative {} minutes {} for place '{}', ignoring", what, m, id);
            None
        }
    })
}

/// Minutes as stored in an INTEGER column.
fn minutes_column(value: Option<u32>, what: &str, id: &str) -> Result<Option<i32>> {
    value
        .map(|m| {
            i32::try_from(m).map_err(|_| {
                AppError::Persistence(format!("Place '{}' has invalid {} minutes {}", id, what, m))
            })
        })
        .transpose()
}

/// Keep valid rows, log and drop the rest.
pub(super) fn into_valid_places(rows: Vec<RawPlaceRow>) -> Vec<Place> {
    rows.into_iter()
        .filter_map(|row| match row.into_place() {
            Ok(place) => Some(place),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping invalid place record");
                None
            }
        })
        .collect()
}

#[async_trait]
pub trait PlaceRepository: Send + Sync {
    /// Places of one category inside a bounding box, in storage order.
    async fn find_in_bbox(
        &self,
        bbox: &BoundingBox,
        category: PlaceCategory,
        limit: i64,
    ) -> Result<Vec<Place>>;

    async fn insert(&self, place: &Place) -> Result<()>;

    async fn count(&self) -> Result<i64>;
}

pub struct PgPlaceRepository {
    pool: PgPool,
}

impl PgPlaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the places table. Idempotent.
    pub async fn create_schema(pool: &PgPool) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS places (
                seq BIGSERIAL,
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                lat DOUBLE PRECISION NOT NULL,
                lng DOUBLE PRECISION NOT NULL,
                address TEXT,
                description TEXT,
                average_cost DOUBLE PRECISION,
                estimated_wait_minutes INTEGER,
                estimated_visit_minutes INTEGER,
                cold_impact INTEGER NOT NULL DEFAULT 0,
                heat_impact INTEGER NOT NULL DEFAULT 0,
                humidity_impact INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_places_category_location
             ON places(category, lat, lng)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PlaceRepository for PgPlaceRepository {
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
             WHERE category = $1
               AND lat BETWEEN $2 AND $3
               AND lng BETWEEN $4 AND $5
             ORDER BY seq
             LIMIT $6",
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
        sqlx::query(
            "INSERT INTO places (id, name, category, lat, lng, address, description, average_cost,
                                 estimated_wait_minutes, estimated_visit_minutes,
                                 cold_impact, heat_impact, humidity_impact)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&place.id)
        .bind(&place.name)
        .bind(place.category.wire_name())
        .bind(place.coordinates.lat)
        .bind(place.coordinates.lng)
        .bind(&place.address)
        .bind(&place.description)
        .bind(place.average_cost)
        .bind(minutes_column(place.estimated_wait_minutes, "wait", &place.id)?)
        .bind(minutes_column(place.estimated_visit_minutes, "visit", &place.id)?)
        .bind(place.weather_impact.cold)
        .bind(place.weather_impact.heat)
        .bind(place.weather_impact.humidity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM places")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
