use crate::constants::*;
use crate::db::PlaceRepository;
use crate::models::{BoundingBox, Coordinates, Place, PlaceCategory};
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("catalog unreachable: {0}")]
    Connectivity(String),

    #[error("invalid catalog record: {0}")]
    InvalidRecord(String),
}

/// Source of candidate places.
///
/// Implementations only ever return validated records, in a stable order
/// for identical catalog state.
#[async_trait]
pub trait PlaceCatalog: Send + Sync {
    async fn query_by_category(
        &self,
        category: PlaceCategory,
        origin: Option<&Coordinates>,
    ) -> Result<Vec<Place>, CatalogError>;

    fn backend_name(&self) -> &'static str;
}

/// Fixed pool of places held in memory.
pub struct InMemoryCatalog {
    places: Vec<Place>,
    radius_km: Option<f64>,
}

impl InMemoryCatalog {
    /// Invalid records are dropped up front.
    pub fn new(places: Vec<Place>) -> Self {
        let places = places
            .into_iter()
            .filter(|place| match place.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping invalid place from in-memory catalog");
                    false
                }
            })
            .collect();

        Self {
            places,
            radius_km: None,
        }
    }

    /// Only return places within `radius_km` of the origin, when one is given.
    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[async_trait]
impl PlaceCatalog for InMemoryCatalog {
    async fn query_by_category(
        &self,
        category: PlaceCategory,
        origin: Option<&Coordinates>,
    ) -> Result<Vec<Place>, CatalogError> {
        Ok(self
            .places
            .iter()
            .filter(|p| p.category == category)
            .filter(|p| match (origin, self.radius_km) {
                (Some(origin), Some(radius)) => origin.distance_to(&p.coordinates) <= radius,
                _ => true,
            })
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Catalog over a database [`PlaceRepository`], scoped to a box around the origin.
pub struct RepositoryCatalog {
    repository: Arc<dyn PlaceRepository>,
    radius_km: f64,
    limit: i64,
}

impl RepositoryCatalog {
    pub fn new(repository: Arc<dyn PlaceRepository>, radius_km: f64) -> Self {
        Self {
            repository,
            radius_km,
            limit: CATALOG_QUERY_LIMIT,
        }
    }
}

#[async_trait]
impl PlaceCatalog for RepositoryCatalog {
    async fn query_by_category(
        &self,
        category: PlaceCategory,
        origin: Option<&Coordinates>,
    ) -> Result<Vec<Place>, CatalogError> {
        let bbox = origin
            .map(|o| BoundingBox::from_center_radius(o, self.radius_km))
            .unwrap_or(BoundingBox::WORLD);

        let places = self
            .repository
            .find_in_bbox(&bbox, category, self.limit)
            .await
            .map_err(|e| CatalogError::Connectivity(e.to_string()))?;

        // the repository already drops corrupt rows; re-check before handing out
        places
            .into_iter()
            .map(|place| {
                place
                    .validate()
                    .map(|()| place)
                    .map_err(CatalogError::InvalidRecord)
            })
            .collect()
    }

    fn backend_name(&self) -> &'static str {
        "database"
    }
}

/// Caches another catalog's answers by category and rounded origin.
///
/// Failures are not cached, so a flaky backend is retried on the next call.
pub struct CachedCatalog {
    inner: Arc<dyn PlaceCatalog>,
    cache: Cache<String, Arc<Vec<Place>>>,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn PlaceCatalog>, ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(DEFAULT_MEMORY_CACHE_MAX_ENTRIES)
            .build();
        Self { inner, cache }
    }

    fn cache_key(category: PlaceCategory, origin: Option<&Coordinates>) -> String {
        match origin {
            Some(o) => {
                let rounded = o.round(CACHE_COORDINATE_PRECISION);
                format!("{}:{:.3},{:.3}", category, rounded.lat, rounded.lng)
            }
            None => format!("{}:*", category),
        }
    }
}

#[async_trait]
impl PlaceCatalog for CachedCatalog {
    async fn query_by_category(
        &self,
        category: PlaceCategory,
        origin: Option<&Coordinates>,
    ) -> Result<Vec<Place>, CatalogError> {
        let key = Self::cache_key(category, origin);
        if let Some(places) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "Catalog cache hit");
            return Ok((*places).clone());
        }

        let places = self.inner.query_by_category(category, origin).await?;
        self.cache.insert(key, Arc::new(places.clone())).await;
        Ok(places)
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn place(id: &str, category: PlaceCategory, lat: f64, lng: f64) -> Place {
        Place::new(id, id, category, Coordinates::new(lat, lng).unwrap())
    }

    fn paris() -> Coordinates {
        Coordinates::new(48.8566, 2.3522).unwrap()
    }

    #[tokio::test]
    async fn in_memory_filters_by_category_and_radius() {
        let catalog = InMemoryCatalog::new(vec![
            place("near", PlaceCategory::Culture, 48.86, 2.35),
            place("food", PlaceCategory::Restaurant, 48.86, 2.35),
            place("lyon", PlaceCategory::Culture, 45.76, 4.83),
        ])
        .with_radius(2.0);

        let near = catalog
            .query_by_category(PlaceCategory::Culture, Some(&paris()))
            .await
            .unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id, "near");

        let anywhere = catalog
            .query_by_category(PlaceCategory::Culture, None)
            .await
            .unwrap();
        assert_eq!(anywhere.len(), 2);
    }

    #[tokio::test]
    async fn in_memory_drops_invalid_records() {
        let catalog = InMemoryCatalog::new(vec![
            place("ok", PlaceCategory::Leisure, 48.86, 2.35),
            place("bad", PlaceCategory::Leisure, 48.86, 2.35).with_average_cost(-1.0),
        ]);
        assert_eq!(catalog.len(), 1);
    }

    struct CountingCatalog {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PlaceCatalog for CountingCatalog {
        async fn query_by_category(
            &self,
            category: PlaceCategory,
            _origin: Option<&Coordinates>,
        ) -> Result<Vec<Place>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CatalogError::Connectivity("offline".into()));
            }
            Ok(vec![place("x", category, 48.86, 2.35)])
        }

        fn backend_name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn cached_catalog_reuses_answers_for_nearby_origins() {
        let inner = Arc::new(CountingCatalog {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cached = CachedCatalog::new(inner.clone(), 60);

        let a = Coordinates::new(48.85661, 2.35221).unwrap();
        let b = Coordinates::new(48.85659, 2.35219).unwrap();
        cached.query_by_category(PlaceCategory::Culture, Some(&a)).await.unwrap();
        cached.query_by_category(PlaceCategory::Culture, Some(&b)).await.unwrap();
        cached.query_by_category(PlaceCategory::Leisure, Some(&b)).await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cached_catalog_does_not_cache_failures() {
        let inner = Arc::new(CountingCatalog {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cached = CachedCatalog::new(inner.clone(), 60);

        assert!(cached.query_by_category(PlaceCategory::Culture, None).await.is_err());
        assert!(cached.query_by_category(PlaceCategory::Culture, None).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
