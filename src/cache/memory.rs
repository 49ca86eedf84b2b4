use crate::cache::{CacheStats, PendingRouteCache};
use crate::models::Route;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// In-memory pending-route cache backed by moka with TTL and bounded capacity.
pub struct MemoryRouteCache {
    routes: Cache<Uuid, Arc<Route>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryRouteCache {
    pub fn new(route_ttl_seconds: u64, max_capacity: u64) -> Self {
        let routes = Cache::builder()
            .time_to_live(Duration::from_secs(route_ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        MemoryRouteCache {
            routes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn record(&self, found: bool, id: Uuid) {
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Memory cache hit for pending route: {}", id);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Memory cache miss for pending route: {}", id);
        }
    }
}

#[async_trait]
impl PendingRouteCache for MemoryRouteCache {
    async fn put(&self, route: &Route) {
        self.routes.insert(route.id, Arc::new(route.clone())).await;
    }

    async fn get(&self, id: Uuid) -> Option<Route> {
        let found = self.routes.get(&id).await.map(|r| (*r).clone());
        self.record(found.is_some(), id);
        found
    }

    async fn take(&self, id: Uuid) -> Option<Route> {
        let found = self.routes.remove(&id).await.map(|r| (*r).clone());
        self.record(found.is_some(), id);
        found
    }

    async fn get_stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
            connected: true,
        }
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
