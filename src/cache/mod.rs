pub mod memory;
pub mod redis;

use crate::models::Route;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

pub use self::memory::MemoryRouteCache;
pub use self::redis::RedisRouteCache;

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub connected: bool,
}

/// Generated routes the traveller has not saved yet, keyed by route id.
///
/// Entries expire on their own. Cache failures are logged and treated as
/// misses; a pending route is never load-bearing.
#[async_trait]
pub trait PendingRouteCache: Send + Sync {
    async fn put(&self, route: &Route);

    async fn get(&self, id: Uuid) -> Option<Route>;

    /// Remove and return.
    async fn take(&self, id: Uuid) -> Option<Route>;

    async fn get_stats(&self) -> CacheStats;

    async fn health_check(&self) -> bool;

    fn backend_name(&self) -> &'static str;
}

pub(crate) fn pending_key(id: Uuid) -> String {
    format!("route:pending:{}", id)
}
