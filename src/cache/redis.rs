use crate::cache::{pending_key, CacheStats, PendingRouteCache};
use crate::error::{AppError, Result};
use crate::models::Route;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

/// Redis-backed pending-route cache. `ConnectionManager` is `Arc`-based
/// internally, so cloning it per call is cheap.
pub struct RedisRouteCache {
    connection: ConnectionManager,
    route_ttl: u64,
}

impl RedisRouteCache {
    pub async fn new(redis_url: &str, route_ttl: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!("Redis cache connection established");

        Ok(RedisRouteCache {
            connection,
            route_ttl,
        })
    }

    fn decode(id: Uuid, json: &str) -> Option<Route> {
        match serde_json::from_str(json) {
            Ok(route) => Some(route),
            Err(e) => {
                tracing::warn!("Failed to deserialize pending route {}: {}", id, e);
                None
            }
        }
    }
}

#[async_trait]
impl PendingRouteCache for RedisRouteCache {
    async fn put(&self, route: &Route) {
        let json = match serde_json::to_string(route) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize route for cache: {}", e);
                return;
            }
        };

        let mut conn = self.connection.clone();
        let result: redis::RedisResult<()> =
            conn.set_ex(pending_key(route.id), json, self.route_ttl).await;

        match result {
            Ok(()) => tracing::debug!(
                "Cached pending route {} with TTL {}s",
                route.id,
                self.route_ttl
            ),
            Err(e) => tracing::warn!("Failed to cache pending route {}: {}", route.id, e),
        }
    }

    async fn get(&self, id: Uuid) -> Option<Route> {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<Option<String>> = conn.get(pending_key(id)).await;

        match result {
            Ok(Some(json)) => Self::decode(id, &json),
            Ok(None) => {
                tracing::debug!("Cache miss for pending route: {}", id);
                None
            }
            Err(e) => {
                tracing::warn!("Redis error getting pending route: {}", e);
                None
            }
        }
    }

    async fn take(&self, id: Uuid) -> Option<Route> {
        let route = self.get(id).await?;

        let mut conn = self.connection.clone();
        let result: redis::RedisResult<()> = conn.del(pending_key(id)).await;
        if let Err(e) = result {
            tracing::warn!("Failed to evict pending route {}: {}", id, e);
        }

        Some(route)
    }

    async fn get_stats(&self) -> CacheStats {
        let mut conn = self.connection.clone();
        let info: redis::RedisResult<String> =
            redis::cmd("INFO").arg("stats").query_async(&mut conn).await;

        match info {
            Ok(info_str) => {
                let hits = parse_info_value(&info_str, "keyspace_hits");
                let misses = parse_info_value(&info_str, "keyspace_misses");
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
            Err(_) => CacheStats {
                hits: 0,
                misses: 0,
                hit_rate: 0.0,
                connected: false,
            },
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        result.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

fn parse_info_value(info: &str, key: &str) -> u64 {
    info.lines()
        .find(|line| line.starts_with(key))
        .and_then(|line| line.split(':').nth(1))
        .and_then(|val| val.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keyspace_counters() {
        let info = "# Stats\r\nkeyspace_hits:42\r\nkeyspace_misses:8\r\n";
        assert_eq!(parse_info_value(info, "keyspace_hits"), 42);
        assert_eq!(parse_info_value(info, "keyspace_misses"), 8);
        assert_eq!(parse_info_value(info, "evicted_keys"), 0);
    }

    #[test]
    fn pending_keys_are_namespaced() {
        let id = Uuid::nil();
        assert_eq!(
            pending_key(id),
            "route:pending:00000000-0000-0000-0000-000000000000"
        );
    }
}
