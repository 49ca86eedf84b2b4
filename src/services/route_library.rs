use crate::cache::PendingRouteCache;
use crate::db::RouteStore;
use crate::error::{AppError, Result};
use crate::models::Route;
use std::sync::Arc;
use uuid::Uuid;

/// A traveller's routes, held in exactly one of two places.
///
/// Freshly generated routes are *pending*: cached, expiring, unsaved.
/// Saving or favoriting moves a route into the *store*. A route is never in
/// both; every transition removes it from the pending side.
pub struct RouteLibrary {
    pending: Arc<dyn PendingRouteCache>,
    store: Arc<dyn RouteStore>,
}

impl RouteLibrary {
    pub fn new(pending: Arc<dyn PendingRouteCache>, store: Arc<dyn RouteStore>) -> Self {
        Self { pending, store }
    }

    pub fn pending(&self) -> &dyn PendingRouteCache {
        self.pending.as_ref()
    }

    pub fn store(&self) -> &dyn RouteStore {
        self.store.as_ref()
    }

    /// Keep freshly generated routes around until they are saved or expire.
    pub async fn remember(&self, routes: &[Route]) {
        for route in routes {
            self.pending.put(route).await;
        }
        tracing::debug!(count = routes.len(), "Remembered pending routes");
    }

    /// Pending routes first, then persisted ones.
    pub async fn lookup(&self, id: Uuid) -> Result<Route> {
        match self.pending.get(id).await {
            Some(route) => Ok(route),
            None => self.store.get(id).await,
        }
    }

    /// Persist a route supplied by the caller. Any pending copy is dropped.
    ///
    /// The route is checked first; a route that breaks its own totals or
    /// stop order is rejected as an invalid request.
    pub async fn save(&self, route: &Route, user_id: Option<&str>) -> Result<Route> {
        route.validate().map_err(AppError::InvalidRequest)?;
        let saved = self.store.save(route, user_id).await?;
        self.pending.take(route.id).await;
        tracing::info!(route_id = %route.id, "Route saved");
        Ok(saved)
    }

    /// Move a pending route into the store.
    pub async fn save_pending(&self, id: Uuid, user_id: Option<&str>) -> Result<Route> {
        let route = self
            .pending
            .take(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("No pending route {}", id)))?;
        self.persist_taken(route, user_id).await
    }

    /// Make a route a favorite, persisting it first if it is still pending.
    pub async fn promote_to_favorite(&self, id: Uuid, user_id: Option<&str>) -> Result<Route> {
        match self.pending.take(id).await {
            Some(mut route) => {
                route.is_favorite = true;
                let saved = self.persist_taken(route, user_id).await?;
                tracing::info!(route_id = %id, "Pending route promoted to favorite");
                Ok(saved)
            }
            None => self.store.set_favorite(id, user_id, true).await,
        }
    }

    pub async fn set_favorite(&self, id: Uuid, user_id: Option<&str>, favorite: bool) -> Result<Route> {
        if favorite {
            return self.promote_to_favorite(id, user_id).await;
        }
        match self.pending.get(id).await {
            // pending routes are never favorites
            Some(route) => Ok(route),
            None => self.store.set_favorite(id, user_id, false).await,
        }
    }

    /// Discard a pending route or delete a persisted one.
    pub async fn delete(&self, id: Uuid, user_id: Option<&str>) -> Result<()> {
        if self.pending.take(id).await.is_some() {
            tracing::debug!(route_id = %id, "Discarded pending route");
            return Ok(());
        }
        self.store.delete(id, user_id).await?;
        tracing::info!(route_id = %id, "Route deleted");
        Ok(())
    }

    pub async fn list(&self, user_id: Option<&str>) -> Result<Vec<Route>> {
        self.store.list(user_id).await
    }

    /// Store a route already removed from the pending side. On failure it
    /// goes back to pending so the traveller can retry.
    async fn persist_taken(&self, route: Route, user_id: Option<&str>) -> Result<Route> {
        match self.store.save(&route, user_id).await {
            Ok(saved) => Ok(saved),
            Err(e) => {
                tracing::error!(route_id = %route.id, error = %e, "Failed to persist route");
                let mut restored = route;
                restored.is_favorite = false;
                self.pending.put(&restored).await;
                Err(e)
            }
        }
    }
}
