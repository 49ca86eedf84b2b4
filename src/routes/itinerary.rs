use crate::constants::{GENERATION_PROGRESS_LOG_SECONDS, GENERATION_SLOW_WARNING_SECONDS};
use crate::error::{AppError, Result};
use crate::models::{CostEstimate, GenerationRequest, PlaceCategory, Route, TransportMode};
use crate::services::GenerationControl;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteListResponse {
    pub routes: Vec<Route>,
}

fn default_place_count() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub categories: Vec<PlaceCategory>,
    #[serde(default = "default_place_count")]
    pub place_count: u32,
    #[serde(default)]
    pub mode: TransportMode,
}

/// Either a full route (edited client-side) or the id of a pending one.
#[derive(Debug, Deserialize)]
pub struct SaveRouteRequest {
    #[serde(default)]
    pub route: Option<Route>,
    #[serde(default)]
    pub route_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_favorite() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_favorite")]
    pub favorite: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteResponse {
    pub id: Uuid,
    pub is_favorite: bool,
}

/// POST /routes/generate
/// Generate the economic, balanced and comfort itineraries for a request
pub async fn generate_routes(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<RouteListResponse>> {
    request.validate().map_err(AppError::InvalidRequest)?;

    tracing::info!(
        lat = request.origin.lat,
        lng = request.origin.lng,
        place_count = request.place_count,
        mode = %request.mode,
        "Itinerary request: ({:.4}, {:.4}), {} places, mode={}",
        request.origin.lat,
        request.origin.lng,
        request.place_count,
        request.mode
    );

    let routes = generate_with_deadline(&state, &request).await?;
    state.library.remember(&routes).await;

    Ok(Json(RouteListResponse { routes }))
}

/// Run a generation under the configured timeout, logging while it runs.
///
/// Dropping the returned future (client went away) cancels the generation.
async fn generate_with_deadline(state: &AppState, request: &GenerationRequest) -> Result<Vec<Route>> {
    let timeout_secs = state.generation_timeout_secs;
    let (control, progress) = GenerationControl::new().with_progress();
    let _cancel_on_drop = control.cancellation_token().drop_guard();

    let started = Instant::now();
    let deadline = started + Duration::from_secs(timeout_secs);
    let mut checkpoints: VecDeque<(u64, bool)> = GENERATION_PROGRESS_LOG_SECONDS
        .iter()
        .map(|&secs| (secs, false))
        .chain(std::iter::once((GENERATION_SLOW_WARNING_SECONDS, true)))
        .filter(|(secs, _)| *secs < timeout_secs)
        .collect();

    let generation = state.route_generator.generate_with(request, &control);
    tokio::pin!(generation);

    loop {
        let next_checkpoint = checkpoints.front().map(|(secs, _)| started + Duration::from_secs(*secs));
        let checkpoint = async move {
            match next_checkpoint {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = &mut generation => return result,
            _ = sleep_until(deadline) => {
                control.cancellation_token().cancel();
                return Err(AppError::Timeout(timeout_secs));
            }
            _ = checkpoint => {
                if let Some((secs, slow)) = checkpoints.pop_front() {
                    let stage = *progress.borrow();
                    if slow {
                        tracing::warn!(
                            elapsed_s = secs,
                            stage = ?stage,
                            "Route generation is taking longer than expected ({}s)",
                            secs
                        );
                    } else {
                        tracing::info!(elapsed_s = secs, stage = ?stage, "Still generating routes after {}s", secs);
                    }
                }
            }
        }
    }
}

/// POST /routes/estimate
/// Pre-flight cost projection, no catalog lookups
pub async fn estimate_cost(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<CostEstimate>> {
    Ok(Json(state.cost_model.estimate_projected_cost(
        &request.categories,
        request.place_count,
        request.mode,
    )))
}

/// POST /routes/save
pub async fn save_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveRouteRequest>,
) -> Result<Json<Route>> {
    let user_id = request.user_id.as_deref();
    let saved = match (request.route, request.route_id) {
        (Some(route), _) => state.library.save(&route, user_id).await?,
        (None, Some(id)) => state.library.save_pending(id, user_id).await?,
        (None, None) => {
            return Err(AppError::InvalidRequest(
                "either route or route_id is required".to_string(),
            ))
        }
    };
    Ok(Json(saved))
}

/// GET /routes/saved?user_id=
pub async fn list_saved_routes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<RouteListResponse>> {
    let routes = state.library.list(query.user_id.as_deref()).await?;
    Ok(Json(RouteListResponse { routes }))
}

/// GET /routes/{id}
pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>> {
    Ok(Json(state.library.lookup(id).await?))
}

/// POST /routes/{id}/favorite
pub async fn set_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<FavoriteResponse>> {
    let route = state
        .library
        .set_favorite(id, request.user_id.as_deref(), request.favorite)
        .await?;
    Ok(Json(FavoriteResponse {
        id: route.id,
        is_favorite: route.is_favorite,
    }))
}

/// DELETE /routes/{id}?user_id=
pub async fn delete_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Result<StatusCode> {
    state.library.delete(id, query.user_id.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
