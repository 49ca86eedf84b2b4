pub mod debug;
pub mod itinerary;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/routes/generate", post(itinerary::generate_routes))
        .route("/routes/estimate", post(itinerary::estimate_cost))
        .route("/routes/save", post(itinerary::save_route))
        .route("/routes/saved", get(itinerary::list_saved_routes))
        .route(
            "/routes/{id}",
            get(itinerary::get_route).delete(itinerary::delete_route),
        )
        .route("/routes/{id}/favorite", post(itinerary::set_favorite))
        .route("/debug/health", get(debug::health_check))
        .with_state(state)
}
