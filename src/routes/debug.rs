use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Check if collaborators are working
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut status = json!({
        "status": "ok",
        "checks": {}
    });

    // Route store
    let store = state.library.store();
    if store.health_check().await {
        status["checks"]["route_store"] = json!({"backend": store.backend_name(), "status": "ok"});
    } else {
        status["checks"]["route_store"] = json!({"backend": store.backend_name(), "status": "error"});
        status["status"] = json!("error");
    }

    // Pending route cache (degraded, not fatal)
    let pending = state.library.pending();
    let stats = pending.get_stats().await;
    if pending.health_check().await {
        status["checks"]["pending_cache"] = json!({"backend": pending.backend_name(), "status": "ok", "stats": stats});
    } else {
        status["checks"]["pending_cache"] = json!({"backend": pending.backend_name(), "status": "error"});
        if status["status"] == "ok" {
            status["status"] = json!("degraded");
        }
    }

    status["checks"]["place_catalog"] = json!(state.route_generator.catalog_backend());
    status["checks"]["weather"] = json!(state.route_generator.weather_backend());

    Json(status)
}
