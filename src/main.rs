use axum::Router;
use easytrip::cache::{MemoryRouteCache, PendingRouteCache, RedisRouteCache};
use easytrip::config::Config;
use easytrip::constants::{DEFAULT_CATALOG_CACHE_TTL_SECONDS, DEFAULT_MEMORY_CACHE_MAX_ENTRIES};
use easytrip::db::{MemoryRouteStore, PgPlaceRepository, PgRouteStore, PlaceRepository, RouteStore};
use easytrip::services::{
    CachedCatalog, CostModel, HttpWeatherAdvisor, InMemoryCatalog, NoopWeatherAdvisor, PlaceCatalog,
    RepositoryCatalog, RouteGenerator, RouteLibrary, WeatherAdvisor,
};
use easytrip::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "easytrip=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting EasyTrip API server");
    tracing::info!("Configuration loaded successfully");

    // Place catalog and route store: Postgres when configured, in-memory otherwise
    let generator_config = config.route_generator.clone();
    let (catalog, store): (Arc<dyn PlaceCatalog>, Arc<dyn RouteStore>) =
        if let Some(ref database_url) = config.database_url {
            tracing::info!("Connecting to database...");
            let db_pool = easytrip::db::create_pool(database_url).await?;
            tracing::info!("Database connection established");

            tracing::info!("Creating database schema...");
            easytrip::db::create_schema(&db_pool).await?;
            tracing::info!("Database schema ready");

            let place_repo: Arc<dyn PlaceRepository> = Arc::new(PgPlaceRepository::new(db_pool.clone()));
            let catalog: Arc<dyn PlaceCatalog> = Arc::new(RepositoryCatalog::new(
                place_repo,
                generator_config.catalog_search_radius_km,
            ));
            (
                Arc::new(CachedCatalog::new(catalog, DEFAULT_CATALOG_CACHE_TTL_SECONDS)),
                Arc::new(PgRouteStore::new(db_pool)),
            )
        } else {
            tracing::warn!("DATABASE_URL not configured. Using an empty in-memory catalog and route store.");
            (
                Arc::new(
                    InMemoryCatalog::new(Vec::new())
                        .with_radius(generator_config.catalog_search_radius_km),
                ),
                Arc::new(MemoryRouteStore::new()),
            )
        };

    // Pending routes: try Redis, fall back to in-memory
    let pending: Arc<dyn PendingRouteCache> = if let Some(ref redis_url) = config.redis_url {
        tracing::info!("Connecting to Redis cache...");
        match RedisRouteCache::new(redis_url, config.pending_route_ttl).await {
            Ok(redis_cache) => {
                tracing::info!("Redis cache connection established");
                Arc::new(redis_cache)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis: {}. Falling back to in-memory cache.",
                    e
                );
                Arc::new(MemoryRouteCache::new(
                    config.pending_route_ttl,
                    DEFAULT_MEMORY_CACHE_MAX_ENTRIES,
                ))
            }
        }
    } else {
        tracing::info!("Redis URL not configured. Using in-memory cache.");
        Arc::new(MemoryRouteCache::new(
            config.pending_route_ttl,
            DEFAULT_MEMORY_CACHE_MAX_ENTRIES,
        ))
    };

    let advisor: Arc<dyn WeatherAdvisor> = match (&config.weather_api_url, &config.weather_api_key) {
        (Some(url), Some(key)) => {
            tracing::info!("Weather advisory enabled ({})", url);
            Arc::new(HttpWeatherAdvisor::new(url.clone(), key.clone()))
        }
        _ => {
            tracing::info!("Weather API not configured. Weather filtering disabled.");
            Arc::new(NoopWeatherAdvisor)
        }
    };

    // Initialize services
    let cost_model = CostModel::new(generator_config.cost_policy.clone());
    let route_generator = RouteGenerator::new(catalog, advisor, generator_config);
    let library = RouteLibrary::new(pending, store);

    // Create application state
    let state = Arc::new(AppState {
        route_generator,
        cost_model,
        library,
        generation_timeout_secs: config.generation_timeout_secs,
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", easytrip::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
