//! Stable application-wide constants.
//!
//! Values here are structural invariants and default fallbacks for
//! env-var-based configuration. Pricing and selection knobs that are policy
//! rather than structure live in [`RouteGeneratorConfig`](crate::config::RouteGeneratorConfig)
//! and [`CostPolicy`](crate::config::CostPolicy) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Cache TTL defaults (seconds, used when env vars are absent) ---

/// Generated-but-unsaved routes stay retrievable for 2 hours.
/// Overridden by `PENDING_ROUTE_TTL`.
pub const DEFAULT_PENDING_ROUTE_TTL_SECONDS: u64 = 7_200;
/// Maximum entries for the in-memory pending route cache.
pub const DEFAULT_MEMORY_CACHE_MAX_ENTRIES: u64 = 10_000;
/// Catalog query results are reused for 15 minutes.
pub const DEFAULT_CATALOG_CACHE_TTL_SECONDS: u64 = 900;
/// Current weather per location is reused for 10 minutes.
pub const DEFAULT_WEATHER_CACHE_TTL_SECONDS: u64 = 600;
/// Decimal places kept when keying caches by coordinates (~100m).
pub const CACHE_COORDINATE_PRECISION: u32 = 3;

// --- Generation timing ---

/// Upper bound on a whole generate call. Overridden by `GENERATION_TIMEOUT_SECS`.
pub const DEFAULT_GENERATION_TIMEOUT_SECONDS: u64 = 60;
/// Progress is logged at these elapsed times (seconds) while a generation runs.
pub const GENERATION_PROGRESS_LOG_SECONDS: [u64; 2] = [2, 4];
/// Past this elapsed time the generation is reported as slow.
pub const GENERATION_SLOW_WARNING_SECONDS: u64 = 30;
/// Timeout for a single call to a remote collaborator.
pub const COLLABORATOR_REQUEST_TIMEOUT_SECONDS: u64 = 10;

// --- Travel speeds (km/h) used to turn distance into minutes ---

pub const WALKING_SPEED_KMH: f64 = 5.0;
pub const BICYCLE_SPEED_KMH: f64 = 15.0;
pub const PUBLIC_TRANSPORT_SPEED_KMH: f64 = 20.0;
pub const CAR_SPEED_KMH: f64 = 30.0;
/// Half walking, half transit: harmonic mean of 5 and 20 km/h.
pub const MIXED_SPEED_KMH: f64 = 8.0;

// --- Weather suitability thresholds ---
// A sensitive traveller tolerates less as their sensitivity grows:
// cold limit = 15 - 2 * cold, heat limit = 25 + 2 * heat,
// humidity limit = 70 + 5 * humidity.

pub const WEATHER_COLD_BASE_C: f64 = 15.0;
pub const WEATHER_COLD_STEP_C: f64 = 2.0;
pub const WEATHER_HEAT_BASE_C: f64 = 25.0;
pub const WEATHER_HEAT_STEP_C: f64 = 2.0;
pub const WEATHER_HUMIDITY_BASE_PCT: f64 = 70.0;
pub const WEATHER_HUMIDITY_STEP_PCT: f64 = 5.0;
/// Sensitivity at or above which precipitation makes outdoor places unsuitable.
pub const WEATHER_PRECIPITATION_SENSITIVITY: i32 = 3;

// --- Catalog limits ---

/// Maximum places requested from a repository per category query.
pub const CATALOG_QUERY_LIMIT: i64 = 200;
