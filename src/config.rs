use crate::constants::*;
use crate::models::PlaceCategory;
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

/// How selected places are put in visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencingStrategy {
    /// Visit places in the order the variant policy selected them
    #[default]
    Selection,
    /// Greedy nearest-neighbour tour starting from the origin
    NearestNeighbor,
}

impl FromStr for SequencingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "selection" => Ok(SequencingStrategy::Selection),
            "nearest_neighbor" | "nearest-neighbor" => Ok(SequencingStrategy::NearestNeighbor),
            _ => Err(format!(
                "Invalid sequencing strategy: {}. Use 'selection' or 'nearest_neighbor'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// PostgreSQL catalog + route store; in-memory collaborators when absent
    pub database_url: Option<String>,
    /// Redis pending-route cache; moka when absent or unreachable
    pub redis_url: Option<String>,
    /// Current-weather endpoint; weather filtering is skipped when absent
    pub weather_api_url: Option<String>,
    pub weather_api_key: Option<String>,
    pub pending_route_ttl: u64,
    pub generation_timeout_secs: u64,
    pub route_generator: RouteGeneratorConfig,
}

/// Pricing policy for stops and transport legs.
#[derive(Debug, Clone, PartialEq)]
pub struct CostPolicy {
    /// Flat fare per public-transport leg
    pub public_transport_fare: f64,
    /// Fuel cost per driven kilometer
    pub car_cost_per_km: f64,
    /// Parking fee per driven leg
    pub car_parking_fee: f64,
    /// Share of MIXED legs walked for free (0.0-1.0); the rest ride transit
    pub mixed_walking_share: f64,
    /// Assumed leg length for pre-flight projections
    pub projection_segment_km: f64,
    /// Average spend per place, by category
    pub category_averages: BTreeMap<PlaceCategory, f64>,
    /// Fallback when a category has no entry in the table
    pub unknown_category_average: f64,
}

impl Default for CostPolicy {
    fn default() -> Self {
        Self {
            public_transport_fare: 2.50,
            car_cost_per_km: 0.10,
            car_parking_fee: 3.0,
            mixed_walking_share: 0.5,
            projection_segment_km: 2.0,
            category_averages: BTreeMap::from([
                (PlaceCategory::Restaurant, 20.0),
                (PlaceCategory::Culture, 10.0),
                (PlaceCategory::Leisure, 15.0),
                (PlaceCategory::Discovery, 12.0),
            ]),
            unknown_category_average: 15.0,
        }
    }
}

impl CostPolicy {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let category_averages = match env::var("COST_CATEGORY_AVERAGES") {
            Ok(raw) => parse_category_averages(&raw)?,
            Err(_) => defaults.category_averages.clone(),
        };

        let policy = Self {
            public_transport_fare: env_or("COST_PUBLIC_TRANSPORT_FARE", defaults.public_transport_fare)?,
            car_cost_per_km: env_or("COST_CAR_PER_KM", defaults.car_cost_per_km)?,
            car_parking_fee: env_or("COST_CAR_PARKING_FEE", defaults.car_parking_fee)?,
            mixed_walking_share: env_or("COST_MIXED_WALKING_SHARE", defaults.mixed_walking_share)?,
            projection_segment_km: env_or("COST_PROJECTION_SEGMENT_KM", defaults.projection_segment_km)?,
            category_averages,
            unknown_category_average: env_or(
                "COST_UNKNOWN_CATEGORY_AVERAGE",
                defaults.unknown_category_average,
            )?,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("COST_PUBLIC_TRANSPORT_FARE", self.public_transport_fare),
            ("COST_CAR_PER_KM", self.car_cost_per_km),
            ("COST_CAR_PARKING_FEE", self.car_parking_fee),
            ("COST_PROJECTION_SEGMENT_KM", self.projection_segment_km),
            ("COST_UNKNOWN_CATEGORY_AVERAGE", self.unknown_category_average),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }
        if !(0.0..=1.0).contains(&self.mixed_walking_share) {
            return Err("COST_MIXED_WALKING_SHARE must be between 0 and 1".to_string());
        }
        if self.category_averages.values().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("COST_CATEGORY_AVERAGES values must be non-negative".to_string());
        }
        Ok(())
    }

    /// Average spend for a category, falling back to the unknown-category value.
    pub fn category_average(&self, category: PlaceCategory) -> f64 {
        self.category_averages
            .get(&category)
            .copied()
            .unwrap_or(self.unknown_category_average)
    }
}

/// Parse `RESTAURANT=20,CULTURE=10` into a category table.
fn parse_category_averages(raw: &str) -> Result<BTreeMap<PlaceCategory, f64>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| format!("Invalid COST_CATEGORY_AVERAGES entry: '{}'", entry))?;
            let category: PlaceCategory = name.parse()?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| format!("Invalid COST_CATEGORY_AVERAGES value: '{}'", entry))?;
            Ok((category, value))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct RouteGeneratorConfig {
    /// Radius (km) around the origin used to scope catalog queries
    pub catalog_search_radius_km: f64,

    /// Highest average cost a non-required place may have in the ECONOMIC variant
    pub economic_cost_threshold: f64,

    /// Place cap for the ECONOMIC variant (the request's count caps it further)
    pub economic_max_places: usize,

    /// Place cap for the BALANCED variant
    pub balanced_max_places: usize,

    /// Place cap for the COMFORT variant
    pub comfort_max_places: usize,

    /// Visit length when the catalog has no specific estimate
    pub default_stop_duration_minutes: u32,

    /// A route is flagged over budget past `max_budget * budget_tolerance`
    pub budget_tolerance: f64,

    pub sequencing: SequencingStrategy,

    pub cost_policy: CostPolicy,
}

impl Default for RouteGeneratorConfig {
    fn default() -> Self {
        Self {
            catalog_search_radius_km: 2.0,
            economic_cost_threshold: 10.0,
            economic_max_places: 5,
            balanced_max_places: 7,
            comfort_max_places: 8,
            default_stop_duration_minutes: 60,
            budget_tolerance: 1.1,
            sequencing: SequencingStrategy::default(),
            cost_policy: CostPolicy::default(),
        }
    }
}

impl RouteGeneratorConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            catalog_search_radius_km: env_or(
                "ROUTE_CATALOG_SEARCH_RADIUS_KM",
                defaults.catalog_search_radius_km,
            )?,
            economic_cost_threshold: env_or(
                "ROUTE_ECONOMIC_COST_THRESHOLD",
                defaults.economic_cost_threshold,
            )?,
            economic_max_places: env_or("ROUTE_ECONOMIC_MAX_PLACES", defaults.economic_max_places)?,
            balanced_max_places: env_or("ROUTE_BALANCED_MAX_PLACES", defaults.balanced_max_places)?,
            comfort_max_places: env_or("ROUTE_COMFORT_MAX_PLACES", defaults.comfort_max_places)?,
            default_stop_duration_minutes: env_or(
                "ROUTE_DEFAULT_STOP_DURATION_MINUTES",
                defaults.default_stop_duration_minutes,
            )?,
            budget_tolerance: env_or("ROUTE_BUDGET_TOLERANCE", defaults.budget_tolerance)?,
            sequencing: env::var("ROUTE_SEQUENCING")
                .unwrap_or_else(|_| "selection".to_string())
                .parse()?,
            cost_policy: CostPolicy::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.catalog_search_radius_km > 0.0 && self.catalog_search_radius_km <= 50.0) {
            return Err("ROUTE_CATALOG_SEARCH_RADIUS_KM must be between 0 and 50".to_string());
        }
        if !self.economic_cost_threshold.is_finite() || self.economic_cost_threshold < 0.0 {
            return Err("ROUTE_ECONOMIC_COST_THRESHOLD must be non-negative".to_string());
        }
        if self.economic_max_places == 0 || self.balanced_max_places == 0 || self.comfort_max_places == 0 {
            return Err("Variant place caps must be at least 1".to_string());
        }
        if self.default_stop_duration_minutes == 0 {
            return Err("ROUTE_DEFAULT_STOP_DURATION_MINUTES must be positive".to_string());
        }
        if !(self.budget_tolerance >= 1.0) {
            return Err("ROUTE_BUDGET_TOLERANCE must be at least 1.0".to_string());
        }
        self.cost_policy.validate()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let generation_timeout_secs: u64 =
            env_or("GENERATION_TIMEOUT_SECS", DEFAULT_GENERATION_TIMEOUT_SECONDS)?;
        if generation_timeout_secs == 0 {
            return Err("GENERATION_TIMEOUT_SECS must be positive".to_string());
        }

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            database_url: non_empty_var("DATABASE_URL"),
            redis_url: non_empty_var("REDIS_URL"),
            weather_api_url: non_empty_var("WEATHER_API_URL"),
            weather_api_key: non_empty_var("WEATHER_API_KEY"),
            pending_route_ttl: env_or("PENDING_ROUTE_TTL", DEFAULT_PENDING_ROUTE_TTL_SECONDS)?,
            generation_timeout_secs,
            route_generator: RouteGeneratorConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr + ToString,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| format!("Invalid {}", key))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
