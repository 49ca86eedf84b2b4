// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod wire;

// Re-export commonly used types
pub use error::{AppError, Result};

use services::{CostModel, RouteGenerator, RouteLibrary};

// App state for sharing across the application
pub struct AppState {
    pub route_generator: RouteGenerator,
    pub cost_model: CostModel,
    pub library: RouteLibrary,
    pub generation_timeout_secs: u64,
}
