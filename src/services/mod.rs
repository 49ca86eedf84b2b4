pub mod catalog;
pub mod cost_model;
pub mod distance;
pub mod route_generator;
pub mod route_library;
pub mod weather;

pub use catalog::{CachedCatalog, CatalogError, InMemoryCatalog, PlaceCatalog, RepositoryCatalog};
pub use cost_model::CostModel;
pub use distance::DistanceEstimator;
pub use route_generator::{GenerationControl, GenerationStage, RouteGenerator};
pub use route_library::RouteLibrary;
pub use weather::{AdvisoryError, HttpWeatherAdvisor, NoopWeatherAdvisor, WeatherAdvisor};
