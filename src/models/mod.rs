pub mod coordinates;
pub mod cost;
pub mod geo;
pub mod place;
pub mod route;
pub mod weather;

pub use coordinates::Coordinates;
pub use cost::CostEstimate;
pub use geo::BoundingBox;
pub use place::{Place, PlaceCategory};
pub use route::{GenerationRequest, Route, RouteType, Stop, TimeSlot, TransportMode};
pub use weather::{SensitivityProfile, WeatherConditions, WeatherImpact};
