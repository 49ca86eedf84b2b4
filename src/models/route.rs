use crate::models::{Coordinates, Place, PlaceCategory, SensitivityProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// How the traveller moves between stops. Wire names live in [`crate::wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportMode {
    Walking,
    Bicycle,
    PublicTransport,
    Car,
    #[default]
    Mixed,
}

impl TransportMode {
    pub const ALL: [TransportMode; 5] = [
        TransportMode::Walking,
        TransportMode::Bicycle,
        TransportMode::PublicTransport,
        TransportMode::Car,
        TransportMode::Mixed,
    ];
}

/// Variant strategy that produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteType {
    Economic,
    Balanced,
    Comfort,
}

impl RouteType {
    /// Emission order of the variants.
    pub const ALL: [RouteType; 3] = [RouteType::Economic, RouteType::Balanced, RouteType::Comfort];

    pub fn label(&self) -> &'static str {
        match self {
            RouteType::Economic => "Economic",
            RouteType::Balanced => "Balanced",
            RouteType::Comfort => "Comfort",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    /// Fixed slotting by 1-based stop order: 1-2 morning, 3-5 afternoon, 6+ evening.
    pub fn for_order(order: u32) -> Self {
        match order {
            0..=2 => TimeSlot::Morning,
            3..=5 => TimeSlot::Afternoon,
            _ => TimeSlot::Evening,
        }
    }
}

/// One visit within a route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stop {
    pub id: Uuid,
    pub place: Place,
    /// 1-based position in the route
    pub order: u32,
    pub time_slot: TimeSlot,
    pub estimated_duration_minutes: u32,
    /// Great-circle distance from the previous stop (or from the origin for stop 1)
    pub distance_from_previous_km: f64,
    /// Travel time of the inbound leg; informational, not part of the route duration
    pub travel_minutes: u32,
    /// Transport cost of the inbound leg
    pub transport_cost: f64,
    /// Spend at the place itself
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub route_type: RouteType,
    /// Stop costs plus transport costs
    pub total_budget: f64,
    /// Sum of stop durations, in minutes
    pub total_duration_minutes: u32,
    pub transportation_mode: TransportMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_saved: bool,
    /// Set when the total exceeds the requested budget (with tolerance)
    #[serde(default)]
    pub exceeds_budget: bool,
    pub stops: Vec<Stop>,
}

impl Route {
    /// Build a route from assembled stops; totals are derived from the stops.
    pub fn new(
        route_type: RouteType,
        transportation_mode: TransportMode,
        city: Option<String>,
        stops: Vec<Stop>,
    ) -> Self {
        let total_budget = stops.iter().map(|s| s.cost + s.transport_cost).sum();
        let total_duration_minutes = stops.iter().map(|s| s.estimated_duration_minutes).sum();

        Route {
            id: Uuid::new_v4(),
            name: format!("{} itinerary", route_type.label()),
            route_type,
            total_budget,
            total_duration_minutes,
            transportation_mode,
            city,
            is_favorite: false,
            is_saved: false,
            exceeds_budget: false,
            stops,
        }
    }

    pub fn stop_cost_total(&self) -> f64 {
        self.stops.iter().map(|s| s.cost).sum()
    }

    pub fn transport_cost_total(&self) -> f64 {
        self.stops.iter().map(|s| s.transport_cost).sum()
    }

    pub fn place_ids(&self) -> Vec<&str> {
        self.stops.iter().map(|s| s.place.id.as_str()).collect()
    }

    /// Stop orders are exactly 1..=k in sequence.
    pub fn has_contiguous_order(&self) -> bool {
        self.stops
            .iter()
            .enumerate()
            .all(|(idx, stop)| stop.order as usize == idx + 1)
    }

    /// Check a route supplied from outside (e.g. edited by a client) before
    /// it is stored: contiguous stop order, valid places, non-negative costs
    /// and totals that add up.
    pub fn validate(&self) -> Result<(), String> {
        if !self.has_contiguous_order() {
            return Err("Stop order must run 1..n without gaps".to_string());
        }

        for stop in &self.stops {
            stop.place.validate()?;
            for (what, value) in [
                ("cost", stop.cost),
                ("transport cost", stop.transport_cost),
                ("distance", stop.distance_from_previous_km),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(format!("Stop {} has invalid {} {}", stop.order, what, value));
                }
            }
        }

        let expected_budget = self.stop_cost_total() + self.transport_cost_total();
        if !self.total_budget.is_finite() || (self.total_budget - expected_budget).abs() > 1e-6 {
            return Err(format!(
                "total_budget {} does not match stop and transport costs {}",
                self.total_budget, expected_budget
            ));
        }

        let expected_duration: u64 = self
            .stops
            .iter()
            .map(|s| u64::from(s.estimated_duration_minutes))
            .sum();
        if u64::from(self.total_duration_minutes) != expected_duration {
            return Err(format!(
                "total_duration_minutes {} does not match stop durations {}",
                self.total_duration_minutes, expected_duration
            ));
        }

        Ok(())
    }
}

fn default_place_count() -> u32 {
    5
}

/// Input to route generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub origin: Coordinates,
    pub categories: Vec<PlaceCategory>,
    #[serde(default)]
    pub max_budget: Option<f64>,
    #[serde(default = "default_place_count")]
    pub place_count: u32,
    #[serde(default)]
    pub mode: TransportMode,
    #[serde(default)]
    pub sensitivity: SensitivityProfile,
    /// Places that must appear in every variant when the catalog has them
    #[serde(default)]
    pub required_place_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl GenerationRequest {
    pub fn new(origin: Coordinates, categories: Vec<PlaceCategory>, place_count: u32) -> Self {
        GenerationRequest {
            origin,
            categories,
            max_budget: None,
            place_count,
            mode: TransportMode::default(),
            sensitivity: SensitivityProfile::default(),
            required_place_ids: Vec::new(),
            city: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.categories.is_empty() {
            return Err("categories must contain at least one category".to_string());
        }
        if self.place_count < 1 {
            return Err("place_count must be at least 1".to_string());
        }
        if let Some(budget) = self.max_budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err("max_budget must be a non-negative number".to_string());
            }
        }
        self.origin.validate()
    }

    /// Requested categories in request order, without repeats.
    pub fn distinct_categories(&self) -> Vec<PlaceCategory> {
        let mut seen = HashSet::new();
        self.categories
            .iter()
            .copied()
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Required place ids in request order, without repeats or blanks.
    pub fn distinct_required_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.required_place_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris() -> Coordinates {
        Coordinates::new(48.8566, 2.3522).unwrap()
    }

    #[test]
    fn test_time_slot_thresholds() {
        assert_eq!(TimeSlot::for_order(1), TimeSlot::Morning);
        assert_eq!(TimeSlot::for_order(2), TimeSlot::Morning);
        assert_eq!(TimeSlot::for_order(3), TimeSlot::Afternoon);
        assert_eq!(TimeSlot::for_order(5), TimeSlot::Afternoon);
        assert_eq!(TimeSlot::for_order(6), TimeSlot::Evening);
        assert_eq!(TimeSlot::for_order(12), TimeSlot::Evening);
    }

    #[test]
    fn test_request_validation() {
        let mut req = GenerationRequest::new(paris(), vec![PlaceCategory::Culture], 3);
        assert!(req.validate().is_ok());

        req.categories.clear();
        assert!(req.validate().is_err());

        req.categories = vec![PlaceCategory::Culture];
        req.place_count = 0;
        assert!(req.validate().is_err());

        req.place_count = 3;
        req.max_budget = Some(-5.0);
        assert!(req.validate().is_err());

        req.max_budget = Some(0.0);
        assert!(req.validate().is_ok());

        req.origin = Coordinates { lat: 0.0, lng: 200.0 };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_distinct_categories_and_required_ids() {
        let mut req = GenerationRequest::new(
            paris(),
            vec![
                PlaceCategory::Culture,
                PlaceCategory::Restaurant,
                PlaceCategory::Culture,
            ],
            3,
        );
        req.required_place_ids = vec!["b".into(), "a".into(), "b".into(), " ".into()];

        assert_eq!(
            req.distinct_categories(),
            vec![PlaceCategory::Culture, PlaceCategory::Restaurant]
        );
        assert_eq!(req.distinct_required_ids(), vec!["b", "a"]);
    }

    #[test]
    fn test_transport_mode_default() {
        assert_eq!(TransportMode::default(), TransportMode::Mixed);
    }

    fn stop(order: u32, cost: f64, transport_cost: f64) -> Stop {
        Stop {
            id: Uuid::new_v4(),
            place: Place::new(format!("p{}", order), "Place", PlaceCategory::Culture, paris())
                .with_average_cost(cost),
            order,
            time_slot: TimeSlot::for_order(order),
            estimated_duration_minutes: 60,
            distance_from_previous_km: 1.0,
            travel_minutes: 12,
            transport_cost,
            cost,
            notes: None,
        }
    }

    fn sample_route() -> Route {
        Route::new(
            RouteType::Balanced,
            TransportMode::PublicTransport,
            None,
            vec![stop(1, 10.0, 2.5), stop(2, 4.0, 2.5)],
        )
    }

    #[test]
    fn test_generated_route_validates() {
        assert!(sample_route().validate().is_ok());
        assert!(Route::new(RouteType::Economic, TransportMode::Car, None, vec![])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_tampered_routes() {
        let mut gap = sample_route();
        gap.stops[1].order = 3;
        assert!(gap.validate().is_err());

        let mut cheap = sample_route();
        cheap.total_budget -= 5.0;
        assert!(cheap.validate().is_err());

        let mut negative = sample_route();
        negative.stops[0].cost = -10.0;
        negative.total_budget -= 20.0;
        assert!(negative.validate().is_err());

        let mut lost = sample_route();
        lost.stops[0].place.coordinates = Coordinates { lat: 95.0, lng: 2.35 };
        assert!(lost.validate().is_err());

        let mut short = sample_route();
        short.total_duration_minutes = 5;
        assert!(short.validate().is_err());
    }
}
