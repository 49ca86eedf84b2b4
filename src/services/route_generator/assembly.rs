use crate::models::{Coordinates, Place, Route, RouteType, Stop, TimeSlot, TransportMode};
use crate::services::cost_model::CostModel;
use crate::services::distance::DistanceEstimator;
use std::collections::HashSet;
use uuid::Uuid;

/// Turns an ordered list of places into a priced, timed [`Route`].
pub(super) struct RouteAssembler {
    cost_model: CostModel,
    estimator: DistanceEstimator,
    default_stop_duration_minutes: u32,
}

impl RouteAssembler {
    pub fn new(
        cost_model: CostModel,
        estimator: DistanceEstimator,
        default_stop_duration_minutes: u32,
    ) -> Self {
        Self {
            cost_model,
            estimator,
            default_stop_duration_minutes,
        }
    }

    /// Visit length plus expected queueing.
    fn stop_duration(&self, place: &Place) -> u32 {
        place
            .estimated_visit_minutes
            .unwrap_or(self.default_stop_duration_minutes)
            + place.estimated_wait_minutes.unwrap_or(0)
    }

    /// Stop 1's leg starts at the origin; every other leg at the previous stop.
    pub fn assemble(
        &self,
        route_type: RouteType,
        mode: TransportMode,
        origin: &Coordinates,
        places: &[&Place],
        required_ids: &HashSet<&str>,
        city: Option<String>,
    ) -> Route {
        let mut previous = *origin;
        let legs_km: Vec<f64> = places
            .iter()
            .map(|place| {
                let d = self.estimator.distance(&previous, &place.coordinates);
                previous = place.coordinates;
                d
            })
            .collect();
        let leg_costs = self.cost_model.journey_transport_costs(mode, &legs_km);

        let stops: Vec<Stop> = places
            .iter()
            .zip(legs_km.iter().zip(leg_costs))
            .enumerate()
            .map(|(idx, (place, (&distance_km, transport_cost)))| {
                let order = idx as u32 + 1;
                Stop {
                    id: Uuid::new_v4(),
                    place: (*place).clone(),
                    order,
                    time_slot: TimeSlot::for_order(order),
                    estimated_duration_minutes: self.stop_duration(place),
                    distance_from_previous_km: distance_km,
                    travel_minutes: self.estimator.duration(distance_km, mode),
                    transport_cost,
                    cost: self.cost_model.stop_cost(place),
                    notes: required_ids
                        .contains(place.id.as_str())
                        .then(|| "Requested by the traveller".to_string()),
                }
            })
            .collect();

        Route::new(route_type, mode, city, stops)
    }
}
