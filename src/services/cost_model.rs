use crate::config::CostPolicy;
use crate::models::{CostEstimate, Place, PlaceCategory, TransportMode};
use std::collections::{BTreeMap, HashSet};

/// Prices stops and transport legs.
///
/// The same model backs both the pre-flight [`CostEstimate`] and the real
/// route totals, so the two never disagree on fares or rates.
#[derive(Debug, Clone)]
pub struct CostModel {
    policy: CostPolicy,
}

impl CostModel {
    pub fn new(policy: CostPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CostPolicy {
        &self.policy
    }

    /// Spend at a place; unknown costs count as free.
    pub fn stop_cost(&self, place: &Place) -> f64 {
        place.cost_or_zero()
    }

    /// Cost of a single leg travelled on its own.
    ///
    /// For MIXED this is the one-leg journey, which rides transit.
    pub fn segment_transport_cost(&self, mode: TransportMode, distance_km: f64) -> f64 {
        self.journey_transport_costs(mode, &[distance_km])[0]
    }

    /// Cost attributed to each leg of a journey, in leg order.
    ///
    /// MIXED walks the `floor(n * mixed_walking_share)` shortest legs for free
    /// (ties go to the earlier leg) and pays the transit fare on the rest, which
    /// keeps the journey between the walking-only and car-only totals.
    pub fn journey_transport_costs(&self, mode: TransportMode, legs_km: &[f64]) -> Vec<f64> {
        match mode {
            TransportMode::Walking | TransportMode::Bicycle => vec![0.0; legs_km.len()],
            TransportMode::PublicTransport => vec![self.policy.public_transport_fare; legs_km.len()],
            TransportMode::Car => legs_km
                .iter()
                .map(|d| d.max(0.0) * self.policy.car_cost_per_km + self.policy.car_parking_fee)
                .collect(),
            TransportMode::Mixed => {
                let walked = (legs_km.len() as f64 * self.policy.mixed_walking_share).floor() as usize;

                let mut by_length: Vec<usize> = (0..legs_km.len()).collect();
                by_length.sort_by(|&a, &b| legs_km[a].total_cmp(&legs_km[b]).then(a.cmp(&b)));
                let walked_legs: HashSet<usize> = by_length.into_iter().take(walked).collect();

                (0..legs_km.len())
                    .map(|idx| {
                        if walked_legs.contains(&idx) {
                            0.0
                        } else {
                            self.policy.public_transport_fare
                        }
                    })
                    .collect()
            }
        }
    }

    /// Total transport cost of a journey.
    pub fn journey_transport_cost(&self, mode: TransportMode, legs_km: &[f64]) -> f64 {
        self.journey_transport_costs(mode, legs_km).iter().sum()
    }

    /// Total for `legs` legs of `distance_km` each, without materialising them.
    ///
    /// Agrees with [`CostModel::journey_transport_cost`] on the same journey.
    pub fn uniform_journey_cost(&self, mode: TransportMode, legs: u64, distance_km: f64) -> f64 {
        let n = legs as f64;
        match mode {
            TransportMode::Walking | TransportMode::Bicycle => 0.0,
            TransportMode::PublicTransport => n * self.policy.public_transport_fare,
            TransportMode::Car => {
                n * (distance_km.max(0.0) * self.policy.car_cost_per_km + self.policy.car_parking_fee)
            }
            TransportMode::Mixed => {
                let walked = (n * self.policy.mixed_walking_share).floor().min(n);
                (n - walked) * self.policy.public_transport_fare
            }
        }
    }

    /// Rough cost of a trip before any place is picked.
    ///
    /// Places are spread evenly over the distinct requested categories and
    /// priced at the category average; transport assumes `place_count - 1`
    /// legs of `projection_segment_km` each.
    pub fn estimate_projected_cost(
        &self,
        categories: &[PlaceCategory],
        place_count: u32,
        mode: TransportMode,
    ) -> CostEstimate {
        let mut seen = HashSet::new();
        let distinct: Vec<PlaceCategory> = categories
            .iter()
            .copied()
            .filter(|c| seen.insert(*c))
            .collect();

        if distinct.is_empty() {
            return CostEstimate::empty();
        }

        let places_per_category = place_count as f64 / distinct.len() as f64;
        let breakdown: BTreeMap<PlaceCategory, f64> = distinct
            .iter()
            .map(|&category| {
                (
                    category,
                    places_per_category * self.policy.category_average(category),
                )
            })
            .collect();

        let segments = place_count.saturating_sub(1) as u64;
        let transportation_cost =
            self.uniform_journey_cost(mode, segments, self.policy.projection_segment_km);

        tracing::debug!(
            categories = distinct.len(),
            place_count = place_count,
            mode = %mode,
            transportation_cost = transportation_cost,
            "Projected trip cost"
        );

        CostEstimate::new(breakdown, transportation_cost)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new(CostPolicy::default())
    }
}
