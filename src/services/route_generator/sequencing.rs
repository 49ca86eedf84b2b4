use crate::config::SequencingStrategy;
use crate::models::{Coordinates, Place};
use crate::services::distance::DistanceEstimator;

/// Put the selected places in visiting order.
pub(super) fn sequence<'a>(
    strategy: SequencingStrategy,
    estimator: &DistanceEstimator,
    origin: &Coordinates,
    selected: Vec<&'a Place>,
) -> Vec<&'a Place> {
    match strategy {
        SequencingStrategy::Selection => selected,
        SequencingStrategy::NearestNeighbor => nearest_neighbor(estimator, origin, selected),
    }
}

/// Greedy tour from the origin: always walk to the closest unvisited place.
/// Equal distances go to the place selected first.
fn nearest_neighbor<'a>(
    estimator: &DistanceEstimator,
    origin: &Coordinates,
    mut remaining: Vec<&'a Place>,
) -> Vec<&'a Place> {
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut current = *origin;

    while !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_dist = f64::INFINITY;
        for (idx, place) in remaining.iter().enumerate() {
            let dist = estimator.distance(&current, &place.coordinates);
            if dist < best_dist {
                best_dist = dist;
                best_idx = idx;
            }
        }

        let next = remaining.remove(best_idx);
        current = next.coordinates;
        ordered.push(next);
    }

    ordered
}
