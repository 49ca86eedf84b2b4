use crate::constants::*;
use crate::models::{Coordinates, TransportMode};

/// Offline distance and travel-time approximation between two points.
///
/// Distances are great-circle (haversine) kilometers; durations divide by a
/// fixed average speed per transport mode. Good enough for planning a day,
/// not for navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceEstimator;

impl DistanceEstimator {
    pub fn new() -> Self {
        DistanceEstimator
    }

    /// Great-circle distance in kilometers.
    pub fn distance(&self, a: &Coordinates, b: &Coordinates) -> f64 {
        a.distance_to(b)
    }

    /// Travel time in whole minutes, rounded to the nearest minute.
    pub fn duration(&self, distance_km: f64, mode: TransportMode) -> u32 {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return 0;
        }
        let hours = distance_km / Self::speed_kmh(mode);
        (hours * 60.0).round() as u32
    }

    pub fn speed_kmh(mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walking => WALKING_SPEED_KMH,
            TransportMode::Bicycle => BICYCLE_SPEED_KMH,
            TransportMode::PublicTransport => PUBLIC_TRANSPORT_SPEED_KMH,
            TransportMode::Car => CAR_SPEED_KMH,
            TransportMode::Mixed => MIXED_SPEED_KMH,
        }
    }
}
