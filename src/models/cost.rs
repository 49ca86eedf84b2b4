use crate::models::PlaceCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pre-flight cost projection shown before committing to generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostEstimate {
    /// Projected spend per requested category
    pub breakdown: BTreeMap<PlaceCategory, f64>,
    /// Sum of the breakdown
    pub total_cost: f64,
    pub transportation_cost: f64,
    /// `total_cost + transportation_cost`
    pub grand_total: f64,
}

impl CostEstimate {
    pub fn new(breakdown: BTreeMap<PlaceCategory, f64>, transportation_cost: f64) -> Self {
        let total_cost = breakdown.values().sum();
        CostEstimate {
            breakdown,
            total_cost,
            transportation_cost,
            grand_total: total_cost + transportation_cost,
        }
    }

    pub fn empty() -> Self {
        CostEstimate::new(BTreeMap::new(), 0.0)
    }
}
