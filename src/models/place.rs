use crate::models::{Coordinates, WeatherImpact};
use serde::{Deserialize, Serialize};

/// Activity category a place belongs to. Wire names live in [`crate::wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaceCategory {
    Restaurant,
    Leisure,
    Discovery,
    Culture,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 4] = [
        PlaceCategory::Restaurant,
        PlaceCategory::Leisure,
        PlaceCategory::Discovery,
        PlaceCategory::Culture,
    ];
}

/// A point of interest as supplied by the place catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub category: PlaceCategory,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Average spend at the place, in currency units
    #[serde(default)]
    pub average_cost: Option<f64>,
    /// Expected queueing time on arrival, in minutes
    #[serde(default)]
    pub estimated_wait_minutes: Option<u32>,
    /// Catalog-specific visit length; the generator default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_visit_minutes: Option<u32>,
    #[serde(default)]
    pub weather_impact: WeatherImpact,
}

impl Place {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: PlaceCategory,
        coordinates: Coordinates,
    ) -> Self {
        Place {
            id: id.into(),
            name: name.into(),
            category,
            coordinates,
            address: None,
            description: None,
            average_cost: None,
            estimated_wait_minutes: None,
            estimated_visit_minutes: None,
            weather_impact: WeatherImpact::default(),
        }
    }

    pub fn with_average_cost(mut self, cost: f64) -> Self {
        self.average_cost = Some(cost);
        self
    }

    pub fn with_wait_minutes(mut self, minutes: u32) -> Self {
        self.estimated_wait_minutes = Some(minutes);
        self
    }

    pub fn with_weather_impact(mut self, impact: WeatherImpact) -> Self {
        self.weather_impact = impact;
        self
    }

    /// Average cost, treating an unknown cost as free.
    pub fn cost_or_zero(&self) -> f64 {
        self.average_cost.unwrap_or(0.0)
    }

    /// Reject records that would corrupt route arithmetic.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err(format!("Place '{}' has an empty id", self.name));
        }
        self.coordinates
            .validate()
            .map_err(|e| format!("Place '{}': {}", self.id, e))?;
        if let Some(cost) = self.average_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(format!(
                    "Place '{}' has invalid average cost {}",
                    self.id, cost
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn louvre() -> Place {
        Place::new(
            "louvre",
            "Louvre",
            PlaceCategory::Culture,
            Coordinates::new(48.8606, 2.3376).unwrap(),
        )
    }

    #[test]
    fn test_cost_or_zero() {
        assert_eq!(louvre().cost_or_zero(), 0.0);
        assert_eq!(louvre().with_average_cost(17.0).cost_or_zero(), 17.0);
    }

    #[test]
    fn test_validate_rejects_negative_cost() {
        assert!(louvre().validate().is_ok());
        assert!(louvre().with_average_cost(-1.0).validate().is_err());
        assert!(louvre().with_average_cost(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_coordinates_and_id() {
        let mut place = louvre();
        place.coordinates = Coordinates { lat: 120.0, lng: 0.0 };
        assert!(place.validate().is_err());

        let mut place = louvre();
        place.id = "  ".to_string();
        assert!(place.validate().is_err());
    }
}
