use serde::{Deserialize, Serialize};

/// How strongly a place is exposed to cold, heat and humidity.
/// All-zero means the place is unaffected by the weather (indoor venue).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeatherImpact {
    #[serde(default)]
    pub cold: i32,
    #[serde(default)]
    pub heat: i32,
    #[serde(default)]
    pub humidity: i32,
}

impl WeatherImpact {
    pub fn is_neutral(&self) -> bool {
        self.cold == 0 && self.heat == 0 && self.humidity == 0
    }
}

/// Traveller's tolerance profile. Zero means "not sensitive".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SensitivityProfile {
    #[serde(default)]
    pub cold: i32,
    #[serde(default)]
    pub heat: i32,
    #[serde(default)]
    pub humidity: i32,
}

/// Current conditions at a location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConditions {
    pub temperature_c: f64,
    /// Relative humidity, 0-100
    pub humidity_pct: f64,
    /// Main condition label, e.g. "Clear", "Rain", "Snow"
    pub condition: String,
}

impl WeatherConditions {
    pub fn is_precipitating(&self) -> bool {
        ["rain", "thunderstorm", "snow"]
            .iter()
            .any(|c| self.condition.eq_ignore_ascii_case(c))
    }
}
