use crate::constants::*;
use crate::models::{Coordinates, SensitivityProfile, WeatherConditions};
use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisoryError {
    #[error("weather service unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected weather payload: {0}")]
    InvalidPayload(String),
}

/// Decides whether current conditions at a place suit the traveller.
///
/// An error means "no advice", never "unsuitable"; the route generator
/// keeps places whose check failed.
#[async_trait]
pub trait WeatherAdvisor: Send + Sync {
    async fn is_suitable(
        &self,
        location: &Coordinates,
        sensitivity: &SensitivityProfile,
    ) -> Result<bool, AdvisoryError>;

    fn backend_name(&self) -> &'static str;
}

/// Threshold rules for a traveller's sensitivity profile.
///
/// Each sensitivity step tightens the tolerated range: cold below
/// `15 - 2*cold` °C, heat above `25 + 2*heat` °C, humidity above
/// `70 + 5*humidity` %. Strong cold or heat sensitivity also rules out
/// rain, thunderstorms and snow.
pub fn evaluate_suitability(conditions: &WeatherConditions, sensitivity: &SensitivityProfile) -> bool {
    if sensitivity.cold > 0
        && conditions.temperature_c
            < WEATHER_COLD_BASE_C - WEATHER_COLD_STEP_C * sensitivity.cold as f64
    {
        return false;
    }

    if sensitivity.heat > 0
        && conditions.temperature_c
            > WEATHER_HEAT_BASE_C + WEATHER_HEAT_STEP_C * sensitivity.heat as f64
    {
        return false;
    }

    if sensitivity.humidity > 0
        && conditions.humidity_pct
            > WEATHER_HUMIDITY_BASE_PCT + WEATHER_HUMIDITY_STEP_PCT * sensitivity.humidity as f64
    {
        return false;
    }

    if conditions.is_precipitating() {
        return sensitivity.cold < WEATHER_PRECIPITATION_SENSITIVITY
            && sensitivity.heat < WEATHER_PRECIPITATION_SENSITIVITY;
    }

    true
}

/// Advisor used when no weather service is configured: everything is suitable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWeatherAdvisor;

#[async_trait]
impl WeatherAdvisor for NoopWeatherAdvisor {
    async fn is_suitable(
        &self,
        _location: &Coordinates,
        _sensitivity: &SensitivityProfile,
    ) -> Result<bool, AdvisoryError> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "disabled"
    }
}

#[derive(Deserialize)]
struct CurrentWeatherResponse {
    main: CurrentWeatherMain,
    #[serde(default)]
    weather: Vec<CurrentWeatherCondition>,
}

#[derive(Deserialize)]
struct CurrentWeatherMain {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct CurrentWeatherCondition {
    main: String,
}

impl TryFrom<CurrentWeatherResponse> for WeatherConditions {
    type Error = AdvisoryError;

    fn try_from(response: CurrentWeatherResponse) -> Result<Self, Self::Error> {
        if !response.main.temp.is_finite() || !response.main.humidity.is_finite() {
            return Err(AdvisoryError::InvalidPayload(
                "non-numeric temperature or humidity".to_string(),
            ));
        }
        Ok(WeatherConditions {
            temperature_c: response.main.temp,
            humidity_pct: response.main.humidity,
            condition: response
                .weather
                .into_iter()
                .next()
                .map(|w| w.main)
                .unwrap_or_else(|| "Clear".to_string()),
        })
    }
}

/// Current-weather client for an OpenWeatherMap-compatible endpoint.
///
/// Conditions are cached per rounded coordinate, so the candidates of one
/// neighbourhood share a single upstream call.
#[derive(Clone)]
pub struct HttpWeatherAdvisor {
    client: Client,
    base_url: String,
    api_key: String,
    conditions: Cache<String, WeatherConditions>,
}

impl HttpWeatherAdvisor {
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(COLLABORATOR_REQUEST_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build weather HTTP client ({}), using defaults", e);
                Client::new()
            });

        let conditions = Cache::builder()
            .time_to_live(Duration::from_secs(DEFAULT_WEATHER_CACHE_TTL_SECONDS))
            .max_capacity(DEFAULT_MEMORY_CACHE_MAX_ENTRIES)
            .build();

        HttpWeatherAdvisor {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            conditions,
        }
    }

    fn cache_key(location: &Coordinates) -> String {
        let rounded = location.round(CACHE_COORDINATE_PRECISION);
        format!("{:.3},{:.3}", rounded.lat, rounded.lng)
    }

    pub async fn current_conditions(
        &self,
        location: &Coordinates,
    ) -> Result<WeatherConditions, AdvisoryError> {
        let key = Self::cache_key(location);
        if let Some(conditions) = self.conditions.get(&key).await {
            tracing::debug!(location = %key, "Weather cache hit");
            return Ok(conditions);
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lng.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AdvisoryError::Unavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(
                status = %status,
                location = %key,
                "Weather API HTTP error {}",
                status
            );
            return Err(AdvisoryError::Unavailable(format!("HTTP {}", status)));
        }

        let payload: CurrentWeatherResponse = response
            .json()
            .await
            .map_err(|e| AdvisoryError::InvalidPayload(format!("Failed to parse response: {}", e)))?;
        let conditions = WeatherConditions::try_from(payload)?;

        tracing::debug!(
            location = %key,
            temperature_c = conditions.temperature_c,
            condition = %conditions.condition,
            "Fetched current weather"
        );

        self.conditions.insert(key, conditions.clone()).await;
        Ok(conditions)
    }
}

#[async_trait]
impl WeatherAdvisor for HttpWeatherAdvisor {
    async fn is_suitable(
        &self,
        location: &Coordinates,
        sensitivity: &SensitivityProfile,
    ) -> Result<bool, AdvisoryError> {
        let conditions = self.current_conditions(location).await?;
        Ok(evaluate_suitability(&conditions, sensitivity))
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
