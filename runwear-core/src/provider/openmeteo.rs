use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::{CityMatch, Coordinates, CurrentConditions};

use super::{AirQualityProvider, CitySearch, ReverseGeocoder, WeatherProvider, fetch_json, join_place};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";
const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1";

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,apparent_temperature,wind_speed_10m,weather_code";

/// Open-Meteo: weather, air quality and geocoding, no API key required.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    forecast_url: String,
    air_quality_url: String,
    geocoding_url: String,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self::with_base_urls(FORECAST_URL, AIR_QUALITY_URL, GEOCODING_URL)
    }

    pub fn with_base_urls(forecast_url: &str, air_quality_url: &str, geocoding_url: &str) -> Self {
        Self {
            http: Client::new(),
            forecast_url: forecast_url.to_string(),
            air_quality_url: air_quality_url.to_string(),
            geocoding_url: geocoding_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: Option<String>,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    wind_speed_10m: f64,
    weather_code: i64,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current: OmCurrent,
}

#[derive(Debug, Deserialize)]
struct OmAirCurrent {
    us_aqi: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OmAirResponse {
    current: OmAirCurrent,
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    name: Option<String>,
    admin1: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct OmGeocodingResponse {
    #[serde(default)]
    results: Option<Vec<OmPlace>>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn current_conditions(&self, at: Coordinates) -> Result<CurrentConditions> {
        let request = self.http.get(&self.forecast_url).query(&[
            ("latitude", at.latitude.to_string()),
            ("longitude", at.longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
        ]);

        let parsed: OmForecastResponse = fetch_json(request, "Open-Meteo forecast").await?;
        let current = parsed.current;

        let observation_time = current
            .time
            .as_deref()
            .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M").ok());

        debug!(
            temperature = current.temperature_2m,
            code = current.weather_code,
            "Open-Meteo current conditions"
        );

        Ok(CurrentConditions {
            temperature_c: current.temperature_2m,
            feels_like_c: current.apparent_temperature,
            humidity_pct: current.relative_humidity_2m,
            wind_speed_kmh: current.wind_speed_10m,
            weather_code: current.weather_code,
            observation_time,
        })
    }
}

#[async_trait]
impl AirQualityProvider for OpenMeteoProvider {
    async fn current_aqi(&self, at: Coordinates) -> Result<Option<i64>> {
        let request = self.http.get(&self.air_quality_url).query(&[
            ("latitude", at.latitude.to_string()),
            ("longitude", at.longitude.to_string()),
            ("current", "us_aqi".to_string()),
        ]);

        let parsed: OmAirResponse = fetch_json(request, "Open-Meteo air quality").await?;

        let aqi = parsed.current.us_aqi.map(|aqi| aqi.round() as i64);
        if aqi.is_none() {
            warn!(lat = at.latitude, lon = at.longitude, "no US AQI coverage");
        }
        Ok(aqi)
    }
}

#[async_trait]
impl CitySearch for OpenMeteoProvider {
    async fn search(&self, name: &str, limit: usize) -> Result<Vec<CityMatch>> {
        let request = self
            .http
            .get(format!("{}/search", self.geocoding_url))
            .query(&[
                ("name", name.to_string()),
                ("count", limit.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ]);

        let parsed: OmGeocodingResponse = fetch_json(request, "Open-Meteo geocoding").await?;

        Ok(parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|p| CityMatch {
                name: p.name.unwrap_or_default(),
                admin1: p.admin1.unwrap_or_default(),
                country: p.country.unwrap_or_default(),
                country_code: p.country_code.unwrap_or_default(),
                latitude: p.latitude,
                longitude: p.longitude,
            })
            .collect())
    }
}

#[async_trait]
impl ReverseGeocoder for OpenMeteoProvider {
    fn name(&self) -> &'static str {
        "open-meteo"
    }

    async fn place_name(&self, at: Coordinates) -> Result<Option<String>> {
        let request = self
            .http
            .get(format!("{}/reverse", self.geocoding_url))
            .query(&[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ]);

        let parsed: OmGeocodingResponse =
            fetch_json(request, "Open-Meteo reverse geocoding").await?;

        let Some(place) = parsed.results.and_then(|r| r.into_iter().next()) else {
            return Ok(None);
        };

        let location = join_place([
            place.name.as_deref(),
            place.admin1.as_deref(),
            place.country_code.as_deref(),
        ]);

        Ok((!location.is_empty()).then_some(location))
    }
}
