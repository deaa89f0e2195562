//! User-facing operations: city search, weather lookup and clothing suggestions.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    classify::classify,
    config::Config,
    enrich::{Describer, Enricher},
    error::ServiceError,
    geocode::ReverseChain,
    model::{CityMatch, Coordinates, Exertion, LocationQuery, Observation, Suggestion, WeatherReport},
    provider::{
        AirQualityProvider, CitySearch, ReverseGeocoder, WeatherProvider,
        nominatim::NominatimProvider, openmeteo::OpenMeteoProvider,
        openrouter::OpenRouterDescriber,
    },
    weather_codes,
};

pub const CITY_SEARCH_LIMIT: usize = 5;

/// Suggestion request as sent by a client. Every field is required; absence is a client error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub feels_like: Option<f64>,
    pub aqi: Option<f64>,
    pub weather_code: Option<i64>,
    /// "low", "high" or "both".
    pub intensity: Option<String>,
}

/// Which exertion levels a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExertionRequest {
    Single(Exertion),
    Both,
}

impl TryFrom<&str> for ExertionRequest {
    type Error = ServiceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("both") {
            return Ok(Self::Both);
        }
        Exertion::try_from(value)
            .map(Self::Single)
            .map_err(|_| ServiceError::InvalidIntensity(value.to_string()))
    }
}

impl SuggestionRequest {
    pub fn from_report(report: &WeatherReport, intensity: &str) -> Self {
        Self {
            temperature: Some(report.temperature),
            humidity: Some(report.humidity),
            wind_speed: Some(report.wind_speed),
            feels_like: Some(report.feels_like),
            aqi: Some(report.aqi_or_clean()),
            weather_code: Some(report.weather_code),
            intensity: Some(intensity.to_string()),
        }
    }

    /// Validated observation (at low exertion) plus the requested levels.
    pub fn parse(&self) -> Result<(Observation, ExertionRequest), ServiceError> {
        let (
            Some(temperature),
            Some(humidity),
            Some(wind_speed),
            Some(feels_like),
            Some(aqi),
            Some(weather_code),
            Some(intensity),
        ) = (
            self.temperature,
            self.humidity,
            self.wind_speed,
            self.feels_like,
            self.aqi,
            self.weather_code,
            self.intensity.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        )
        else {
            return Err(ServiceError::MissingFields);
        };

        let exertion = ExertionRequest::try_from(intensity)?;

        let observation = Observation {
            temperature_c: temperature,
            feels_like_c: feels_like,
            humidity_pct: humidity,
            wind_speed_kmh: wind_speed,
            aqi,
            weather_code,
            exertion: Exertion::Low,
        };

        Ok((observation, exertion))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionResponse {
    Both { low: Suggestion, high: Suggestion },
    Single(Suggestion),
}

/// Wires providers, the classifier and enrichment together.
#[derive(Debug, Clone)]
pub struct Advisor {
    weather: Arc<dyn WeatherProvider>,
    air_quality: Arc<dyn AirQualityProvider>,
    cities: Arc<dyn CitySearch>,
    reverse: ReverseChain,
    enricher: Enricher,
}

impl Advisor {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        air_quality: Arc<dyn AirQualityProvider>,
        cities: Arc<dyn CitySearch>,
        reverse: ReverseChain,
        enricher: Enricher,
    ) -> Self {
        Self { weather, air_quality, cities, reverse, enricher }
    }

    /// Open-Meteo for data, Nominatim then Open-Meteo for reverse lookups,
    /// and OpenRouter when a key is configured.
    pub fn from_config(config: &Config) -> Self {
        let open_meteo = Arc::new(OpenMeteoProvider::new());
        let nominatim = Arc::new(NominatimProvider::new(config.user_agent()));

        let reverse = ReverseChain::new(vec![
            nominatim as Arc<dyn ReverseGeocoder>,
            open_meteo.clone() as Arc<dyn ReverseGeocoder>,
        ]);

        let describer = config
            .text_generation()
            .map(|tg| Arc::new(OpenRouterDescriber::new(tg)) as Arc<dyn Describer>);

        Self::new(
            open_meteo.clone(),
            open_meteo.clone(),
            open_meteo,
            reverse,
            Enricher::new(describer),
        )
    }

    pub async fn search_cities(&self, query: &str) -> Result<Vec<CityMatch>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::MissingCity);
        }

        self.cities
            .search(query, CITY_SEARCH_LIMIT)
            .await
            .map_err(ServiceError::upstream("Failed to search cities"))
    }

    pub async fn weather(&self, query: &LocationQuery) -> Result<WeatherReport, ServiceError> {
        let (at, location) = match query {
            LocationQuery::City(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ServiceError::MissingLocation);
                }
                let city = self
                    .cities
                    .search(name, 1)
                    .await
                    .map_err(ServiceError::upstream("Failed to fetch weather data"))?
                    .into_iter()
                    .next()
                    .ok_or(ServiceError::CityNotFound)?;
                (city.coordinates(), city.display_name())
            }
            LocationQuery::Coordinates(at) => {
                if !at.latitude.is_finite() || !at.longitude.is_finite() {
                    return Err(ServiceError::MissingLocation);
                }
                (*at, self.reverse.resolve(*at).await)
            }
        };

        self.report_at(at, location).await
    }

    async fn report_at(&self, at: Coordinates, location: String) -> Result<WeatherReport, ServiceError> {
        let (current, aqi) = tokio::try_join!(
            self.weather.current_conditions(at),
            self.air_quality.current_aqi(at),
        )
        .map_err(ServiceError::upstream("Failed to fetch weather data"))?;

        debug!(%location, code = current.weather_code, ?aqi, "fetched conditions");

        Ok(WeatherReport {
            location,
            temperature: current.temperature_c.round(),
            humidity: current.humidity_pct,
            wind_speed: current.wind_speed_kmh.round(),
            feels_like: current.feels_like_c.round(),
            aqi,
            weather: weather_codes::describe(current.weather_code).to_string(),
            weather_code: current.weather_code,
            observation_time: current.observation_time,
        })
    }

    /// Classify then enrich one observation.
    pub async fn suggestion_for(&self, observation: &Observation) -> Suggestion {
        let category = classify(observation);
        info!(
            temperature = observation.temperature_c,
            feels_like = observation.feels_like_c,
            exertion = %observation.exertion,
            %category,
            "classified conditions"
        );
        self.enricher.enrich(category, observation).await
    }

    pub async fn suggest(&self, request: &SuggestionRequest) -> Result<SuggestionResponse, ServiceError> {
        let (observation, exertion) = request.parse()?;

        let response = match exertion {
            ExertionRequest::Single(level) => {
                SuggestionResponse::Single(self.suggestion_for(&observation.with_exertion(level)).await)
            }
            ExertionRequest::Both => {
                let low = observation.with_exertion(Exertion::Low);
                let high = observation.with_exertion(Exertion::High);
                let (low, high) =
                    tokio::join!(self.suggestion_for(&low), self.suggestion_for(&high));
                SuggestionResponse::Both { low, high }
            }
        };

        Ok(response)
    }
}
