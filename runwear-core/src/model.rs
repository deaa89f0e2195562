use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::Category;

/// Running intensity chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exertion {
    /// Zones 1-3.
    Low,
    /// Zones 4-5.
    High,
}

impl Exertion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exertion::Low => "low",
            Exertion::High => "high",
        }
    }

    pub const fn all() -> &'static [Exertion] {
        &[Exertion::Low, Exertion::High]
    }

    /// Phrase used when describing the run to a text generator.
    pub fn zone_label(&self) -> &'static str {
        match self {
            Exertion::Low => "low-medium intensity (Zone 1-3)",
            Exertion::High => "high intensity (Zone 4-5)",
        }
    }
}

impl fmt::Display for Exertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Exertion {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "low" => Ok(Exertion::Low),
            "high" => Ok(Exertion::High),
            _ => Err(anyhow::anyhow!(
                "Unknown exertion level '{value}'. Supported levels: low, high."
            )),
        }
    }
}

/// Conditions a clothing category is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    /// US EPA scale.
    pub aqi: f64,
    /// WMO weather interpretation code.
    pub weather_code: i64,
    pub exertion: Exertion,
}

impl Observation {
    /// Same conditions, different effort.
    pub fn with_exertion(self, exertion: Exertion) -> Self {
        Self { exertion, ..self }
    }
}

/// What to wear for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub category: Category,
    /// May contain `<span class="highlight">` markup around item names.
    pub description: String,
    pub clothing_items: Vec<String>,
    pub illustration: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Last-resort display name when no geocoder knows the place.
    pub fn display(&self) -> String {
        format!("{:.2}°N, {:.2}°E", self.latitude, self.longitude)
    }
}

/// One city search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMatch {
    pub name: String,
    pub admin1: String,
    pub country: String,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CityMatch {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// "Name, Region, CC" with empty parts skipped.
    pub fn display_name(&self) -> String {
        let mut out = self.name.clone();
        if !self.admin1.is_empty() {
            out.push_str(", ");
            out.push_str(&self.admin1);
        }
        if !self.country_code.is_empty() {
            out.push_str(", ");
            out.push_str(&self.country_code);
        }
        out
    }
}

/// How the user identified where they are running.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coordinates),
}

/// Raw current conditions as reported by a weather provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: i64,
    pub observation_time: Option<NaiveDateTime>,
}

/// Conditions at a location, shaped for display and for the suggestion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub feels_like: f64,
    /// `None` where the provider has no air-quality coverage.
    pub aqi: Option<i64>,
    pub weather: String,
    pub weather_code: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub observation_time: Option<NaiveDateTime>,
}

impl WeatherReport {
    /// AQI for classification; a missing reading never triggers the air-quality override.
    pub fn aqi_or_clean(&self) -> f64 {
        self.aqi.unwrap_or_default() as f64
    }

    pub fn observation(&self, exertion: Exertion) -> Observation {
        Observation {
            temperature_c: self.temperature,
            feels_like_c: self.feels_like,
            humidity_pct: self.humidity,
            wind_speed_kmh: self.wind_speed,
            aqi: self.aqi_or_clean(),
            weather_code: self.weather_code,
            exertion,
        }
    }
}
