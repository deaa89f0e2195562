use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

use crate::model::{CityMatch, Coordinates, CurrentConditions};

pub mod nominatim;
pub mod openmeteo;
pub mod openrouter;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_conditions(&self, at: Coordinates) -> Result<CurrentConditions>;
}

#[async_trait]
pub trait AirQualityProvider: Send + Sync + Debug {
    /// Current US AQI, `None` where the provider has no coverage.
    async fn current_aqi(&self, at: Coordinates) -> Result<Option<i64>>;
}

#[async_trait]
pub trait CitySearch: Send + Sync + Debug {
    /// Up to `limit` matches, best first. No match is an empty list, not an error.
    async fn search(&self, name: &str, limit: usize) -> Result<Vec<CityMatch>>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Display name for the coordinates, `None` if the provider knows nothing there.
    async fn place_name(&self, at: Coordinates) -> Result<Option<String>>;
}

/// Send a request and decode a JSON body, turning non-success statuses into errors.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    what: &str,
) -> Result<T> {
    let res = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {what}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{what} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
}

/// Join non-empty parts with ", ".
pub(crate) fn join_place<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
