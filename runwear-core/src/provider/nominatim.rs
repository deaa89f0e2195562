use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::Coordinates;

use super::{ReverseGeocoder, fetch_json, join_place};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const DEFAULT_USER_AGENT: &str = "RunWear-App";

/// Reverse geocoding through OpenStreetMap's Nominatim.
#[derive(Debug, Clone)]
pub struct NominatimProvider {
    http: Client,
    url: String,
    user_agent: String,
}

impl NominatimProvider {
    pub fn new(user_agent: &str) -> Self {
        Self::with_base_url(NOMINATIM_URL, user_agent)
    }

    pub fn with_base_url(url: &str, user_agent: &str) -> Self {
        Self {
            http: Client::new(),
            url: url.to_string(),
            user_agent: user_agent.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[async_trait]
impl ReverseGeocoder for NominatimProvider {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn place_name(&self, at: Coordinates) -> Result<Option<String>> {
        let request = self
            .http
            .get(&self.url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("format", "json".to_string()),
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("zoom", "10".to_string()),
                ("accept-language", "en".to_string()),
            ]);

        let parsed: NominatimResponse = fetch_json(request, "Nominatim").await?;

        let Some(addr) = parsed.address else {
            return Ok(None);
        };

        let present = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        let place = present(addr.city)
            .or_else(|| present(addr.town))
            .or_else(|| present(addr.village))
            .or_else(|| present(addr.county));

        let location = join_place([
            place.as_deref(),
            addr.state.as_deref(),
            addr.country_code.as_deref(),
        ]);

        Ok((!location.is_empty()).then_some(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> NominatimProvider {
        NominatimProvider::with_base_url(&format!("{}/reverse", server.uri()), DEFAULT_USER_AGENT)
    }

    #[tokio::test]
    async fn prefers_city_then_state_then_code() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(header("User-Agent", DEFAULT_USER_AGENT))
            .and(query_param("zoom", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "display_name": "Seattle, King County, Washington, United States",
                "address": {
                    "city": "Seattle",
                    "county": "King County",
                    "state": "Washington",
                    "country": "United States",
                    "country_code": "us"
                }
            })))
            .mount(&server)
            .await;

        let name = provider(&server).place_name(Coordinates::new(47.6, -122.3)).await.unwrap();
        assert_eq!(name.as_deref(), Some("Seattle, Washington, us"));
    }

    #[tokio::test]
    async fn falls_through_to_village() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": { "village": "Hallstatt", "country_code": "at" }
            })))
            .mount(&server)
            .await;

        let name = provider(&server).place_name(Coordinates::new(47.56, 13.65)).await.unwrap();
        assert_eq!(name.as_deref(), Some("Hallstatt, at"));
    }

    #[tokio::test]
    async fn blank_city_does_not_hide_town() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": { "city": " ", "town": "Keswick", "state": "England", "country_code": "gb" }
            })))
            .mount(&server)
            .await;

        let name = provider(&server).place_name(Coordinates::new(54.6, -3.13)).await.unwrap();
        assert_eq!(name.as_deref(), Some("Keswick, England, gb"));
    }

    #[tokio::test]
    async fn no_address_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "Unable to geocode" })),
            )
            .mount(&server)
            .await;

        let name = provider(&server).place_name(Coordinates::new(0.0, -160.0)).await.unwrap();
        assert!(name.is_none());
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        assert!(provider(&server).place_name(Coordinates::new(1.0, 1.0)).await.is_err());
    }
}
