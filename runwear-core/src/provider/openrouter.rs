use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::{
    category::Category,
    config::TextGenerationConfig,
    enrich::Describer,
    model::Observation,
};

use super::fetch_json;

const SYSTEM_PROMPT: &str =
    "You are a helpful running clothing advisor. Always respond with valid JSON.";
const MAX_TOKENS: u32 = 300;

/// Chat-completions client for OpenRouter or any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenRouterDescriber {
    api_key: String,
    api_url: String,
    model: String,
    http: Client,
}

impl fmt::Debug for OpenRouterDescriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterDescriber")
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// The JSON object the model is asked to produce.
#[derive(Debug, Default, PartialEq, Deserialize)]
pub struct GeneratedSuggestion {
    pub description: Option<String>,
    pub category: Option<String>,
}

impl OpenRouterDescriber {
    pub fn new(config: &TextGenerationConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url().to_string(),
            model: config.model().to_string(),
            http: Client::new(),
        }
    }

    pub async fn generate(
        &self,
        category: Category,
        observation: &Observation,
    ) -> Result<GeneratedSuggestion> {
        let prompt = build_prompt(category, observation);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            response_format: ResponseFormat { format_type: "json_object" },
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.model, %category, "requesting generated description");

        let request = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let parsed: ChatResponse = fetch_json(request, "text generation").await?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Text generation response contained no content"))?;

        serde_json::from_str(&content).context("Generated content is not a JSON object")
    }
}

#[async_trait]
impl Describer for OpenRouterDescriber {
    async fn describe(&self, category: Category, observation: &Observation) -> Option<String> {
        let generated = match self.generate(category, observation).await {
            Ok(g) => g,
            Err(err) => {
                warn!("text generation failed: {err:#}");
                return None;
            }
        };

        if let Some(suggested) = generated.category.as_deref().filter(|c| *c != category.as_str()) {
            debug!(%category, suggested, "generated category ignored");
        }

        generated.description.filter(|d| !d.trim().is_empty())
    }
}

pub(crate) fn build_prompt(category: Category, obs: &Observation) -> String {
    let gym_note = if category == Category::Gym {
        "Note: Outdoor conditions are unsafe. Recommend running indoors."
    } else {
        ""
    };

    format!(
        r#"You are a running clothing expert. Based on weather, provide ONE concise sentence recommendation for a {zone} run.

Weather: {temp}°C (feels {feels}°C), {humidity}% humidity, {wind}km/h wind, AQI {aqi}, weather code {code}
Category: {category}

{gym_note}

Write ONE sentence (max 30 words) with key clothing items wrapped in <span class="highlight">item</span> tags.

Example: Wear <span class="highlight">thermal base layer</span> and <span class="highlight">windbreaker</span> for cold conditions.

Respond with JSON:
{{
  "description": "...",
  "category": "{category}"
}}"#,
        zone = obs.exertion.zone_label(),
        temp = obs.temperature_c,
        feels = obs.feels_like_c,
        humidity = obs.humidity_pct,
        wind = obs.wind_speed_kmh,
        aqi = obs.aqi,
        code = obs.weather_code,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Exertion;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn observation(exertion: Exertion) -> Observation {
        Observation {
            temperature_c: 2.0,
            feels_like_c: -1.0,
            humidity_pct: 65.0,
            wind_speed_kmh: 18.0,
            aqi: 35.0,
            weather_code: 2,
            exertion,
        }
    }

    fn describer(server: &MockServer) -> OpenRouterDescriber {
        OpenRouterDescriber::new(&TextGenerationConfig {
            api_key: "test_key".into(),
            api_url: Some(format!("{}/api/v1/chat/completions", server.uri())),
            model: Some("test/model".into()),
        })
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "gen-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn returns_generated_description() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_key"))
            .and(body_partial_json(serde_json::json!({
                "model": "test/model",
                "response_format": { "type": "json_object" },
                "max_tokens": 300
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"description": "Wear a <span class=\"highlight\">thermal top</span>.", "category": "winter_cold"}"#,
            )))
            .mount(&server)
            .await;

        let text = describer(&server)
            .describe(Category::WinterCold, &observation(Exertion::Low))
            .await;
        assert_eq!(text.as_deref(), Some(r#"Wear a <span class="highlight">thermal top</span>."#));
    }

    #[tokio::test]
    async fn error_status_yields_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let text = describer(&server).describe(Category::Gym, &observation(Exertion::Low)).await;
        assert!(text.is_none());
    }

    #[tokio::test]
    async fn non_json_content_yields_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion("Wear shorts, it is lovely out.")),
            )
            .mount(&server)
            .await;

        let text = describer(&server)
            .describe(Category::SummerWarm, &observation(Exertion::High))
            .await;
        assert!(text.is_none());
    }

    #[tokio::test]
    async fn missing_description_field_yields_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion(r#"{"category": "gym"}"#)),
            )
            .mount(&server)
            .await;

        let text = describer(&server).describe(Category::Gym, &observation(Exertion::Low)).await;
        assert!(text.is_none());
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = describer(&server)
            .generate(Category::Gym, &observation(Exertion::Low))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no content"));
    }

    #[test]
    fn prompt_mentions_zone_and_gym_note() {
        let prompt = build_prompt(Category::Gym, &observation(Exertion::High));
        assert!(prompt.contains("high intensity (Zone 4-5)"));
        assert!(prompt.contains("Outdoor conditions are unsafe"));
        assert!(prompt.contains("AQI 35"));

        let prompt = build_prompt(Category::WinterCold, &observation(Exertion::Low));
        assert!(prompt.contains("low-medium intensity (Zone 1-3)"));
        assert!(!prompt.contains("Outdoor conditions are unsafe"));
        assert!(prompt.contains("Category: winter_cold"));
    }
}
