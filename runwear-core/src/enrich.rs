//! Turning a category into a [`Suggestion`], optionally reworded by a text generator.

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, warn};

use crate::{category::Category, model::Observation, model::Suggestion};

/// Something that can phrase a one-sentence clothing recommendation.
///
/// `None` means "no usable text"; the caller falls back to the static table.
#[async_trait]
pub trait Describer: Send + Sync + Debug {
    async fn describe(&self, category: Category, observation: &Observation) -> Option<String>;
}

/// Builds suggestions from the static tables, consulting a [`Describer`] when one is configured.
#[derive(Debug, Clone, Default)]
pub struct Enricher {
    describer: Option<Arc<dyn Describer>>,
}

impl Enricher {
    pub fn new(describer: Option<Arc<dyn Describer>>) -> Self {
        Self { describer }
    }

    /// Static descriptions only.
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Items always come from the static table; only the description may be generated.
    pub async fn enrich(&self, category: Category, observation: &Observation) -> Suggestion {
        let Some(describer) = &self.describer else {
            return category.fallback_suggestion();
        };

        match describer.describe(category, observation).await {
            Some(text) if !text.trim().is_empty() => {
                debug!(%category, "using generated description");
                category.suggestion_with(text.trim().to_string())
            }
            _ => {
                warn!(%category, "text generation unavailable, using defaults");
                category.fallback_suggestion()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Exertion;

    #[derive(Debug)]
    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl Describer for Fixed {
        async fn describe(&self, _: Category, _: &Observation) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn observation() -> Observation {
        Observation {
            temperature_c: 3.0,
            feels_like_c: 1.0,
            humidity_pct: 80.0,
            wind_speed_kmh: 12.0,
            aqi: 20.0,
            weather_code: 3,
            exertion: Exertion::Low,
        }
    }

    #[tokio::test]
    async fn without_describer_returns_static_entry() {
        let suggestion = Enricher::fallback().enrich(Category::WinterCold, &observation()).await;
        assert_eq!(suggestion, Category::WinterCold.fallback_suggestion());
    }

    #[tokio::test]
    async fn generated_description_keeps_static_items() {
        let enricher = Enricher::new(Some(Arc::new(Fixed(Some(
            r#"Layer up with a <span class="highlight">thermal top</span>."#,
        )))));

        let suggestion = enricher.enrich(Category::WinterCold, &observation()).await;
        assert_eq!(suggestion.description, r#"Layer up with a <span class="highlight">thermal top</span>."#);
        assert_eq!(
            suggestion.clothing_items,
            Category::WinterCold.fallback_suggestion().clothing_items
        );
        assert_eq!(suggestion.category, Category::WinterCold);
    }

    #[tokio::test]
    async fn absent_description_falls_back() {
        let enricher = Enricher::new(Some(Arc::new(Fixed(None))));
        let suggestion = enricher.enrich(Category::Gym, &observation()).await;
        assert_eq!(suggestion, Category::Gym.fallback_suggestion());
    }

    #[tokio::test]
    async fn blank_description_falls_back() {
        let enricher = Enricher::new(Some(Arc::new(Fixed(Some("   ")))));
        let suggestion = enricher.enrich(Category::SpringFall, &observation()).await;
        assert_eq!(suggestion, Category::SpringFall.fallback_suggestion());
    }
}
