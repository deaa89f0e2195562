//! Clothing categories and their static recommendation tables.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Suggestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    WinterCold,
    WinterMild,
    SpringFall,
    SummerWarm,
    SummerHot,
    /// Outdoor running is inadvisable; train indoors.
    Gym,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::WinterCold => "winter_cold",
            Category::WinterMild => "winter_mild",
            Category::SpringFall => "spring_fall",
            Category::SummerWarm => "summer_warm",
            Category::SummerHot => "summer_hot",
            Category::Gym => "gym",
        }
    }

    pub const fn all() -> &'static [Category] {
        &[
            Category::WinterCold,
            Category::WinterMild,
            Category::SpringFall,
            Category::SummerWarm,
            Category::SummerHot,
            Category::Gym,
        ]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::WinterCold => {
                r#"Wear <span class="highlight">thermal base layer</span>, <span class="highlight">fleece jacket</span>, and <span class="highlight">long tights</span> with gloves and hat."#
            }
            Category::WinterMild => {
                r#"Wear <span class="highlight">long-sleeve base</span> with a light jacket and tights. <span class="highlight">Light gloves</span> recommended."#
            }
            Category::SpringFall => {
                r#"Wear <span class="highlight">short-sleeve shirt</span> with a light jacket or <span class="highlight">long-sleeve top</span>. Tights or shorts work."#
            }
            Category::SummerWarm => {
                r#"Wear <span class="highlight">short-sleeve shirt</span> and shorts. Choose <span class="highlight">lightweight</span> materials."#
            }
            Category::SummerHot => {
                r#"Opt for <span class="highlight">breathable shorts</span> and light tank. Don't forget <span class="highlight">sunscreen</span>."#
            }
            Category::Gym => "Run indoors on treadmill. Wear light, comfortable clothing.",
        }
    }

    pub fn clothing_items(&self) -> &'static [&'static str] {
        match self {
            Category::WinterCold => &[
                "Thermal base layer",
                "Fleece midlayer",
                "Windproof jacket",
                "Long running tights",
                "Warm hat",
                "Gloves",
            ],
            Category::WinterMild => &[
                "Long-sleeve base layer",
                "Light jacket",
                "Running tights",
                "Light gloves",
            ],
            Category::SpringFall => &[
                "Short-sleeve or long-sleeve shirt",
                "Light jacket (optional)",
                "Running shorts or tights",
            ],
            Category::SummerWarm => &["Short-sleeve shirt", "Running shorts", "Light socks"],
            Category::SummerHot => &[
                "Breathable shorts",
                "Light running tank",
                "Sun hat",
                "Sunscreen",
            ],
            Category::Gym => &[
                "Light running t-shirt",
                "Running shorts or leggings",
                "Running shoes",
                "Water bottle",
                "Towel",
            ],
        }
    }

    /// Image shown next to the recommendation.
    pub fn illustration(&self) -> String {
        format!("/images/{}.png", self.as_str())
    }

    /// The static recommendation for this category.
    pub fn fallback_suggestion(&self) -> Suggestion {
        self.suggestion_with(self.description().to_string())
    }

    pub(crate) fn suggestion_with(&self, description: String) -> Suggestion {
        Suggestion {
            category: *self,
            description,
            clothing_items: self.clothing_items().iter().map(|s| s.to_string()).collect(),
            illustration: self.illustration(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Category {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown clothing category '{value}'."))
    }
}

/// Strip highlight markup, leaving the emphasised text in place.
pub fn plain_description(description: &str) -> String {
    description
        .replace(r#"<span class="highlight">"#, "")
        .replace("</span>", "")
}
