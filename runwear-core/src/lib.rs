//! Core library for the `runwear` CLI.
//!
//! This crate defines:
//! - The clothing classifier and its static recommendation tables
//! - Optional rewording of recommendations through a text-generation service
//! - Weather, air-quality and geocoding provider clients
//! - The advisor service that ties them together, and its error contract
//! - Configuration & credentials handling
//!
//! It is used by `runwear-cli`, but can also be reused by other binaries or services.

pub mod category;
pub mod classify;
pub mod config;
pub mod enrich;
pub mod error;
pub mod geocode;
pub mod model;
pub mod provider;
pub mod service;
pub mod weather_codes;

pub use category::{Category, plain_description};
pub use classify::classify;
pub use config::{Config, TextGenerationConfig};
pub use enrich::{Describer, Enricher};
pub use error::ServiceError;
pub use model::{CityMatch, Coordinates, Exertion, LocationQuery, Observation, Suggestion, WeatherReport};
pub use service::{Advisor, SuggestionRequest, SuggestionResponse};
