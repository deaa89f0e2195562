//! Reverse geocoding with a fallback chain that always produces a name.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::{model::Coordinates, provider::ReverseGeocoder};

#[derive(Debug, Clone, Default)]
pub struct ReverseChain {
    geocoders: Vec<Arc<dyn ReverseGeocoder>>,
}

impl ReverseChain {
    pub fn new(geocoders: Vec<Arc<dyn ReverseGeocoder>>) -> Self {
        Self { geocoders }
    }

    /// First non-empty name from the chain, else the formatted coordinates.
    pub async fn resolve(&self, at: Coordinates) -> String {
        for geocoder in &self.geocoders {
            match geocoder.place_name(at).await {
                Ok(Some(name)) => {
                    debug!(provider = geocoder.name(), %name, "reverse geocoded");
                    return name;
                }
                Ok(None) => debug!(provider = geocoder.name(), "no reverse geocoding result"),
                Err(err) => warn!(provider = geocoder.name(), "reverse geocoding failed: {err:#}"),
            }
        }

        at.display()
    }
}
