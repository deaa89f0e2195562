//! Errors surfaced to whoever calls the advisor.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid intensity '{0}', expected low, high or both")]
    InvalidIntensity(String),

    #[error("City name is required")]
    MissingCity,

    #[error("City or coordinates are required")]
    MissingLocation,

    #[error("City not found")]
    CityNotFound,

    /// A provider failed. `message` is what the user sees; `source` is for logs.
    #[error("{message}")]
    Upstream {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ServiceError {
    pub(crate) fn upstream(message: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| {
            tracing::error!("{message}: {source:#}");
            Self::Upstream { message, source }
        }
    }

    /// HTTP-equivalent status code.
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingFields
            | Self::InvalidIntensity(_)
            | Self::MissingCity
            | Self::MissingLocation => 400,
            Self::CityNotFound => 404,
            Self::Upstream { .. } => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Static text safe to show; never includes provider details.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidIntensity(_) => "Invalid intensity".to_string(),
            other => other.to_string(),
        }
    }
}
