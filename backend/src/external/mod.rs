//! External API integrations

pub mod artifacts;
pub mod geocoding;
pub mod soil;
pub mod weather;

use thiserror::Error;

pub use artifacts::ArtifactStore;
pub use geocoding::{GeocodingSource, NominatimClient};
pub use soil::{SoilSource, StaticSoilSource};
pub use weather::{OpenWeatherClient, WeatherSource};

/// Failure of an outbound call
#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {service} response: {message}")]
    Parse {
        service: &'static str,
        message: String,
    },

    #[error("{service} timed out")]
    Timeout { service: &'static str },

    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },
}

impl ExternalError {
    /// Whether retrying the same call could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ExternalError::Http(_) | ExternalError::Timeout { .. } => true,
            ExternalError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            ExternalError::Parse { .. } | ExternalError::NotConfigured { .. } => false,
        }
    }
}

/// Shared HTTP client with a request-level timeout
pub fn http_client(timeout: std::time::Duration, user_agent: &str) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}
