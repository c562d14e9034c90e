//! Configuration management for the Crop Yield Prediction service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with CYP_ prefix

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{Coordinates, Language};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Trained artifact locations
    pub model: ModelConfig,

    /// Geocoding API configuration
    pub geocoding: GeocodingConfig,

    /// Weather API configuration
    pub weather: WeatherConfig,

    /// Recommendation message configuration
    pub advisory: AdvisoryConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Directory holding the model and encoder artifacts
    pub dir: PathBuf,

    /// Model artifact file name
    pub model_file: String,

    /// Encoder artifact file name
    pub encoders_file: String,

    /// Base URL to download artifacts from when they are missing locally
    pub remote_base_url: Option<String>,

    /// Expected SHA-256 (hex) of the model artifact
    pub model_sha256: Option<String>,

    /// Expected SHA-256 (hex) of the encoder artifact
    pub encoders_sha256: Option<String>,

    /// Timeout for artifact downloads in seconds
    pub download_timeout_secs: u64,
}

impl ModelConfig {
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn encoders_path(&self) -> PathBuf {
        self.dir.join(&self.encoders_file)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    /// Nominatim search endpoint
    pub base_url: String,

    /// Country the postal code search is restricted to
    pub country: String,

    /// User-Agent sent to Nominatim (required by its usage policy)
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Optional CSV file extending the district to postal code table
    pub district_table_path: Option<PathBuf>,

    /// Coordinates used when a location cannot be resolved
    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
}

impl GeocodingConfig {
    pub fn fallback(&self) -> Coordinates {
        Coordinates::new(self.fallback_latitude, self.fallback_longitude)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key; empty disables live weather
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Extra attempts after a failed weather call
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdvisoryConfig {
    /// Languages each recommendation is emitted in, in order
    pub languages: Vec<Language>,

    /// Optional JSON file overriding built-in messages
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Format named by `CYP_LOGGING__FORMAT`, for logging before the config loads
    pub fn from_env() -> Self {
        Self::parse(std::env::var("CYP_LOGGING__FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CYP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::defaults(config::Config::builder(), &environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CYP_ prefix)
            .add_source(
                Environment::with_prefix("CYP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("advisory.languages")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let delhi = Coordinates::delhi();
        builder
            .set_default("environment", environment)?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("model.dir", "artifacts")?
            .set_default("model.model_file", "model.json")?
            .set_default("model.encoders_file", "encoders.json")?
            .set_default("model.download_timeout_secs", 120)?
            .set_default("geocoding.base_url", "https://nominatim.openstreetmap.org/search")?
            .set_default("geocoding.country", "India")?
            .set_default("geocoding.user_agent", "crop-yield-prediction/0.1")?
            .set_default("geocoding.timeout_secs", 5)?
            .set_default("geocoding.fallback_latitude", delhi.latitude)?
            .set_default("geocoding.fallback_longitude", delhi.longitude)?
            .set_default("weather.api_endpoint", "https://api.openweathermap.org/data/2.5")?
            .set_default("weather.api_key", "")?
            .set_default("weather.timeout_secs", 5)?
            .set_default("weather.max_retries", 1)?
            .set_default("advisory.languages", vec!["hi", "en"])?
            .set_default("logging.format", "pretty")
    }

    /// Configuration built from defaults only, for tests
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::defaults(config::Config::builder(), "test")
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("default configuration must deserialize")
    }
}
