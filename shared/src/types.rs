//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// GPS coordinates (WGS84)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// New Delhi, used when a location cannot be resolved
    pub const fn delhi() -> Self {
        Self {
            latitude: 28.7041,
            longitude: 77.1025,
        }
    }
}

/// Supported advisory languages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Hindi => "hi",
            Language::English => "en",
        }
    }
}

/// Unit the regression model was trained on
pub const PRODUCTION_UNIT: &str = "tonnes";
