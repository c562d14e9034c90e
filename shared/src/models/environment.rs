//! Environmental context models (weather and soil)

use serde::{Deserialize, Serialize};

/// Where a weather reading came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    #[default]
    Fallback,
}

/// Current weather conditions at a location
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeatherReading {
    /// Air temperature in °C
    pub temperature: f64,
    /// Relative humidity in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Rain volume over the last hour in mm
    pub rainfall: f64,
    #[serde(default)]
    pub source: DataSource,
}

impl WeatherReading {
    pub const FALLBACK_TEMPERATURE: f64 = 25.0;
    pub const FALLBACK_HUMIDITY: f64 = 60.0;
    pub const FALLBACK_RAINFALL: f64 = 0.0;

    /// Substitute used whenever the weather source cannot be reached
    pub fn fallback() -> Self {
        Self {
            temperature: Self::FALLBACK_TEMPERATURE,
            humidity: Some(Self::FALLBACK_HUMIDITY),
            rainfall: Self::FALLBACK_RAINFALL,
            source: DataSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }
}

impl Default for WeatherReading {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Soil nutrient metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SoilProfile {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    /// Soil pH on the 0-14 scale
    pub ph: f64,
}

impl SoilProfile {
    /// National average used until a location-aware soil source exists
    pub fn average() -> Self {
        Self {
            nitrogen: 50.0,
            phosphorus: 30.0,
            potassium: 40.0,
            ph: 6.5,
        }
    }
}

impl Default for SoilProfile {
    fn default() -> Self {
        Self::average()
    }
}

/// Weather and soil context for one prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct EnvironmentSnapshot {
    pub weather: WeatherReading,
    pub soil: SoilProfile,
}

impl EnvironmentSnapshot {
    pub fn new(weather: WeatherReading, soil: SoilProfile) -> Self {
        Self { weather, soil }
    }

    /// Snapshot made entirely of fallback values
    pub fn fallback() -> Self {
        Self::default()
    }
}
