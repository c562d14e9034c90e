//! Weather API client for fetching current conditions
//!
//! Integrates with the OpenWeatherMap current weather API (metric units)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::{validate_humidity, Coordinates, DataSource, WeatherReading};

use super::ExternalError;

const SERVICE: &str = "OpenWeatherMap";

/// Source of current weather conditions
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_weather(&self, coords: Coordinates) -> Result<WeatherReading, ExternalError>;
}

/// Weather API client
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    main: OWMMain,
    rain: Option<OWMRain>,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OWMRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

impl OpenWeatherClient {
    pub fn with_base_url(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Convert OpenWeatherMap current response to our format
    fn convert_current_response(data: OWMCurrentResponse) -> WeatherReading {
        WeatherReading {
            temperature: data.main.temp,
            humidity: data
                .main
                .humidity
                .filter(|h| validate_humidity(*h).is_ok()),
            rainfall: data
                .rain
                .and_then(|r| r.one_hour)
                .unwrap_or(0.0)
                .max(0.0),
            source: DataSource::Live,
        }
    }

    fn parse_current(body: &str) -> Result<WeatherReading, ExternalError> {
        let data: OWMCurrentResponse =
            serde_json::from_str(body).map_err(|e| ExternalError::Parse {
                service: SERVICE,
                message: e.to_string(),
            })?;
        Ok(Self::convert_current_response(data))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    /// Fetch current weather conditions by GPS coordinates
    async fn current_weather(&self, coords: Coordinates) -> Result<WeatherReading, ExternalError> {
        if self.api_key.is_empty() {
            return Err(ExternalError::NotConfigured { service: SERVICE });
        }

        let url = format!("{}/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalError::Status {
                service: SERVICE,
                status,
                body,
            });
        }

        let body = response.text().await?;
        Self::parse_current(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_current_weather_with_rain() {
        let body = r#"{
            "coord": {"lon": 75.85, "lat": 30.9},
            "main": {"temp": 31.4, "feels_like": 35.0, "pressure": 1002, "humidity": 48},
            "rain": {"1h": 2.7},
            "name": "Ludhiana"
        }"#;
        let reading = OpenWeatherClient::parse_current(body).unwrap();
        assert_eq!(reading.temperature, 31.4);
        assert_eq!(reading.humidity, Some(48.0));
        assert_eq!(reading.rainfall, 2.7);
        assert_eq!(reading.source, DataSource::Live);
    }

    #[test]
    fn test_missing_rain_means_zero() {
        let body = r#"{"main": {"temp": 22.0, "humidity": 70}}"#;
        let reading = OpenWeatherClient::parse_current(body).unwrap();
        assert_eq!(reading.rainfall, 0.0);
    }

    #[test]
    fn test_rain_without_hourly_value_means_zero() {
        let body = r#"{"main": {"temp": 22.0}, "rain": {"3h": 4.0}}"#;
        let reading = OpenWeatherClient::parse_current(body).unwrap();
        assert_eq!(reading.rainfall, 0.0);
        assert_eq!(reading.humidity, None);
    }

    #[test]
    fn test_out_of_range_humidity_is_dropped() {
        let body = r#"{"main": {"temp": 22.0, "humidity": 140}}"#;
        let reading = OpenWeatherClient::parse_current(body).unwrap();
        assert_eq!(reading.humidity, None);
        assert_eq!(reading.temperature, 22.0);
    }

    #[test]
    fn test_error_body_is_parse_error() {
        let body = r#"{"cod": 401, "message": "Invalid API key"}"#;
        let err = OpenWeatherClient::parse_current(body).unwrap_err();
        assert!(matches!(err, ExternalError::Parse { .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_configured() {
        let client =
            OpenWeatherClient::with_base_url(Client::new(), String::new(), "http://127.0.0.1:9".to_string());
        let err = client
            .current_weather(Coordinates::delhi())
            .await
            .unwrap_err();
        assert!(matches!(err, ExternalError::NotConfigured { .. }));
    }
}
