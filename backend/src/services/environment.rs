//! Environmental context for predictions
//!
//! Combines current weather with soil metrics. Failures of either source are
//! absorbed: the snapshot is always fully populated, using the documented
//! fallback values where live data is unavailable.

use std::sync::Arc;
use std::time::Duration;

use shared::{validate_soil_ph, Coordinates, EnvironmentSnapshot, SoilProfile, WeatherReading};

use crate::external::{ExternalError, SoilSource, WeatherSource};

/// Fetches weather and soil data for a location
#[derive(Clone)]
pub struct EnvironmentProvider {
    weather: Arc<dyn WeatherSource>,
    soil: Arc<dyn SoilSource>,
    timeout: Duration,
    max_retries: u32,
}

impl EnvironmentProvider {
    pub fn new(
        weather: Arc<dyn WeatherSource>,
        soil: Arc<dyn SoilSource>,
        timeout: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            weather,
            soil,
            timeout,
            max_retries,
        }
    }

    /// Weather and soil for the location; never fails
    pub async fn snapshot(&self, coords: Coordinates, district: &str, state: &str) -> EnvironmentSnapshot {
        let (weather, soil) = tokio::join!(self.weather(coords), self.soil(district, state));
        EnvironmentSnapshot::new(weather, soil)
    }

    /// Current weather, or the fallback reading when every attempt fails
    pub async fn weather(&self, coords: Coordinates) -> WeatherReading {
        let mut attempt = 0;
        loop {
            match self.fetch_weather(coords).await {
                Ok(reading) => return reading,
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, error = %e, "Retrying weather request");
                }
                Err(e @ ExternalError::NotConfigured { .. }) => {
                    // reported once at startup
                    tracing::debug!(error = %e, "Using fallback weather");
                    return WeatherReading::fallback();
                }
                Err(e) => {
                    tracing::warn!(
                        latitude = coords.latitude,
                        longitude = coords.longitude,
                        error = %e,
                        "Weather unavailable, using fallback values"
                    );
                    return WeatherReading::fallback();
                }
            }
        }
    }

    async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherReading, ExternalError> {
        tokio::time::timeout(self.timeout, self.weather.current_weather(coords))
            .await
            .map_err(|_| ExternalError::Timeout {
                service: "weather",
            })?
    }

    /// Soil metrics for the district, or the national average on failure
    pub async fn soil(&self, district: &str, state: &str) -> SoilProfile {
        match tokio::time::timeout(self.timeout, self.soil.soil_profile(district, state)).await {
            Ok(Ok(profile)) => match validate_soil_ph(profile.ph) {
                Ok(()) => profile,
                Err(reason) => {
                    tracing::warn!(district, state, ph = profile.ph, reason, "Discarding soil data, using averages");
                    SoilProfile::average()
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(district, state, error = %e, "Soil data unavailable, using averages");
                SoilProfile::average()
            }
            Err(_) => {
                tracing::warn!(district, state, "Soil data timed out, using averages");
                SoilProfile::average()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::external::StaticSoilSource;
    use async_trait::async_trait;
    use shared::DataSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) enum WeatherBehavior {
        Reading(WeatherReading),
        NetworkError,
        NotConfigured,
        Hang,
        /// Fail transiently this many times, then answer
        FlakyThen(usize, WeatherReading),
    }

    /// Weather source with scripted behaviour and a call counter
    pub(crate) struct MockWeather {
        pub behavior: WeatherBehavior,
        pub calls: AtomicUsize,
    }

    impl MockWeather {
        pub(crate) fn new(behavior: WeatherBehavior) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub(crate) fn live_reading() -> WeatherReading {
        WeatherReading {
            temperature: 31.0,
            humidity: Some(45.0),
            rainfall: 1.2,
            source: DataSource::Live,
        }
    }

    #[async_trait]
    impl WeatherSource for MockWeather {
        async fn current_weather(&self, _coords: Coordinates) -> Result<WeatherReading, ExternalError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                WeatherBehavior::Reading(reading) => Ok(*reading),
                WeatherBehavior::NetworkError => Err(ExternalError::Status {
                    service: "mock",
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    body: "upstream down".to_string(),
                }),
                WeatherBehavior::NotConfigured => Err(ExternalError::NotConfigured { service: "mock" }),
                WeatherBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(live_reading())
                }
                WeatherBehavior::FlakyThen(failures, reading) => {
                    if call < *failures {
                        Err(ExternalError::Timeout { service: "mock" })
                    } else {
                        Ok(*reading)
                    }
                }
            }
        }
    }

    /// Soil source returning a fixed profile
    struct FixedSoil(SoilProfile);

    #[async_trait]
    impl SoilSource for FixedSoil {
        async fn soil_profile(&self, _district: &str, _state: &str) -> Result<SoilProfile, ExternalError> {
            Ok(self.0)
        }
    }

    fn provider(weather: Arc<MockWeather>, max_retries: u32) -> EnvironmentProvider {
        EnvironmentProvider::new(
            weather,
            Arc::new(StaticSoilSource::default()),
            Duration::from_millis(50),
            max_retries,
        )
    }

    #[tokio::test]
    async fn test_live_weather_is_used() {
        let weather = Arc::new(MockWeather::new(WeatherBehavior::Reading(live_reading())));
        let snapshot = provider(weather, 0)
            .snapshot(Coordinates::delhi(), "Ludhiana", "Punjab")
            .await;
        assert_eq!(snapshot.weather, live_reading());
        assert_eq!(snapshot.soil, SoilProfile::average());
    }

    #[tokio::test]
    async fn test_network_error_yields_fallback_snapshot() {
        let weather = Arc::new(MockWeather::new(WeatherBehavior::NetworkError));
        let snapshot = provider(weather.clone(), 2)
            .snapshot(Coordinates::delhi(), "Ludhiana", "Punjab")
            .await;
        assert_eq!(snapshot, EnvironmentSnapshot::fallback());
        // 502 is transient, so every retry is spent
        assert_eq!(weather.calls(), 3);
    }

    #[tokio::test]
    async fn test_timeout_yields_fallback() {
        let weather = Arc::new(MockWeather::new(WeatherBehavior::Hang));
        let reading = provider(weather.clone(), 0).weather(Coordinates::delhi()).await;
        assert_eq!(reading, WeatherReading::fallback());
        assert_eq!(weather.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let weather = Arc::new(MockWeather::new(WeatherBehavior::FlakyThen(1, live_reading())));
        let reading = provider(weather.clone(), 1).weather(Coordinates::delhi()).await;
        assert_eq!(reading, live_reading());
        assert_eq!(weather.calls(), 2);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let weather = Arc::new(MockWeather::new(WeatherBehavior::FlakyThen(5, live_reading())));
        let reading = provider(weather.clone(), 2).weather(Coordinates::delhi()).await;
        assert!(reading.is_fallback());
        assert_eq!(weather.calls(), 3);
    }

    #[tokio::test]
    async fn test_unconfigured_weather_is_not_retried() {
        let weather = Arc::new(MockWeather::new(WeatherBehavior::NotConfigured));
        let reading = provider(weather.clone(), 3).weather(Coordinates::delhi()).await;
        assert!(reading.is_fallback());
        assert_eq!(weather.calls(), 1);
    }

    #[tokio::test]
    async fn test_soil_with_invalid_ph_uses_averages() {
        let soil = SoilProfile {
            ph: 15.0,
            ..SoilProfile::average()
        };
        let provider = EnvironmentProvider::new(
            Arc::new(MockWeather::new(WeatherBehavior::Reading(live_reading()))),
            Arc::new(FixedSoil(soil)),
            Duration::from_millis(50),
            0,
        );
        assert_eq!(provider.soil("Ludhiana", "Punjab").await, SoilProfile::average());
    }

    #[tokio::test]
    async fn test_soil_within_range_is_kept() {
        let soil = SoilProfile {
            nitrogen: 80.0,
            phosphorus: 20.0,
            potassium: 35.0,
            ph: 7.8,
        };
        let provider = EnvironmentProvider::new(
            Arc::new(MockWeather::new(WeatherBehavior::Reading(live_reading()))),
            Arc::new(FixedSoil(soil)),
            Duration::from_millis(50),
            0,
        );
        assert_eq!(provider.soil("Ludhiana", "Punjab").await, soil);
    }
}
