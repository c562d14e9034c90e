//! Prediction pipeline: request in, estimate and recommendations out

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    yield_per_hectare, EncoderTable, EnvironmentSnapshot, FeatureVector, PredictionRequest,
    PredictionResult, SoilProfile, WeatherReading,
};
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

use super::advisory::AdvisoryEngine;
use super::environment::EnvironmentProvider;
use super::geo::{GeoResolver, ResolvedLocation};
use super::predictor::YieldPredictor;
use crate::error::AppResult;

/// Everything produced for one prediction request
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub prediction_id: Uuid,
    #[serde(flatten)]
    pub result: PredictionResult,
    pub weather_data: WeatherReading,
    pub soil_data: SoilProfile,
    pub location: ResolvedLocation,
    pub generated_at: DateTime<Utc>,
}

/// Inference pipeline shared by all requests
#[derive(Clone)]
pub struct PredictionPipeline {
    encoders: Arc<EncoderTable>,
    geo: GeoResolver,
    environment: EnvironmentProvider,
    predictor: YieldPredictor,
    advisory: AdvisoryEngine,
}

impl PredictionPipeline {
    pub fn new(
        encoders: Arc<EncoderTable>,
        geo: GeoResolver,
        environment: EnvironmentProvider,
        predictor: YieldPredictor,
        advisory: AdvisoryEngine,
    ) -> Self {
        Self {
            encoders,
            geo,
            environment,
            predictor,
            advisory,
        }
    }

    pub fn encoders(&self) -> &EncoderTable {
        &self.encoders
    }

    pub fn predictor(&self) -> &YieldPredictor {
        &self.predictor
    }

    /// Run a single prediction.
    ///
    /// Labels are encoded before any outbound call, so an unknown label costs
    /// no geocoding or weather traffic.
    pub async fn predict(&self, request: &PredictionRequest) -> AppResult<PredictionOutcome> {
        let prediction_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "prediction",
            %prediction_id,
            crop = %request.crop,
            district = %request.district
        );

        async move {
            request.validate()?;

            let codes = self.encoders.encode_all(
                request.state.trim(),
                request.district.trim(),
                request.season.trim(),
                request.crop.trim(),
            )?;

            let location = self
                .geo
                .resolve(&request.district, &request.state, request.postal_code.as_deref())
                .await;

            let env = self
                .environment
                .snapshot(location.coordinates, &request.district, &request.state)
                .await;

            let (predicted_production, yield_per_hectare) =
                self.estimate(codes, request.area, &env)?;
            let recommendations = self.advisory.recommend(yield_per_hectare, env.soil.ph);

            tracing::info!(
                predicted_production,
                yield_per_hectare,
                fallback_location = location.is_fallback(),
                fallback_weather = env.weather.is_fallback(),
                "Prediction complete"
            );

            Ok(PredictionOutcome {
                prediction_id,
                result: PredictionResult {
                    predicted_production,
                    yield_per_hectare,
                    recommendations,
                },
                weather_data: env.weather,
                soil_data: env.soil,
                location,
                generated_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }

    fn estimate(
        &self,
        codes: shared::EncodedCategoricals,
        area: f64,
        env: &EnvironmentSnapshot,
    ) -> AppResult<(f64, f64)> {
        let features = FeatureVector::build(codes, area, env);
        tracing::debug!(features = ?features.as_slice(), "Feature vector built");

        let production = self.predictor.predict(&features)?;
        Ok((production, yield_per_hectare(production, area)))
    }
}
