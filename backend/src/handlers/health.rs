//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use shared::{CategoricalField, FEATURE_COUNT};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub model: ModelStatus,
    pub encoders: EncoderStatus,
}

#[derive(Serialize)]
pub struct ModelStatus {
    pub trees: usize,
    pub features: usize,
}

/// Number of known classes per categorical field
#[derive(Serialize)]
pub struct EncoderStatus {
    pub state: usize,
    pub district: usize,
    pub season: usize,
    pub crop: usize,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let encoders = state.pipeline.encoders();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        model: ModelStatus {
            trees: state.pipeline.predictor().n_estimators(),
            features: FEATURE_COUNT,
        },
        encoders: EncoderStatus {
            state: encoders.class_count(CategoricalField::State),
            district: encoders.class_count(CategoricalField::District),
            season: encoders.class_count(CategoricalField::Season),
            crop: encoders.class_count(CategoricalField::Crop),
        },
    })
}

/// Root endpoint
pub async fn root() -> &'static str {
    "Crop Yield Prediction API v1.0"
}
