//! Prediction HTTP handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use shared::{CategoricalField, PredictionRequest, PRODUCTION_UNIT};

use crate::error::AppResult;
use crate::services::PredictionOutcome;
use crate::AppState;

/// Successful prediction body
#[derive(Serialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub unit: &'static str,
    #[serde(flatten)]
    pub outcome: PredictionOutcome,
}

/// Labels accepted for each categorical field
#[derive(Serialize)]
pub struct OptionsResponse {
    pub success: bool,
    pub states: Vec<String>,
    pub districts: Vec<String>,
    pub seasons: Vec<String>,
    pub crops: Vec<String>,
}

/// Predict crop production for a field
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> AppResult<Json<PredictionResponse>> {
    let Json(request) = payload?;

    let outcome = state.pipeline.predict(&request).await?;

    Ok(Json(PredictionResponse {
        success: true,
        unit: PRODUCTION_UNIT,
        outcome,
    }))
}

/// List the labels the model was trained on
pub async fn list_options(State(state): State<AppState>) -> Json<OptionsResponse> {
    let encoders = state.pipeline.encoders();
    let labels = |field| encoders.classes(field).to_vec();

    Json(OptionsResponse {
        success: true,
        states: labels(CategoricalField::State),
        districts: labels(CategoricalField::District),
        seasons: labels(CategoricalField::Season),
        crops: labels(CategoricalField::Crop),
    })
}
