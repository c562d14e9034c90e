//! Route definitions for the Crop Yield Prediction service

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/predict", post(handlers::predict))
        .route("/options", get(handlers::list_options))
}
