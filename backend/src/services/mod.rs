//! Inference services for the Crop Yield Prediction service

pub mod advisory;
pub mod environment;
pub mod geo;
pub mod prediction;
pub mod predictor;

pub use advisory::AdvisoryEngine;
pub use environment::EnvironmentProvider;
pub use geo::{DistrictTable, GeoResolver};
pub use prediction::{PredictionOutcome, PredictionPipeline};
pub use predictor::YieldPredictor;
