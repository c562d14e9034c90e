//! HTTP handlers for the Crop Yield Prediction service

pub mod health;
pub mod prediction;

pub use health::*;
pub use prediction::*;
