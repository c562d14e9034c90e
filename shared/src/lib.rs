//! Shared types and models for the Crop Yield Prediction service
//!
//! This crate contains the pure, I/O-free parts of the inference pipeline:
//! request/response models, the categorical encoder, the feature vector
//! layout and the advisory rules.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
