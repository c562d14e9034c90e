//! Feature vector layout
//!
//! The order of [`FEATURE_NAMES`] is the column order the regression model
//! was fitted on. Reordering it silently invalidates every prediction, so the
//! model artifact declares its own feature names and is rejected at load time
//! when they differ.

use serde::Serialize;

use super::encoder::EncodedCategoricals;
use super::environment::EnvironmentSnapshot;

/// Number of model inputs
pub const FEATURE_COUNT: usize = 11;

/// Column names, in model input order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "State_encoded",
    "District_encoded",
    "Season_encoded",
    "Crop_encoded",
    "Area",
    "Temperature",
    "Rainfall",
    "Soil_N",
    "Soil_P",
    "Soil_K",
    "Soil_pH",
];

/// Fixed-order numeric model input
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Assemble the model input from encoded labels, area and environment
    pub fn build(codes: EncodedCategoricals, area: f64, env: &EnvironmentSnapshot) -> Self {
        Self([
            f64::from(codes.state),
            f64::from(codes.district),
            f64::from(codes.season),
            f64::from(codes.crop),
            area,
            env.weather.temperature,
            env.weather.rainfall,
            env.soil.nitrogen,
            env.soil.phosphorus,
            env.soil.potassium,
            env.soil.ph,
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_array(self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    /// Value of a named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }
}

/// Check a model's declared feature names against [`FEATURE_NAMES`].
///
/// Returns the first index at which they differ.
pub fn check_feature_order<S: AsRef<str>>(names: &[S]) -> Result<(), FeatureOrderMismatch> {
    if names.len() != FEATURE_COUNT {
        return Err(FeatureOrderMismatch::Length {
            expected: FEATURE_COUNT,
            actual: names.len(),
        });
    }
    for (index, (actual, expected)) in names.iter().zip(FEATURE_NAMES.iter()).enumerate() {
        if actual.as_ref() != *expected {
            return Err(FeatureOrderMismatch::Name {
                index,
                expected,
                actual: actual.as_ref().to_string(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureOrderMismatch {
    #[error("model declares {actual} features, expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("feature {index} is '{actual}', expected '{expected}'")]
    Name {
        index: usize,
        expected: &'static str,
        actual: String,
    },
}
