//! Prediction request and result models

use std::borrow::Cow;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::validation;

/// Input for a crop production estimate
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct PredictionRequest {
    #[validate(custom = "validate_label_field")]
    pub state: String,

    #[validate(custom = "validate_label_field")]
    pub district: String,

    #[validate(custom = "validate_label_field")]
    pub season: String,

    #[validate(custom = "validate_label_field")]
    pub crop: String,

    /// Cultivated area in hectares
    #[serde(deserialize_with = "deserialize_area")]
    #[validate(custom = "validate_area_field")]
    pub area: f64,

    /// PIN code of the farm, used instead of the district table when given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_postal_code_field")]
    pub postal_code: Option<String>,
}

impl PredictionRequest {
    pub fn new(
        state: impl Into<String>,
        district: impl Into<String>,
        season: impl Into<String>,
        crop: impl Into<String>,
        area: f64,
    ) -> Self {
        Self {
            state: state.into(),
            district: district.into(),
            season: season.into(),
            crop: crop.into(),
            area,
            postal_code: None,
        }
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }
}

fn to_validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_label_field(value: &str) -> Result<(), ValidationError> {
    validation::validate_label(value).map_err(|msg| to_validation_error("label", msg))
}

fn validate_area_field(area: f64) -> Result<(), ValidationError> {
    validation::validate_area(area).map_err(|msg| to_validation_error("area", msg))
}

fn validate_postal_code_field(code: &str) -> Result<(), ValidationError> {
    validation::validate_postal_code(code).map_err(|msg| to_validation_error("postal_code", msg))
}

/// Accepts the area as a JSON number or a numeric string
fn deserialize_area<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct AreaVisitor;

    impl<'de> Visitor<'de> for AreaVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("area '{}' is not a number", v)))
        }
    }

    deserializer.deserialize_any(AreaVisitor)
}

/// Output of the inference pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    /// Predicted total production for the requested area
    pub predicted_production: f64,
    pub yield_per_hectare: f64,
    pub recommendations: Vec<String>,
}
