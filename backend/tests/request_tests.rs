//! Prediction request validation tests
//!
//! Covers JSON decoding and field validation for `POST /predict` bodies:
//! - Area must be a positive finite number (numeric strings accepted)
//! - Categorical labels must be non-empty
//! - Optional postal code must be a valid Indian PIN

use proptest::prelude::*;
use serde_json::json;
use shared::validation::{is_in_india, validate_postal_code};
use shared::{Coordinates, PredictionRequest};
use validator::Validate;

fn body(area: serde_json::Value) -> serde_json::Value {
    json!({
        "state": "Punjab",
        "district": "Ludhiana",
        "season": "Kharif",
        "crop": "Wheat",
        "area": area
    })
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Valid Indian PIN codes
fn postal_code_strategy() -> impl Strategy<Value = String> {
    "[1-9][0-9]{5}"
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_decodes_numeric_area() {
    let req: PredictionRequest = serde_json::from_value(body(json!(2.0))).unwrap();
    assert_eq!(req, PredictionRequest::new("Punjab", "Ludhiana", "Kharif", "Wheat", 2.0));
    assert!(req.validate().is_ok());
}

#[test]
fn test_decodes_integer_and_string_area() {
    let int: PredictionRequest = serde_json::from_value(body(json!(3))).unwrap();
    assert_eq!(int.area, 3.0);
    let text: PredictionRequest = serde_json::from_value(body(json!(" 1.25 "))).unwrap();
    assert_eq!(text.area, 1.25);
}

#[test]
fn test_non_numeric_area_fails_to_decode() {
    let result: Result<PredictionRequest, _> = serde_json::from_value(body(json!("two")));
    assert!(result.is_err());
}

#[test]
fn test_missing_field_fails_to_decode() {
    let result: Result<PredictionRequest, _> =
        serde_json::from_value(json!({"state": "Punjab", "area": 1.0}));
    assert!(result.is_err());
}

#[test]
fn test_zero_and_negative_area_invalid() {
    for area in [0.0, -1.0] {
        let req = PredictionRequest::new("Punjab", "Ludhiana", "Kharif", "Wheat", area);
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("area"));
    }
}

#[test]
fn test_blank_label_invalid() {
    let req = PredictionRequest::new("Punjab", "  ", "Kharif", "Wheat", 1.0);
    let errors = req.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("district"));
}

#[test]
fn test_postal_code_is_optional() {
    let req: PredictionRequest = serde_json::from_value(body(json!(1.0))).unwrap();
    assert!(req.postal_code.is_none());

    let with_pin = req.clone().with_postal_code("141001");
    assert!(with_pin.validate().is_ok());

    let bad_pin = req.with_postal_code("04100");
    assert!(bad_pin.validate().is_err());
}

#[test]
fn test_known_districts_are_in_india() {
    assert!(is_in_india(&Coordinates::delhi()));
    assert!(is_in_india(&Coordinates::new(30.9010, 75.8573)));
    assert!(!is_in_india(&Coordinates::new(51.5074, -0.1278)));
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any positive area passes validation
    #[test]
    fn test_positive_area_valid(area in 0.001f64..1_000_000.0) {
        let req = PredictionRequest::new("Punjab", "Ludhiana", "Kharif", "Wheat", area);
        prop_assert!(req.validate().is_ok());
    }

    /// Any non-positive area fails validation
    #[test]
    fn test_non_positive_area_invalid(area in -1_000_000.0f64..=0.0) {
        let req = PredictionRequest::new("Punjab", "Ludhiana", "Kharif", "Wheat", area);
        prop_assert!(req.validate().is_err());
    }

    /// Well-formed PIN codes are accepted
    #[test]
    fn test_valid_postal_codes(code in postal_code_strategy()) {
        prop_assert!(validate_postal_code(&code).is_ok());
    }

    /// PIN codes of the wrong length are rejected
    #[test]
    fn test_wrong_length_postal_codes(code in "[1-9][0-9]{0,4}|[1-9][0-9]{6,9}") {
        prop_assert!(validate_postal_code(&code).is_err());
    }
}
