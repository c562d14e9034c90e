//! Validation utilities for the Crop Yield Prediction service
//!
//! Includes India-specific checks (PIN codes, coordinate bounds).

use crate::types::Coordinates;

// ============================================================================
// Request Validations
// ============================================================================

/// Validate cultivated area: finite and strictly positive
pub fn validate_area(area: f64) -> Result<(), &'static str> {
    if !area.is_finite() {
        return Err("Area must be a finite number");
    }
    if area <= 0.0 {
        return Err("Area must be greater than zero");
    }
    Ok(())
}

/// Validate a categorical label is present
pub fn validate_label(label: &str) -> Result<(), &'static str> {
    if label.trim().is_empty() {
        return Err("Value must not be empty");
    }
    if label.len() > 100 {
        return Err("Value must be at most 100 characters");
    }
    Ok(())
}

// ============================================================================
// Environmental Validations
// ============================================================================

/// Validate soil pH is on the 0-14 scale
pub fn validate_soil_ph(ph: f64) -> Result<(), &'static str> {
    if !(0.0..=14.0).contains(&ph) {
        return Err("Soil pH must be between 0 and 14");
    }
    Ok(())
}

/// Validate relative humidity percentage
pub fn validate_humidity(humidity: f64) -> Result<(), &'static str> {
    if !(0.0..=100.0).contains(&humidity) {
        return Err("Humidity must be between 0 and 100%");
    }
    Ok(())
}

/// Validate coordinates are a legal WGS84 pair
pub fn validate_coordinates(coords: &Coordinates) -> Result<(), &'static str> {
    if !coords.latitude.is_finite() || !(-90.0..=90.0).contains(&coords.latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    if !coords.longitude.is_finite() || !(-180.0..=180.0).contains(&coords.longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

// ============================================================================
// India-Specific Validations
// ============================================================================

/// Validate an Indian postal index number (PIN): 6 digits, first digit 1-9
pub fn validate_postal_code(code: &str) -> Result<(), &'static str> {
    let code = code.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err("Postal code must be 6 digits");
    }
    if code.starts_with('0') {
        return Err("Postal code cannot start with 0");
    }
    Ok(())
}

/// Check coordinates fall inside India's approximate bounding box
pub fn is_in_india(coords: &Coordinates) -> bool {
    (6.5..=37.5).contains(&coords.latitude) && (68.0..=97.5).contains(&coords.longitude)
}
