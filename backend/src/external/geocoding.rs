//! Nominatim / OpenStreetMap geocoder client.
//!
//! Resolves Indian postal codes (PIN) to coordinates. The public instance
//! allows at most one request per second and requires an identifying
//! User-Agent, which the shared HTTP client sets.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use async_trait::async_trait;
use reqwest::Client;
use shared::Coordinates;

use super::ExternalError;

const SERVICE: &str = "Nominatim";

/// Source of coordinates for a postal code
#[async_trait]
pub trait GeocodingSource: Send + Sync {
    /// Returns `Ok(None)` when the postal code is unknown to the source
    async fn locate_postal_code(&self, postal_code: &str)
        -> Result<Option<Coordinates>, ExternalError>;
}

/// Nominatim search client
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
    country: String,
}

impl NominatimClient {
    pub fn new(client: Client, base_url: String, country: String) -> Self {
        Self {
            client,
            base_url,
            country,
        }
    }
}

#[async_trait]
impl GeocodingSource for NominatimClient {
    async fn locate_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<Option<Coordinates>, ExternalError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("postalcode", postal_code),
                ("country", self.country.as_str()),
                ("format", "json"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExternalError::Status {
                service: SERVICE,
                status,
                body,
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<Coordinates>, ExternalError> {
    let results = body.as_array().ok_or_else(|| ExternalError::Parse {
        service: SERVICE,
        message: "response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let coordinate = |key: &str| {
        first[key]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| ExternalError::Parse {
                service: SERVICE,
                message: format!("missing {} in response", key),
            })
    };

    Ok(Some(Coordinates::new(coordinate("lat")?, coordinate("lon")?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "30.9010",
            "lon": "75.8573",
            "display_name": "Ludhiana, Punjab, 141001, India"
        }]);
        let coords = parse_response(&body).unwrap().unwrap();
        assert!((coords.latitude - 30.9010).abs() < 1e-4);
        assert!((coords.longitude - 75.8573).abs() < 1e-4);
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array_body() {
        let body = serde_json::json!({"error": "Unable to geocode"});
        assert!(matches!(
            parse_response(&body),
            Err(ExternalError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_missing_longitude() {
        let body = serde_json::json!([{ "lat": "30.9" }]);
        assert!(parse_response(&body).is_err());
    }
}
