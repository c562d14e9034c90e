//! Location resolution
//!
//! Maps a district (or a postal code) to approximate coordinates. Resolution
//! never fails: anything that cannot be resolved degrades to the configured
//! fallback coordinate, since weather lookups tolerate an approximate
//! location.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::{is_in_india, validate_coordinates, validate_postal_code, Coordinates};
use thiserror::Error;

use crate::external::GeocodingSource;

/// Districts known out of the box
const BUILTIN_DISTRICTS: &[(&str, &str, &str)] = &[
    ("Loni", "Uttar Pradesh", "201102"),
    ("Ludhiana", "Punjab", "141001"),
    ("Patiala", "Punjab", "147001"),
];

#[derive(Error, Debug)]
pub enum DistrictTableError {
    #[error("failed to read district table: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: invalid postal code '{postal_code}': {reason}")]
    InvalidPostalCode {
        row: usize,
        postal_code: String,
        reason: &'static str,
    },
}

/// One row of the district table
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DistrictEntry {
    pub district: String,
    pub state: String,
    pub postal_code: String,
}

/// District to postal code lookup table
#[derive(Debug, Clone, Default)]
pub struct DistrictTable {
    entries: HashMap<String, Vec<DistrictEntry>>,
}

impl DistrictTable {
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (district, state, postal_code) in BUILTIN_DISTRICTS {
            table.insert(DistrictEntry {
                district: district.to_string(),
                state: state.to_string(),
                postal_code: postal_code.to_string(),
            });
        }
        table
    }

    /// Built-in table extended with the rows of a `district,state,postal_code` CSV
    pub fn with_csv(path: &Path) -> Result<Self, DistrictTableError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut table = Self::builtin();
        table.extend_from_reader(&mut reader)?;
        Ok(table)
    }

    fn extend_from_reader<R: std::io::Read>(
        &mut self,
        reader: &mut csv::Reader<R>,
    ) -> Result<usize, DistrictTableError> {
        let mut count = 0;
        for (index, row) in reader.deserialize::<DistrictEntry>().enumerate() {
            let mut entry = row?;
            entry.postal_code = entry.postal_code.trim().to_string();
            validate_postal_code(&entry.postal_code).map_err(|reason| {
                DistrictTableError::InvalidPostalCode {
                    row: index + 1,
                    postal_code: entry.postal_code.clone(),
                    reason,
                }
            })?;
            self.insert(entry);
            count += 1;
        }
        Ok(count)
    }

    /// Add an entry, replacing any existing one for the same district and state
    pub fn insert(&mut self, entry: DistrictEntry) {
        let bucket = self.entries.entry(normalize(&entry.district)).or_default();
        bucket.retain(|e| normalize(&e.state) != normalize(&entry.state));
        bucket.push(entry);
    }

    /// Postal code for a district, preferring the entry in the same state
    pub fn postal_code(&self, district: &str, state: &str) -> Option<&str> {
        let bucket = self.entries.get(&normalize(district))?;
        bucket
            .iter()
            .find(|e| normalize(&e.state) == normalize(state))
            .or_else(|| bucket.first())
            .map(|e| e.postal_code.as_str())
    }

    /// Number of (district, state) entries
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// How a location was resolved
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ResolutionMethod {
    PostalCode { postal_code: String },
    Fallback,
}

/// Coordinates plus how they were obtained
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedLocation {
    #[serde(flatten)]
    pub coordinates: Coordinates,
    #[serde(flatten)]
    pub method: ResolutionMethod,
}

impl ResolvedLocation {
    pub fn is_fallback(&self) -> bool {
        self.method == ResolutionMethod::Fallback
    }
}

/// Resolves districts and postal codes to coordinates
#[derive(Clone)]
pub struct GeoResolver {
    table: Arc<DistrictTable>,
    geocoder: Arc<dyn GeocodingSource>,
    fallback: Coordinates,
}

impl GeoResolver {
    pub fn new(table: DistrictTable, geocoder: Arc<dyn GeocodingSource>, fallback: Coordinates) -> Self {
        Self {
            table: Arc::new(table),
            geocoder,
            fallback,
        }
    }

    /// Resolve a request location. A supplied postal code wins over the
    /// district table.
    pub async fn resolve(
        &self,
        district: &str,
        state: &str,
        postal_code: Option<&str>,
    ) -> ResolvedLocation {
        let postal_code = postal_code
            .map(str::trim)
            .or_else(|| self.table.postal_code(district, state));

        match postal_code {
            Some(code) => self.resolve_postal(code).await,
            None => {
                tracing::debug!(district, state, "District not in postal code table, using fallback location");
                self.fallback_location()
            }
        }
    }

    /// Resolve a postal code through the geocoding source
    pub async fn resolve_postal(&self, postal_code: &str) -> ResolvedLocation {
        match self.geocoder.locate_postal_code(postal_code).await {
            Ok(Some(coordinates)) => match validate_coordinates(&coordinates) {
                Ok(()) if is_in_india(&coordinates) => ResolvedLocation {
                    coordinates,
                    method: ResolutionMethod::PostalCode {
                        postal_code: postal_code.to_string(),
                    },
                },
                Ok(()) => {
                    tracing::warn!(
                        postal_code,
                        latitude = coordinates.latitude,
                        longitude = coordinates.longitude,
                        "Geocoder returned a location outside India, using fallback location"
                    );
                    self.fallback_location()
                }
                Err(reason) => {
                    tracing::warn!(postal_code, reason, "Geocoder returned invalid coordinates, using fallback location");
                    self.fallback_location()
                }
            },
            Ok(None) => {
                tracing::warn!(postal_code, "Postal code not found, using fallback location");
                self.fallback_location()
            }
            Err(e) => {
                tracing::warn!(postal_code, error = %e, "Geocoding failed, using fallback location");
                self.fallback_location()
            }
        }
    }

    pub fn fallback_location(&self) -> ResolvedLocation {
        ResolvedLocation {
            coordinates: self.fallback,
            method: ResolutionMethod::Fallback,
        }
    }
}
