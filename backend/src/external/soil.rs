//! Soil data sources
//!
//! Only a static national-average table exists today. The trait is async so
//! a networked source (e.g. SoilGrids) can replace it without touching the
//! environment provider.

use async_trait::async_trait;
use shared::SoilProfile;

use super::ExternalError;

/// Source of soil nutrient metrics for a district
#[async_trait]
pub trait SoilSource: Send + Sync {
    async fn soil_profile(&self, district: &str, state: &str) -> Result<SoilProfile, ExternalError>;
}

/// Returns the same profile for every location
#[derive(Debug, Clone, Default)]
pub struct StaticSoilSource {
    profile: SoilProfile,
}

#[async_trait]
impl SoilSource for StaticSoilSource {
    async fn soil_profile(&self, _district: &str, _state: &str) -> Result<SoilProfile, ExternalError> {
        Ok(self.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_ignores_location() {
        let source = StaticSoilSource::default();
        let ludhiana = source.soil_profile("Ludhiana", "Punjab").await.unwrap();
        let loni = source.soil_profile("Loni", "Uttar Pradesh").await.unwrap();
        assert_eq!(ludhiana, loni);
        assert_eq!(ludhiana, SoilProfile::average());
    }
}
