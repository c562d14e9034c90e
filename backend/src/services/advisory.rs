//! Advisory engine: localized recommendations from yield and soil pH

use std::path::Path;

use shared::{evaluate_rules, Language, MessageCatalog};

use crate::error::{AppError, AppResult};

/// Rule-based advisory engine
#[derive(Debug, Clone)]
pub struct AdvisoryEngine {
    catalog: MessageCatalog,
    languages: Vec<Language>,
}

impl AdvisoryEngine {
    pub fn new(catalog: MessageCatalog, languages: Vec<Language>) -> Self {
        let languages = if languages.is_empty() {
            vec![Language::Hindi, Language::English]
        } else {
            languages
        };
        Self { catalog, languages }
    }

    /// Load a catalog file and layer it over the built-in messages
    pub fn load_catalog(path: &Path) -> AppResult<MessageCatalog> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("cannot read catalog {}: {}", path.display(), e))
        })?;
        let overrides: MessageCatalog = serde_json::from_str(&raw).map_err(|e| {
            AppError::Configuration(format!("invalid catalog {}: {}", path.display(), e))
        })?;
        Ok(MessageCatalog::default().merge(overrides))
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Recommendations for a predicted yield and the soil pH.
    ///
    /// Empty when neither signal falls outside its normal band.
    pub fn recommend(&self, yield_per_hectare: f64, soil_ph: f64) -> Vec<String> {
        let rules = evaluate_rules(yield_per_hectare, soil_ph);
        self.catalog.render(&rules, &self.languages)
    }
}

impl Default for AdvisoryEngine {
    fn default() -> Self {
        Self::new(MessageCatalog::default(), Vec::new())
    }
}
