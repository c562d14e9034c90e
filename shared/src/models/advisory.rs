//! Advisory rules and message catalog
//!
//! Recommendations are derived from two signals: the predicted yield per
//! hectare and the soil pH. Each rule that fires contributes its catalog
//! messages, in rule order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Language;

/// Yield per hectare below this is considered low (tonnes/ha)
pub const LOW_YIELD_THRESHOLD: f64 = 2.0;
/// Yield per hectare above this is considered high (tonnes/ha)
pub const HIGH_YIELD_THRESHOLD: f64 = 5.0;
/// Soil pH below this is acidic
pub const ACIDIC_PH_THRESHOLD: f64 = 6.0;
/// Soil pH above this is alkaline
pub const ALKALINE_PH_THRESHOLD: f64 = 8.0;

/// Identifier of an advisory rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryRule {
    LowYield,
    HighYield,
    AcidicSoil,
    AlkalineSoil,
}

impl AdvisoryRule {
    pub const ALL: [AdvisoryRule; 4] = [
        AdvisoryRule::LowYield,
        AdvisoryRule::HighYield,
        AdvisoryRule::AcidicSoil,
        AdvisoryRule::AlkalineSoil,
    ];
}

/// Production per unit area; zero when the area is not positive
pub fn yield_per_hectare(predicted_production: f64, area: f64) -> f64 {
    if area > 0.0 {
        predicted_production / area
    } else {
        0.0
    }
}

/// Rules that fire for the given yield and soil pH, in output order
pub fn evaluate_rules(yield_per_hectare: f64, soil_ph: f64) -> Vec<AdvisoryRule> {
    let mut rules = Vec::new();

    if yield_per_hectare < LOW_YIELD_THRESHOLD {
        rules.push(AdvisoryRule::LowYield);
    } else if yield_per_hectare > HIGH_YIELD_THRESHOLD {
        rules.push(AdvisoryRule::HighYield);
    }

    if soil_ph < ACIDIC_PH_THRESHOLD {
        rules.push(AdvisoryRule::AcidicSoil);
    } else if soil_ph > ALKALINE_PH_THRESHOLD {
        rules.push(AdvisoryRule::AlkalineSoil);
    }

    rules
}

/// One advisory message in both supported languages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalizedMessage {
    pub hi: String,
    pub en: String,
}

impl LocalizedMessage {
    pub fn new(hi: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            hi: hi.into(),
            en: en.into(),
        }
    }

    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::Hindi => &self.hi,
            Language::English => &self.en,
        }
    }
}

/// Messages for every advisory rule, keyed by rule id.
///
/// A catalog file only needs to list the rules it overrides; the rest keep
/// their built-in messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MessageCatalog {
    messages: HashMap<AdvisoryRule, Vec<LocalizedMessage>>,
}

impl MessageCatalog {
    pub fn messages(&self, rule: AdvisoryRule) -> &[LocalizedMessage] {
        self.messages.get(&rule).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the messages of the rules present in `overrides`
    pub fn merge(mut self, overrides: MessageCatalog) -> Self {
        self.messages.extend(overrides.messages);
        self
    }

    /// Render the fired rules into recommendation strings.
    ///
    /// Each message is emitted once per language, in `languages` order.
    pub fn render(&self, rules: &[AdvisoryRule], languages: &[Language]) -> Vec<String> {
        rules
            .iter()
            .flat_map(|rule| self.messages(*rule))
            .flat_map(|message| {
                languages
                    .iter()
                    .map(move |lang| message.text(*lang).to_string())
            })
            .collect()
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let mut messages = HashMap::new();
        messages.insert(
            AdvisoryRule::LowYield,
            vec![
                LocalizedMessage::new(
                    "कम उपज की संभावना है। मिट्टी की जांच करवाएं।",
                    "Low yield expected. Consider getting your soil tested.",
                ),
                LocalizedMessage::new(
                    "मिट्टी की उर्वरता और सिंचाई में सुधार करें।",
                    "Improve soil fertility and irrigation.",
                ),
            ],
        );
        messages.insert(
            AdvisoryRule::HighYield,
            vec![
                LocalizedMessage::new(
                    "बधाई हो! अच्छी उपज की संभावना है।",
                    "Congratulations! A good yield is expected.",
                ),
                LocalizedMessage::new(
                    "वर्तमान खेती के तरीकों को जारी रखें।",
                    "Maintain your current farming practices.",
                ),
            ],
        );
        messages.insert(
            AdvisoryRule::AcidicSoil,
            vec![LocalizedMessage::new(
                "मिट्टी अम्लीय है। पीएच बढ़ाने के लिए चूना डालें।",
                "Soil is acidic. Apply lime to raise the pH.",
            )],
        );
        messages.insert(
            AdvisoryRule::AlkalineSoil,
            vec![LocalizedMessage::new(
                "मिट्टी क्षारीय है। जैविक खाद मिलाएं।",
                "Soil is alkaline. Add organic matter.",
            )],
        );
        Self { messages }
    }
}
