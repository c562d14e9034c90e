//! Categorical label encoders
//!
//! The regression model was trained on integer codes, one code space per
//! categorical column. An [`EncoderTable`] holds the fitted class lists and
//! maps labels to codes (and back) for each [`CategoricalField`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categorical columns of the training data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    State,
    District,
    Season,
    Crop,
}

impl CategoricalField {
    /// All fields, in feature-vector order
    pub const ALL: [CategoricalField; 4] = [
        CategoricalField::State,
        CategoricalField::District,
        CategoricalField::Season,
        CategoricalField::Crop,
    ];

    /// Key used in the encoders artifact
    pub fn key(&self) -> &'static str {
        match self {
            CategoricalField::State => "state",
            CategoricalField::District => "district",
            CategoricalField::Season => "season",
            CategoricalField::Crop => "crop",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoricalField::State => write!(f, "State"),
            CategoricalField::District => write!(f, "District"),
            CategoricalField::Season => write!(f, "Season"),
            CategoricalField::Crop => write!(f, "Crop"),
        }
    }
}

/// Errors raised by the encoder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Unrecognized {field} '{value}': not present in the training data")]
    UnrecognizedLabel {
        field: CategoricalField,
        value: String,
    },

    #[error("Duplicate {field} label '{label}' in encoder classes")]
    DuplicateLabel {
        field: CategoricalField,
        label: String,
    },

    #[error("Encoder for {field} has no classes")]
    EmptyClasses { field: CategoricalField },
}

/// Fitted encoder for a single categorical column.
///
/// The code of a label is its position in `classes`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoder {
    field: CategoricalField,
    classes: Vec<String>,
    index: HashMap<String, u32>,
}

impl LabelEncoder {
    /// Build an encoder from a class list in code order.
    ///
    /// Labels are trimmed; duplicates after trimming are rejected.
    pub fn from_classes<I, S>(field: CategoricalField, classes: I) -> Result<Self, EncodeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: Vec<String> = classes
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .collect();

        if classes.is_empty() {
            return Err(EncodeError::EmptyClasses { field });
        }

        let mut index = HashMap::with_capacity(classes.len());
        for (code, label) in classes.iter().enumerate() {
            if index.insert(label.clone(), code as u32).is_some() {
                return Err(EncodeError::DuplicateLabel {
                    field,
                    label: label.clone(),
                });
            }
        }

        Ok(Self {
            field,
            classes,
            index,
        })
    }

    /// Known labels in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label.trim())
    }

    /// Map a label to its integer code
    pub fn encode(&self, label: &str) -> Result<u32, EncodeError> {
        self.index
            .get(label.trim())
            .copied()
            .ok_or_else(|| EncodeError::UnrecognizedLabel {
                field: self.field,
                value: label.to_string(),
            })
    }

    /// Map an integer code back to its label
    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }
}

/// Raw shape of the encoders artifact (`encoders.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderClasses {
    pub state: Vec<String>,
    pub district: Vec<String>,
    pub season: Vec<String>,
    pub crop: Vec<String>,
}

/// Integer codes for the four categorical fields of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncodedCategoricals {
    pub state: u32,
    pub district: u32,
    pub season: u32,
    pub crop: u32,
}

/// Encoders for every categorical field, immutable once loaded
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderTable {
    state: LabelEncoder,
    district: LabelEncoder,
    season: LabelEncoder,
    crop: LabelEncoder,
}

impl EncoderTable {
    pub fn from_classes(classes: EncoderClasses) -> Result<Self, EncodeError> {
        Ok(Self {
            state: LabelEncoder::from_classes(CategoricalField::State, classes.state)?,
            district: LabelEncoder::from_classes(CategoricalField::District, classes.district)?,
            season: LabelEncoder::from_classes(CategoricalField::Season, classes.season)?,
            crop: LabelEncoder::from_classes(CategoricalField::Crop, classes.crop)?,
        })
    }

    pub fn encoder(&self, field: CategoricalField) -> &LabelEncoder {
        match field {
            CategoricalField::State => &self.state,
            CategoricalField::District => &self.district,
            CategoricalField::Season => &self.season,
            CategoricalField::Crop => &self.crop,
        }
    }

    pub fn encode(&self, field: CategoricalField, label: &str) -> Result<u32, EncodeError> {
        self.encoder(field).encode(label)
    }

    pub fn decode(&self, field: CategoricalField, code: u32) -> Option<&str> {
        self.encoder(field).decode(code)
    }

    pub fn classes(&self, field: CategoricalField) -> &[String] {
        self.encoder(field).classes()
    }

    pub fn class_count(&self, field: CategoricalField) -> usize {
        self.encoder(field).len()
    }

    /// Encode all four categorical labels, stopping at the first unknown one
    pub fn encode_all(
        &self,
        state: &str,
        district: &str,
        season: &str,
        crop: &str,
    ) -> Result<EncodedCategoricals, EncodeError> {
        Ok(EncodedCategoricals {
            state: self.state.encode(state)?,
            district: self.district.encode(district)?,
            season: self.season.encode(season)?,
            crop: self.crop.encode(crop)?,
        })
    }
}
