//! Domain models for the Crop Yield Prediction service

mod advisory;
mod encoder;
mod environment;
mod feature;
mod prediction;

pub use advisory::*;
pub use encoder::*;
pub use environment::*;
pub use feature::*;
pub use prediction::*;
