//! Preprocessing: Category encoding and numeric scaling
//!
//! # Components
//! - `encoder.rs`: Label → code mapping for the 7 categorical fields
//! - `scaler.rs`: Joint standardisation of the 4 numeric fields

pub mod encoder;
pub mod scaler;

pub use encoder::{CategoricalField, CategoryEncoder, EncoderSet, CATEGORICAL_FIELDS};
pub use scaler::{NumericField, NumericScaler, NUMERIC_FEATURES};
