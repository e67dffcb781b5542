//! Pipeline Module: Request validation, encoding and scoring
//!
//! # Components
//! - `profile.rs`: `StudentProfile` request, `EncodedRecord`, `PredictionResult`
//! - `inference.rs`: `InferencePipeline` orchestration
//! - `errors.rs`: Client vs. server error taxonomy

pub mod errors;
pub mod inference;
pub mod profile;

pub use errors::{ErrorKind, PipelineError};
pub use inference::InferencePipeline;
pub use profile::{EncodedRecord, PredictionResult, StudentProfile};
