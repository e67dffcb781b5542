//! Exam Score - student exam score prediction
//!
//! Validates a student profile against the training-time label encoders,
//! standardises the numeric fields and scores the record with a
//! multi-input Candle network. Artifacts are loaded once at startup and
//! shared read-only by every request.

pub mod artifacts;
pub mod config;
pub mod http;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod preprocess;

#[cfg(test)]
mod fixtures;

pub use artifacts::{ArtifactPaths, Artifacts, StartupError};
pub use pipeline::{InferencePipeline, PipelineError, PredictionResult, StudentProfile};
