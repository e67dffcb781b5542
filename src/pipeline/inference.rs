//! InferencePipeline: validate → encode → scale → assemble → score
//!
//! Every call is independent. The pipeline only reads the shared artifacts,
//! so one instance can serve concurrent requests without locking.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::errors::PipelineError;
use super::profile::{EncodedRecord, PredictionResult, StudentProfile};
use crate::artifacts::Artifacts;
use crate::model::ModelInputs;
use crate::preprocess::NumericField;

/// Lowest and highest score the pipeline returns
pub const SCORE_RANGE: (f32, f32) = (0.0, 100.0);

#[derive(Clone)]
pub struct InferencePipeline {
    artifacts: Arc<Artifacts>,
}

impl InferencePipeline {
    pub fn new(artifacts: Arc<Artifacts>) -> Self {
        InferencePipeline { artifacts }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Predict an exam score for one student
    pub fn predict(&self, profile: &StudentProfile) -> Result<PredictionResult, PipelineError> {
        info!(age = profile.age, course = %profile.course, "received prediction request");

        let record = self.encode(profile)?;
        let score = self.score(&record).map_err(|err| {
            error!(cause = %err, "prediction failed");
            err
        })?;

        info!(score = %format!("{:.2}", score), "prediction succeeded");
        Ok(PredictionResult {
            predicted_exam_score: score,
        })
    }

    /// Validate and encode the categoricals, then scale the numerics.
    /// Nothing is scaled unless every categorical value is valid.
    pub fn encode(&self, profile: &StudentProfile) -> Result<EncodedRecord, PipelineError> {
        let codes = self
            .artifacts
            .encoders()
            .encode_profile(profile)
            .map_err(|err| {
                if let PipelineError::InvalidCategory { field, value, .. } = &err {
                    warn!(field = *field, value = %value, "invalid category");
                }
                err
            })?;

        let raw = profile.numerics();
        for field in NumericField::ALL {
            let value = raw[field.index()];
            if !value.is_finite() {
                warn!(field = field.name(), value, "non-finite numeric input");
                return Err(PipelineError::InvalidNumeric {
                    field: field.name(),
                    value,
                });
            }
            let out_of_range =
                value < 0.0 || (field == NumericField::ClassAttendance && value > 100.0);
            if out_of_range {
                debug!(field = field.name(), value, "out-of-range numeric input passed through");
            }
        }

        let scaled = self.artifacts.scaler().transform(&raw).map(|x| x as f32);

        // finite inputs can still overflow f32 once scaled
        for field in NumericField::ALL {
            if !scaled[field.index()].is_finite() {
                let value = raw[field.index()];
                warn!(field = field.name(), value, "numeric input overflows after scaling");
                return Err(PipelineError::InvalidNumeric {
                    field: field.name(),
                    value,
                });
            }
        }

        Ok(EncodedRecord { codes, scaled })
    }

    /// Run the model on an encoded record and extract the score.
    /// Any failure here is reported as `PredictionFailure`.
    fn score(&self, record: &EncodedRecord) -> Result<f32, PipelineError> {
        let model = self.artifacts.model();
        let inputs = ModelInputs::assemble(&record.codes, &record.scaled, model.device())?;
        let output = model.score(&inputs)?;

        // first batch element, first output unit
        let raw = output
            .to_vec2::<f32>()?
            .first()
            .and_then(|row| row.first())
            .copied()
            .ok_or_else(|| PipelineError::prediction_failure("model returned an empty output"))?;

        if !raw.is_finite() {
            return Err(PipelineError::prediction_failure(format!(
                "model returned a non-finite score ({})",
                raw
            )));
        }

        Ok(raw.clamp(SCORE_RANGE.0, SCORE_RANGE.1))
    }
}
