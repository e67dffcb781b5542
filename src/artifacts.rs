//! Startup artifacts: encoders, scaler and scoring model
//!
//! All three are loaded once into an immutable `Artifacts` bundle that the
//! pipeline shares across requests. Any load failure aborts startup.

use candle_core::Device;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::model::{CandleScoringModel, ScoringModel};
use crate::preprocess::{CategoricalField, EncoderSet, NumericScaler, NUMERIC_FEATURES};

pub const ENCODERS_FILE: &str = "label_encoders.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.bin";

/// Missing or unusable artifacts
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode model bundle {}: {source}", .path.display())]
    Bincode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("invalid encoder for {field}: {reason}")]
    InvalidEncoder { field: String, reason: String },

    #[error("invalid scaler: {0}")]
    InvalidScaler(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("failed to build model: {0}")]
    Candle(#[from] candle_core::Error),
}

/// Locations of the three artifact files
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub encoders: PathBuf,
    pub scaler: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        ArtifactPaths {
            encoders: dir.join(ENCODERS_FILE),
            scaler: dir.join(SCALER_FILE),
            model: dir.join(MODEL_FILE),
        }
    }
}

/// Immutable capability bundle: no setters, no reload
pub struct Artifacts {
    encoders: EncoderSet,
    scaler: NumericScaler,
    model: Box<dyn ScoringModel>,
}

impl Artifacts {
    /// Load and cross-check all artifacts
    pub fn load(paths: &ArtifactPaths) -> Result<Self, StartupError> {
        let encoders = EncoderSet::load(&paths.encoders)?;
        let scaler = NumericScaler::load(&paths.scaler)?;
        let model = CandleScoringModel::load(&paths.model, &Device::Cpu)?;

        check_compatible(&encoders, &model)?;

        info!(
            vocabularies = ?encoders.cardinalities(),
            parameters = model.parameter_count(),
            "all model artifacts loaded"
        );

        Ok(Self::from_parts(encoders, scaler, model))
    }

    /// Assemble from already-loaded parts
    pub fn from_parts(
        encoders: EncoderSet,
        scaler: NumericScaler,
        model: impl ScoringModel + 'static,
    ) -> Self {
        Artifacts {
            encoders,
            scaler,
            model: Box::new(model),
        }
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    pub fn scaler(&self) -> &NumericScaler {
        &self.scaler
    }

    pub fn model(&self) -> &dyn ScoringModel {
        self.model.as_ref()
    }
}

/// Every code an encoder can emit must have an embedding row,
/// and the numeric head must take exactly the scaler's columns
fn check_compatible(
    encoders: &EncoderSet,
    model: &CandleScoringModel,
) -> Result<(), StartupError> {
    let config = model.config();

    if config.numeric_features != NUMERIC_FEATURES {
        return Err(StartupError::InvalidModel(format!(
            "numeric head takes {} features, scaler produces {}",
            config.numeric_features, NUMERIC_FEATURES
        )));
    }

    for field in CategoricalField::ALL {
        let vocabulary = encoders.get(field).len();
        let rows = config.cardinalities[field.index()];
        if vocabulary > rows {
            return Err(StartupError::InvalidModel(format!(
                "{} encoder has {} labels but the embedding has {} rows",
                field.name(),
                vocabulary,
                rows
            )));
        }
    }

    Ok(())
}
