//! Scoring network: Multi-input Candle model
//!
//! Handles:
//! - The `ScoringModel` contract (8 positioned inputs → one score per batch row)
//! - Assembly of the per-field input tensors for a single record
//! - Rebuilding the network from a `ModelBundle` and running the forward pass
//!
//! Architecture: one embedding head per categorical field, one dense ReLU head
//! for the numeric vector, concatenation, a ReLU trunk, one linear output unit.

use candle_core::{DType, Device, Error, Result, Tensor};
use candle_nn::{embedding, linear, Embedding, Linear, Module, VarBuilder};
use std::collections::HashMap;
use std::path::Path;

use super::bundle::{ModelBundle, NetworkConfig};
use crate::artifacts::StartupError;
use crate::preprocess::{CategoricalField, CATEGORICAL_FIELDS, NUMERIC_FEATURES};

/// Positioned model inputs: one `(batch, 1)` u32 tensor per categorical field,
/// followed by one `(batch, features)` f32 tensor for the numerics
#[derive(Clone, Debug)]
pub struct ModelInputs {
    categorical: Vec<Tensor>,
    numeric: Tensor,
}

impl ModelInputs {
    /// Build a batch of one from an encoded record
    pub fn assemble(
        codes: &[u32; CATEGORICAL_FIELDS],
        numeric: &[f32; NUMERIC_FEATURES],
        device: &Device,
    ) -> Result<Self> {
        let categorical = codes
            .iter()
            .map(|code| Tensor::from_slice(std::slice::from_ref(code), (1, 1), device))
            .collect::<Result<Vec<_>>>()?;
        let numeric = Tensor::from_slice(numeric.as_slice(), (1, NUMERIC_FEATURES), device)?;

        Ok(ModelInputs {
            categorical,
            numeric,
        })
    }

    /// Wrap already-built tensors without checking them
    pub fn from_tensors(categorical: Vec<Tensor>, numeric: Tensor) -> Self {
        ModelInputs {
            categorical,
            numeric,
        }
    }

    pub fn categorical(&self) -> &[Tensor] {
        &self.categorical
    }

    pub fn numeric(&self) -> &Tensor {
        &self.numeric
    }

    /// Number of positioned inputs
    pub fn arity(&self) -> usize {
        self.categorical.len() + 1
    }
}

/// Opaque scoring function loaded once at startup.
///
/// Implementations must be deterministic for fixed weights and safe to call
/// from many threads at once.
pub trait ScoringModel: Send + Sync {
    /// Device the inputs must be placed on
    fn device(&self) -> &Device;

    /// Score a batch; returns a `(batch, 1)` tensor
    fn score(&self, inputs: &ModelInputs) -> Result<Tensor>;
}

/// Candle implementation of the scoring network
pub struct CandleScoringModel {
    config: NetworkConfig,
    device: Device,
    /// One embedding per categorical field, in model input order
    embeddings: Vec<Embedding>,
    numeric: Linear,
    hidden: Vec<Linear>,
    output: Linear,
    parameter_count: usize,
}

impl CandleScoringModel {
    /// Load a bundle from disk and rebuild the network on `device`
    pub fn load(path: &Path, device: &Device) -> std::result::Result<Self, StartupError> {
        Self::from_bundle(ModelBundle::load(path)?, device)
    }

    /// Rebuild the network from an in-memory bundle
    pub fn from_bundle(
        bundle: ModelBundle,
        device: &Device,
    ) -> std::result::Result<Self, StartupError> {
        bundle.validate()?;
        let parameter_count = bundle.parameter_count();
        let config = bundle.config;

        let mut tensors = HashMap::with_capacity(bundle.tensors.len());
        for tensor in bundle.tensors {
            let value = Tensor::from_vec(tensor.data, tensor.shape, device)?;
            tensors.insert(tensor.name, value);
        }
        let vb = VarBuilder::from_tensors(tensors, DType::F32, device);

        let embeddings = CategoricalField::ALL
            .iter()
            .zip(&config.cardinalities)
            .map(|(field, &rows)| {
                embedding(rows, config.embedding_dim, vb.pp("embed").pp(field.name()))
            })
            .collect::<Result<Vec<_>>>()?;

        let numeric = linear(config.numeric_features, config.numeric_dim, vb.pp("numeric"))?;

        let mut width = config.trunk_input();
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        for (i, &units) in config.hidden_dims.iter().enumerate() {
            hidden.push(linear(width, units, vb.pp(format!("hidden{}", i)))?);
            width = units;
        }

        let output = linear(width, 1, vb.pp("output"))?;

        Ok(CandleScoringModel {
            config,
            device: device.clone(),
            embeddings,
            numeric,
            hidden,
            output,
            parameter_count,
        })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Number of weights in the network
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Reject inputs whose count or shapes do not match the network heads
    fn check_inputs(&self, inputs: &ModelInputs) -> Result<()> {
        if inputs.categorical().len() != self.embeddings.len() {
            return Err(Error::Msg(format!(
                "model expects {} inputs, got {}",
                self.embeddings.len() + 1,
                inputs.arity()
            )));
        }

        let (batch, width) = inputs.numeric().dims2()?;
        if width != self.config.numeric_features {
            return Err(Error::Msg(format!(
                "numeric input has {} features, model expects {}",
                width, self.config.numeric_features
            )));
        }

        let heads = CategoricalField::ALL
            .iter()
            .zip(inputs.categorical())
            .zip(&self.config.cardinalities);
        for ((field, codes), &rows) in heads {
            let (head_batch, head_width) = codes.dims2()?;
            if head_batch != batch || head_width != 1 {
                return Err(Error::Msg(format!(
                    "{} input has shape ({}, {}), expected ({}, 1)",
                    field.name(),
                    head_batch,
                    head_width,
                    batch
                )));
            }
            if let Some(&code) = codes
                .flatten_all()?
                .to_vec1::<u32>()?
                .iter()
                .find(|&&code| code as usize >= rows)
            {
                return Err(Error::Msg(format!(
                    "{} code {} is outside the embedding table ({} rows)",
                    field.name(),
                    code,
                    rows
                )));
            }
        }

        Ok(())
    }

    fn forward(&self, inputs: &ModelInputs) -> Result<Tensor> {
        let mut heads = Vec::with_capacity(inputs.arity());

        // (batch, 1) -> (batch, 1, dim) -> (batch, dim)
        for (table, codes) in self.embeddings.iter().zip(inputs.categorical()) {
            heads.push(table.forward(codes)?.flatten_from(1)?);
        }
        heads.push(self.numeric.forward(inputs.numeric())?.relu()?);

        let mut x = Tensor::cat(&heads, 1)?;
        for layer in &self.hidden {
            x = layer.forward(&x)?.relu()?;
        }

        self.output.forward(&x)
    }
}

impl ScoringModel for CandleScoringModel {
    fn device(&self) -> &Device {
        &self.device
    }

    fn score(&self, inputs: &ModelInputs) -> Result<Tensor> {
        self.check_inputs(inputs)?;
        self.forward(inputs)
    }
}
