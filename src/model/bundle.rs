//! Model bundle: bincode weight format for the scoring network
//!
//! A bundle is the network configuration plus a flat list of named tensors.
//! Each tensor is stored row-major as `Vec<f32>` alongside its shape.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::artifacts::StartupError;
use crate::preprocess::{CategoricalField, CATEGORICAL_FIELDS};

/// Network hyper-parameters needed to rebuild the layers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Embedding rows per categorical head, in model input order
    pub cardinalities: Vec<usize>,
    /// Embedding width shared by all categorical heads
    pub embedding_dim: usize,
    /// Width of the numeric input vector
    pub numeric_features: usize,
    /// Output width of the numeric head
    pub numeric_dim: usize,
    /// Widths of the ReLU trunk layers
    pub hidden_dims: Vec<usize>,
}

impl NetworkConfig {
    /// Width of the concatenated head outputs feeding the trunk
    pub fn trunk_input(&self) -> usize {
        self.cardinalities.len() * self.embedding_dim + self.numeric_dim
    }

    /// Every tensor the network needs, with its expected shape
    pub fn tensor_shapes(&self) -> Vec<(String, Vec<usize>)> {
        let mut shapes = Vec::new();

        for (field, &rows) in CategoricalField::ALL.iter().zip(&self.cardinalities) {
            shapes.push((
                format!("embed.{}.weight", field.name()),
                vec![rows, self.embedding_dim],
            ));
        }

        shapes.push((
            "numeric.weight".to_string(),
            vec![self.numeric_dim, self.numeric_features],
        ));
        shapes.push(("numeric.bias".to_string(), vec![self.numeric_dim]));

        let mut width = self.trunk_input();
        for (i, &hidden) in self.hidden_dims.iter().enumerate() {
            shapes.push((format!("hidden{}.weight", i), vec![hidden, width]));
            shapes.push((format!("hidden{}.bias", i), vec![hidden]));
            width = hidden;
        }

        shapes.push(("output.weight".to_string(), vec![1, width]));
        shapes.push(("output.bias".to_string(), vec![1]));
        shapes
    }

    fn validate(&self) -> Result<(), StartupError> {
        if self.cardinalities.len() != CATEGORICAL_FIELDS {
            return Err(StartupError::InvalidModel(format!(
                "expected {} categorical heads, found {}",
                CATEGORICAL_FIELDS,
                self.cardinalities.len()
            )));
        }
        if self.cardinalities.iter().any(|&rows| rows == 0) {
            return Err(StartupError::InvalidModel(
                "embedding with zero rows".to_string(),
            ));
        }
        if self.embedding_dim == 0 || self.numeric_dim == 0 || self.numeric_features == 0 {
            return Err(StartupError::InvalidModel(
                "layer widths must be non-zero".to_string(),
            ));
        }
        if self.hidden_dims.iter().any(|&hidden| hidden == 0) {
            return Err(StartupError::InvalidModel(
                "hidden layer with zero width".to_string(),
            ));
        }
        Ok(())
    }
}

/// One named tensor, flattened
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TensorData {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Serialized scoring network
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelBundle {
    pub config: NetworkConfig,
    pub tensors: Vec<TensorData>,
}

impl ModelBundle {
    /// Read and validate a bundle from disk
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let bytes = fs::read(path).map_err(|source| StartupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bundle: ModelBundle =
            bincode::deserialize(&bytes).map_err(|source| StartupError::Bincode {
                path: path.to_path_buf(),
                source,
            })?;

        bundle.validate()?;
        Ok(bundle)
    }

    /// Write the bundle to disk
    pub fn save(&self, path: &Path) -> Result<(), StartupError> {
        let bytes = bincode::serialize(self).map_err(|source| StartupError::Bincode {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, bytes).map_err(|source| StartupError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check the tensor list against the configuration
    pub fn validate(&self) -> Result<(), StartupError> {
        self.config.validate()?;

        for tensor in &self.tensors {
            let expected: usize = tensor.shape.iter().product();
            if tensor.data.len() != expected {
                return Err(StartupError::InvalidModel(format!(
                    "tensor {} has {} values for shape {:?}",
                    tensor.name,
                    tensor.data.len(),
                    tensor.shape
                )));
            }
        }

        for (name, shape) in self.config.tensor_shapes() {
            match self.tensor(&name) {
                Some(tensor) if tensor.shape == shape => {}
                Some(tensor) => {
                    return Err(StartupError::InvalidModel(format!(
                        "tensor {} has shape {:?}, expected {:?}",
                        name, tensor.shape, shape
                    )))
                }
                None => {
                    return Err(StartupError::InvalidModel(format!(
                        "missing tensor {}",
                        name
                    )))
                }
            }
        }

        Ok(())
    }

    pub fn tensor(&self, name: &str) -> Option<&TensorData> {
        self.tensors.iter().find(|tensor| tensor.name == name)
    }

    /// Total number of weights
    pub fn parameter_count(&self) -> usize {
        self.tensors.iter().map(|tensor| tensor.data.len()).sum()
    }
}
