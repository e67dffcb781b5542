//! Model Module: Scoring network and its on-disk format
//!
//! # Components
//! - `network.rs`: `ScoringModel` contract, input assembly, Candle network
//! - `bundle.rs`: bincode weight bundle (config + named tensors)

pub mod bundle;
pub mod network;

pub use bundle::{ModelBundle, NetworkConfig, TensorData};
pub use network::{CandleScoringModel, ModelInputs, ScoringModel};
