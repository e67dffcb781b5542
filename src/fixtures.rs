//! Deterministic artifacts and doubles shared by the unit tests

use candle_core::{Device, Result, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::artifacts::{Artifacts, ENCODERS_FILE, MODEL_FILE, SCALER_FILE};
use crate::model::{
    CandleScoringModel, ModelBundle, ModelInputs, NetworkConfig, ScoringModel, TensorData,
};
use crate::pipeline::StudentProfile;
use crate::preprocess::{EncoderSet, NumericScaler, NUMERIC_FEATURES};

/// Training vocabularies, as a label encoder would emit them
pub fn vocabularies() -> FxHashMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 7] = [
        ("gender", &["female", "male", "other"]),
        (
            "course",
            &["b.com", "b.sc", "b.tech", "ba", "bba", "bca", "diploma"],
        ),
        ("internet_access", &["no", "yes"]),
        ("sleep_quality", &["average", "good", "poor"]),
        (
            "study_method",
            &["coaching", "group study", "mixed", "online videos", "self-study"],
        ),
        ("facility_rating", &["high", "low", "medium"]),
        ("exam_difficulty", &["easy", "hard", "moderate"]),
    ];

    table
        .iter()
        .map(|(field, labels)| {
            (
                field.to_string(),
                labels.iter().map(|label| label.to_string()).collect(),
            )
        })
        .collect()
}

pub fn encoders() -> EncoderSet {
    EncoderSet::from_vocabularies(vocabularies()).unwrap()
}

pub fn scaler() -> NumericScaler {
    NumericScaler::new([20.5, 4.0, 70.0, 7.0], [2.0, 2.5, 17.0, 1.5]).unwrap()
}

pub fn network_config() -> NetworkConfig {
    NetworkConfig {
        cardinalities: encoders().cardinalities().to_vec(),
        embedding_dim: 4,
        numeric_features: NUMERIC_FEATURES,
        numeric_dim: 8,
        hidden_dims: vec![16, 8],
    }
}

/// Small random weights from a fixed seed; the output bias centres scores mid-range
pub fn seeded_bundle(config: &NetworkConfig, seed: u64) -> ModelBundle {
    let mut rng = StdRng::seed_from_u64(seed);
    let tensors = config
        .tensor_shapes()
        .into_iter()
        .map(|(name, shape)| {
            let data = if name == "output.bias" {
                vec![60.0]
            } else {
                let len = shape.iter().product::<usize>();
                (0..len).map(|_| rng.gen_range(-0.5f32..0.5)).collect()
            };
            TensorData { name, shape, data }
        })
        .collect();

    ModelBundle {
        config: config.clone(),
        tensors,
    }
}

pub fn candle_model(config: &NetworkConfig, seed: u64) -> CandleScoringModel {
    CandleScoringModel::from_bundle(seeded_bundle(config, seed), &Device::Cpu).unwrap()
}

pub fn artifacts_with_model(model: impl ScoringModel + 'static) -> Artifacts {
    Artifacts::from_parts(encoders(), scaler(), model)
}

pub fn artifacts() -> Artifacts {
    artifacts_with_model(candle_model(&network_config(), 42))
}

/// Write a complete, loadable artifact directory
pub fn write_artifacts(dir: &Path) {
    fs::write(
        dir.join(ENCODERS_FILE),
        serde_json::to_string_pretty(&vocabularies()).unwrap(),
    )
    .unwrap();
    fs::write(
        dir.join(SCALER_FILE),
        r#"{"mean": [20.5, 4.0, 70.0, 7.0], "scale": [2.0, 2.5, 17.0, 1.5]}"#,
    )
    .unwrap();
    seeded_bundle(&network_config(), 42)
        .save(&dir.join(MODEL_FILE))
        .unwrap();
}

/// The reference request: a valid profile with one non-canonical label
pub fn sample_profile() -> StudentProfile {
    StudentProfile {
        gender: "Male".to_string(),
        course: "b.tech".to_string(),
        internet_access: "yes".to_string(),
        sleep_quality: "good".to_string(),
        study_method: "self-study".to_string(),
        facility_rating: "high".to_string(),
        exam_difficulty: "easy".to_string(),
        age: 21.0,
        study_hours: 5.0,
        class_attendance: 85.0,
        sleep_hours: 7.0,
    }
}

/// Scoring model wrapper that counts invocations
pub struct CountingModel {
    inner: CandleScoringModel,
    calls: Arc<AtomicUsize>,
}

impl CountingModel {
    pub fn new(inner: CandleScoringModel) -> Self {
        CountingModel {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ScoringModel for CountingModel {
    fn device(&self) -> &Device {
        self.inner.device()
    }

    fn score(&self, inputs: &ModelInputs) -> Result<Tensor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.score(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::CategoricalField;

    #[test]
    fn test_fixture_vocabularies_cover_every_field() {
        let vocabularies = vocabularies();
        for field in CategoricalField::ALL {
            assert!(vocabularies.contains_key(field.name()));
        }
        assert_eq!(encoders().cardinalities().to_vec(), network_config().cardinalities);
    }
}
