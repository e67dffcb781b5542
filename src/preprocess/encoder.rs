//! Category encoders: Fixed label vocabularies for the categorical fields
//!
//! Handles:
//! - Label → integer code mapping (code = position in the training-time class list)
//! - Normalization of raw request values (lowercase, trimmed)
//! - Rejection of labels outside the trained vocabulary, with the valid options attached

use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;

use crate::artifacts::StartupError;
use crate::pipeline::errors::PipelineError;
use crate::pipeline::profile::StudentProfile;

/// Number of categorical model inputs
pub const CATEGORICAL_FIELDS: usize = 7;

/// Categorical request fields, declared in the model's input order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    Gender,
    Course,
    InternetAccess,
    SleepQuality,
    StudyMethod,
    FacilityRating,
    ExamDifficulty,
}

impl CategoricalField {
    /// All fields in model input order
    pub const ALL: [CategoricalField; CATEGORICAL_FIELDS] = [
        CategoricalField::Gender,
        CategoricalField::Course,
        CategoricalField::InternetAccess,
        CategoricalField::SleepQuality,
        CategoricalField::StudyMethod,
        CategoricalField::FacilityRating,
        CategoricalField::ExamDifficulty,
    ];

    /// Request / artifact key for this field
    pub fn name(self) -> &'static str {
        match self {
            CategoricalField::Gender => "gender",
            CategoricalField::Course => "course",
            CategoricalField::InternetAccess => "internet_access",
            CategoricalField::SleepQuality => "sleep_quality",
            CategoricalField::StudyMethod => "study_method",
            CategoricalField::FacilityRating => "facility_rating",
            CategoricalField::ExamDifficulty => "exam_difficulty",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }

    /// Position of this field among the model inputs
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Immutable vocabulary for a single categorical field
#[derive(Clone, Debug)]
pub struct CategoryEncoder {
    field: CategoricalField,
    /// Code → label (the training-time class list)
    classes: Vec<String>,
    /// Label → code
    codes: FxHashMap<String, u32>,
}

impl CategoryEncoder {
    /// Build an encoder from the training-time class list.
    ///
    /// The list must be non-empty, canonical (already normalized) and strictly
    /// increasing, which is the order a label encoder fitted on strings emits.
    /// Re-sorting here would silently shift codes, so an unsorted list is rejected.
    pub fn new(field: CategoricalField, classes: Vec<String>) -> Result<Self, StartupError> {
        let invalid = |reason: String| StartupError::InvalidEncoder {
            field: field.name().to_string(),
            reason,
        };

        if classes.is_empty() {
            return Err(invalid("vocabulary is empty".to_string()));
        }

        for label in &classes {
            if Self::normalize(label) != *label {
                return Err(invalid(format!("label '{}' is not normalized", label)));
            }
        }

        if let Some(pair) = classes.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(invalid(format!(
                "labels must be sorted and unique ('{}' before '{}')",
                pair[0], pair[1]
            )));
        }

        let codes = classes
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code as u32))
            .collect();

        Ok(CategoryEncoder {
            field,
            classes,
            codes,
        })
    }

    /// Lowercase and trim a raw request value
    pub fn normalize(raw: &str) -> String {
        raw.to_lowercase().trim().to_string()
    }

    /// Encode a raw request value
    pub fn encode(&self, raw: &str) -> Result<u32, PipelineError> {
        let normalized = Self::normalize(raw);
        match self.codes.get(&normalized) {
            Some(&code) => Ok(code),
            None => Err(PipelineError::InvalidCategory {
                field: self.field.name(),
                value: normalized,
                valid_options: self.classes.clone(),
            }),
        }
    }

    /// Convert a code back to its label
    pub fn label(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    pub fn field(&self) -> CategoricalField {
        self.field
    }

    /// Valid options, in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Vocabulary size
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// One encoder per categorical field, each in its own named slot.
/// Read-only once built; encoders are reached through `get`.
#[derive(Clone, Debug)]
pub struct EncoderSet {
    gender: CategoryEncoder,
    course: CategoryEncoder,
    internet_access: CategoryEncoder,
    sleep_quality: CategoryEncoder,
    study_method: CategoryEncoder,
    facility_rating: CategoryEncoder,
    exam_difficulty: CategoryEncoder,
}

impl EncoderSet {
    /// Load the encoder artifact: a JSON object mapping field name → class list
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let content = fs::read_to_string(path).map_err(|source| StartupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let vocabularies: FxHashMap<String, Vec<String>> =
            serde_json::from_str(&content).map_err(|source| StartupError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_vocabularies(vocabularies)
    }

    /// Build the set from field name → class list pairs.
    /// Every field must be present exactly once; unknown keys are rejected.
    pub fn from_vocabularies(
        mut vocabularies: FxHashMap<String, Vec<String>>,
    ) -> Result<Self, StartupError> {
        let mut take = |field: CategoricalField| -> Result<CategoryEncoder, StartupError> {
            let classes = vocabularies
                .remove(field.name())
                .ok_or_else(|| StartupError::InvalidEncoder {
                    field: field.name().to_string(),
                    reason: "missing from encoder artifact".to_string(),
                })?;
            CategoryEncoder::new(field, classes)
        };

        let set = EncoderSet {
            gender: take(CategoricalField::Gender)?,
            course: take(CategoricalField::Course)?,
            internet_access: take(CategoricalField::InternetAccess)?,
            sleep_quality: take(CategoricalField::SleepQuality)?,
            study_method: take(CategoricalField::StudyMethod)?,
            facility_rating: take(CategoricalField::FacilityRating)?,
            exam_difficulty: take(CategoricalField::ExamDifficulty)?,
        };

        let mut unknown = vocabularies.into_keys().collect::<Vec<_>>();
        unknown.sort();
        if let Some(field) = unknown.into_iter().next() {
            return Err(StartupError::InvalidEncoder {
                field,
                reason: "unknown categorical field".to_string(),
            });
        }

        Ok(set)
    }

    pub fn get(&self, field: CategoricalField) -> &CategoryEncoder {
        match field {
            CategoricalField::Gender => &self.gender,
            CategoricalField::Course => &self.course,
            CategoricalField::InternetAccess => &self.internet_access,
            CategoricalField::SleepQuality => &self.sleep_quality,
            CategoricalField::StudyMethod => &self.study_method,
            CategoricalField::FacilityRating => &self.facility_rating,
            CategoricalField::ExamDifficulty => &self.exam_difficulty,
        }
    }

    /// Encode one raw value for `field`
    pub fn encode(&self, field: CategoricalField, raw: &str) -> Result<u32, PipelineError> {
        self.get(field).encode(raw)
    }

    /// Encode every categorical field of a profile in model input order.
    /// Stops at the first invalid value.
    pub fn encode_profile(
        &self,
        profile: &StudentProfile,
    ) -> Result<[u32; CATEGORICAL_FIELDS], PipelineError> {
        let mut codes = [0u32; CATEGORICAL_FIELDS];
        for field in CategoricalField::ALL {
            codes[field.index()] = self.encode(field, profile.categorical(field))?;
        }
        Ok(codes)
    }

    /// Vocabulary sizes in model input order
    pub fn cardinalities(&self) -> [usize; CATEGORICAL_FIELDS] {
        CategoricalField::ALL.map(|field| self.get(field).len())
    }
}
