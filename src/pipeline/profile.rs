//! Request and per-request records

use serde::{Deserialize, Serialize};

use crate::preprocess::{CategoricalField, NumericField, CATEGORICAL_FIELDS, NUMERIC_FEATURES};

/// Raw prediction request, as received at the boundary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub gender: String,
    pub course: String,
    pub internet_access: String,
    pub sleep_quality: String,
    pub study_method: String,
    pub facility_rating: String,
    pub exam_difficulty: String,
    pub age: f64,
    pub study_hours: f64,
    pub class_attendance: f64,
    pub sleep_hours: f64,
}

impl StudentProfile {
    /// Raw value of a categorical field
    pub fn categorical(&self, field: CategoricalField) -> &str {
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

    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::Age => self.age,
            NumericField::StudyHours => self.study_hours,
            NumericField::ClassAttendance => self.class_attendance,
            NumericField::SleepHours => self.sleep_hours,
        }
    }

    /// Numeric fields in scaler column order
    pub fn numerics(&self) -> [f64; NUMERIC_FEATURES] {
        NumericField::ALL.map(|field| self.numeric(field))
    }

    #[cfg(test)]
    pub(crate) fn set_categorical(&mut self, field: CategoricalField, value: &str) {
        let slot = match field {
            CategoricalField::Gender => &mut self.gender,
            CategoricalField::Course => &mut self.course,
            CategoricalField::InternetAccess => &mut self.internet_access,
            CategoricalField::SleepQuality => &mut self.sleep_quality,
            CategoricalField::StudyMethod => &mut self.study_method,
            CategoricalField::FacilityRating => &mut self.facility_rating,
            CategoricalField::ExamDifficulty => &mut self.exam_difficulty,
        };
        *slot = value.to_string();
    }
}

/// Validated, encoded and scaled request. Built once, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedRecord {
    /// Category codes in model input order
    pub codes: [u32; CATEGORICAL_FIELDS],
    /// Standardised numerics in scaler column order
    pub scaled: [f32; NUMERIC_FEATURES],
}

/// Successful prediction
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_exam_score: f32,
}
