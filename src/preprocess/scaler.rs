//! NumericScaler: Joint standardisation of the numeric fields
//!
//! Applies `(x - mean) / scale` per feature with statistics fixed at training
//! time. The four numeric fields are always transformed together, as one vector.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::artifacts::StartupError;

/// Width of the numeric model input
pub const NUMERIC_FEATURES: usize = 4;

/// Numeric request fields, in the scaler's column order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericField {
    Age,
    StudyHours,
    ClassAttendance,
    SleepHours,
}

impl NumericField {
    pub const ALL: [NumericField; NUMERIC_FEATURES] = [
        NumericField::Age,
        NumericField::StudyHours,
        NumericField::ClassAttendance,
        NumericField::SleepHours,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericField::Age => "age",
            NumericField::StudyHours => "study_hours",
            NumericField::ClassAttendance => "class_attendance",
            NumericField::SleepHours => "sleep_hours",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// On-disk layout of the scaler artifact
#[derive(Debug, Deserialize)]
struct ScalerFile {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Per-feature (mean, scale) pairs
#[derive(Clone, Debug, PartialEq)]
pub struct NumericScaler {
    mean: [f64; NUMERIC_FEATURES],
    scale: [f64; NUMERIC_FEATURES],
}

impl NumericScaler {
    /// Create a scaler from training statistics.
    ///
    /// A zero scale marks a constant feature and is replaced by 1.
    pub fn new(
        mean: [f64; NUMERIC_FEATURES],
        scale: [f64; NUMERIC_FEATURES],
    ) -> Result<Self, StartupError> {
        for field in NumericField::ALL {
            let (m, s) = (mean[field.index()], scale[field.index()]);
            if !m.is_finite() || !s.is_finite() {
                return Err(StartupError::InvalidScaler(format!(
                    "non-finite statistics for {}",
                    field.name()
                )));
            }
            if s < 0.0 {
                return Err(StartupError::InvalidScaler(format!(
                    "negative scale {} for {}",
                    s,
                    field.name()
                )));
            }
        }

        let scale = scale.map(|s| if s == 0.0 { 1.0 } else { s });
        Ok(NumericScaler { mean, scale })
    }

    /// Load the scaler artifact: `{ "mean": [..4], "scale": [..4] }`
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let content = fs::read_to_string(path).map_err(|source| StartupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ScalerFile =
            serde_json::from_str(&content).map_err(|source| StartupError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let width = |values: Vec<f64>, name: &str| -> Result<[f64; NUMERIC_FEATURES], StartupError> {
            let len = values.len();
            values.try_into().map_err(|_| {
                StartupError::InvalidScaler(format!(
                    "expected {} {} values, found {}",
                    NUMERIC_FEATURES, name, len
                ))
            })
        };

        Self::new(width(file.mean, "mean")?, width(file.scale, "scale")?)
    }

    /// Standardise a raw numeric vector
    pub fn transform(&self, raw: &[f64; NUMERIC_FEATURES]) -> [f64; NUMERIC_FEATURES] {
        std::array::from_fn(|i| (raw[i] - self.mean[i]) / self.scale[i])
    }

    pub fn mean(&self) -> &[f64; NUMERIC_FEATURES] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64; NUMERIC_FEATURES] {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_transform_standardises_each_column() {
        let scaler = NumericScaler::new([20.0, 4.0, 70.0, 7.0], [2.0, 2.0, 10.0, 1.0]).unwrap();
        let scaled = scaler.transform(&[22.0, 5.0, 85.0, 7.0]);
        assert_abs_diff_eq!(scaled[0], 1.0);
        assert_abs_diff_eq!(scaled[1], 0.5);
        assert_abs_diff_eq!(scaled[2], 1.5);
        assert_abs_diff_eq!(scaled[3], 0.0);
    }

    #[test]
    fn test_transform_is_pure() {
        let scaler = NumericScaler::new([20.5, 4.0, 70.0, 7.0], [2.0, 2.5, 17.0, 1.5]).unwrap();
        let raw = [21.0, 5.0, 85.0, 7.0];
        let first = scaler.transform(&raw);
        let second = scaler.transform(&raw);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_out_of_range_values_pass_through() {
        let scaler = NumericScaler::new([20.0, 4.0, 70.0, 7.0], [2.0, 2.0, 10.0, 1.0]).unwrap();
        let scaled = scaler.transform(&[-4.0, 0.0, 150.0, 0.0]);
        assert_abs_diff_eq!(scaled[0], -12.0);
        assert_abs_diff_eq!(scaled[2], 8.0);
    }

    #[test]
    fn test_zero_scale_is_treated_as_one() {
        let scaler = NumericScaler::new([0.0, 0.0, 0.0, 3.0], [1.0, 1.0, 1.0, 0.0]).unwrap();
        assert_eq!(scaler.scale()[3], 1.0);
        assert_abs_diff_eq!(scaler.transform(&[0.0, 0.0, 0.0, 5.0])[3], 2.0);
    }

    #[test]
    fn test_rejects_invalid_statistics() {
        assert!(NumericScaler::new([f64::NAN, 0.0, 0.0, 0.0], [1.0; 4]).is_err());
        assert!(NumericScaler::new([0.0; 4], [1.0, f64::INFINITY, 1.0, 1.0]).is_err());
        assert!(NumericScaler::new([0.0; 4], [1.0, 1.0, -2.0, 1.0]).is_err());
    }

    #[test]
    fn test_load_checks_vector_width() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("scaler.json");
        fs::write(&good, r#"{"mean": [20.5, 4.0, 70.0, 7.0], "scale": [2.0, 2.5, 17.0, 1.5]}"#)
            .unwrap();
        let scaler = NumericScaler::load(&good).unwrap();
        assert_eq!(scaler.mean(), &[20.5, 4.0, 70.0, 7.0]);

        let short = dir.path().join("short.json");
        fs::write(&short, r#"{"mean": [20.5, 4.0, 70.0], "scale": [2.0, 2.5, 17.0]}"#).unwrap();
        assert!(matches!(
            NumericScaler::load(&short),
            Err(StartupError::InvalidScaler(_))
        ));

        let missing = dir.path().join("absent.json");
        assert!(matches!(
            NumericScaler::load(&missing),
            Err(StartupError::Io { .. })
        ));
    }
}
