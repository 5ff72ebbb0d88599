//! Fitted numeric scalers
//!
//! Both scalers carry the column list they were fitted on. That list is the
//! authoritative column selection for the group they transform.

use crate::error::PredictError;
use serde::{Deserialize, Serialize};

/// Median/IQR normalization: `(x - center) / scale`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobustScaler {
    pub feature_names_in: Vec<String>,
    pub center: Vec<f64>,
    pub scale: Vec<f64>,
}

impl RobustScaler {
    pub fn validate(&self) -> Result<(), String> {
        let n = self.feature_names_in.len();
        if n == 0 {
            return Err("robust scaler has no columns".to_string());
        }
        if self.center.len() != n || self.scale.len() != n {
            return Err(format!(
                "robust scaler has {} columns but {} centers and {} scales",
                n,
                self.center.len(),
                self.scale.len()
            ));
        }
        Ok(())
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        check_width("robust scaler", self.feature_names_in.len(), row.len())?;
        Ok(row
            .iter()
            .zip(self.center.iter().zip(&self.scale))
            .map(|(x, (center, scale))| (x - center) / non_zero(*scale))
            .collect())
    }
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Linear rescaling into `feature_range`: `x * scale + min`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MinMaxScaler {
    pub feature_names_in: Vec<String>,
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default)]
    pub data_min: Vec<f64>,
    #[serde(default)]
    pub data_max: Vec<f64>,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
    #[serde(default)]
    pub clip: bool,
}

impl MinMaxScaler {
    /// Build a scaler from per-column fitted bounds
    pub fn fit_bounds(
        feature_names_in: Vec<String>,
        data_min: Vec<f64>,
        data_max: Vec<f64>,
        feature_range: (f64, f64),
    ) -> Self {
        let (low, high) = feature_range;
        let scale: Vec<f64> = data_min
            .iter()
            .zip(&data_max)
            .map(|(lo, hi)| (high - low) / non_zero(hi - lo))
            .collect();
        let min = data_min.iter().zip(&scale).map(|(lo, s)| low - lo * s).collect();
        Self {
            feature_names_in,
            min,
            scale,
            data_min,
            data_max,
            feature_range,
            clip: false,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let n = self.feature_names_in.len();
        if n == 0 {
            return Err("min-max scaler has no columns".to_string());
        }
        if self.min.len() != n || self.scale.len() != n {
            return Err(format!(
                "min-max scaler has {} columns but {} offsets and {} scales",
                n,
                self.min.len(),
                self.scale.len()
            ));
        }
        if self.feature_range.0 >= self.feature_range.1 {
            return Err(format!(
                "min-max feature range {:?} is empty",
                self.feature_range
            ));
        }
        Ok(())
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        check_width("min-max scaler", self.feature_names_in.len(), row.len())?;
        let (low, high) = self.feature_range;
        Ok(row
            .iter()
            .zip(self.scale.iter().zip(&self.min))
            .map(|(x, (scale, min))| {
                let scaled = x * scale + min;
                if self.clip {
                    scaled.clamp(low, high)
                } else {
                    scaled
                }
            })
            .collect())
    }
}

fn check_width(what: &str, expected: usize, actual: usize) -> Result<(), PredictError> {
    if expected != actual {
        return Err(PredictError::SchemaMismatch(format!(
            "{} fitted on {} columns, given {}",
            what, expected, actual
        )));
    }
    Ok(())
}

/// Constant columns are fitted with a zero scale; treat it as one
fn non_zero(scale: f64) -> f64 {
    if scale == 0.0 {
        1.0
    } else {
        scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year_scaler() -> MinMaxScaler {
        MinMaxScaler::fit_bounds(
            vec!["ANIO_NACIMIENTO".into(), "COLEGIO_ANIO_EGRESO".into()],
            vec![1980.0, 2000.0],
            vec![2010.0, 2024.0],
            (0.0, 1.0),
        )
    }

    #[test]
    fn test_robust_scaling() {
        let scaler = RobustScaler {
            feature_names_in: vec!["CALIF_FINAL".into()],
            center: vec![12.0],
            scale: vec![4.0],
        };
        assert_eq!(scaler.transform(&[15.0]).unwrap(), vec![0.75]);
        assert_eq!(scaler.transform(&[12.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_robust_zero_scale() {
        let scaler = RobustScaler {
            feature_names_in: vec!["CALIF_FINAL".into()],
            center: vec![10.0],
            scale: vec![0.0],
        };
        assert_eq!(scaler.transform(&[12.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_min_max_bounds() {
        let scaler = year_scaler();
        let low = scaler.transform(&[1980.0, 2000.0]).unwrap();
        let high = scaler.transform(&[2010.0, 2024.0]).unwrap();
        assert!(low.iter().all(|v| v.abs() < 1e-9), "low was {:?}", low);
        assert!(high.iter().all(|v| (v - 1.0).abs() < 1e-9), "high was {:?}", high);
    }

    #[test]
    fn test_min_max_clip() {
        let mut scaler = year_scaler();
        let unclipped = scaler.transform(&[2020.0, 2024.0]).unwrap();
        assert!(unclipped[0] > 1.0);

        scaler.clip = true;
        let clipped = scaler.transform(&[2020.0, 2024.0]).unwrap();
        assert_eq!(clipped[0], 1.0);
    }

    #[test]
    fn test_width_mismatch_is_schema_error() {
        let scaler = year_scaler();
        let err = scaler.transform(&[2004.0]).unwrap_err();
        assert!(matches!(err, PredictError::SchemaMismatch(_)));
    }

    #[test]
    fn test_validate_lengths() {
        let mut scaler = year_scaler();
        assert!(scaler.validate().is_ok());
        scaler.scale.pop();
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let scaler: MinMaxScaler = serde_json::from_str(
            r#"{"feature_names_in": ["ANIO_NACIMIENTO"], "min": [-66.0], "scale": [0.0333333]}"#,
        )
        .unwrap();
        assert_eq!(scaler.feature_range, (0.0, 1.0));
        assert!(!scaler.clip);
    }
}
