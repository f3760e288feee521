//! Feature Scaler - fitted per-feature affine transform
//!
//! Exported from scikit-learn as JSON. Both the plain names (`mean`,
//! `scale`, `min`) and the fitted-attribute spellings (`mean_`, `scale_`,
//! `min_`) are accepted.

use ndarray::Array1;
use serde::Deserialize;

use super::error::ModelError;

/// Capability: transform one raw feature row into model space
pub trait FeatureScaler: Send + Sync {
    /// Number of features the scaler was fitted on
    fn n_features(&self) -> usize;

    fn transform(&self, row: &Array1<f64>) -> Result<Array1<f64>, ModelError>;
}

// ============================================================================
// ARTIFACT FORMAT
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScalerParams {
    Standard {
        #[serde(default, alias = "mean_")]
        mean: Option<Vec<f64>>,
        #[serde(default, alias = "scale_")]
        scale: Option<Vec<f64>>,
    },
    MinMax {
        #[serde(alias = "min_")]
        min: Vec<f64>,
        #[serde(alias = "scale_")]
        scale: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScalerArtifact {
    #[serde(flatten)]
    params: ScalerParams,

    /// Column order the scaler was fitted on, if recorded
    #[serde(default, alias = "feature_names_in_")]
    pub feature_names_in: Option<Vec<String>>,
}

// ============================================================================
// SCALER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard { mean: Array1<f64>, scale: Array1<f64> },
    /// `x * scale + min`
    MinMax { min: Array1<f64>, scale: Array1<f64> },
}

impl Scaler {
    pub fn standard(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        Self::from_params(ScalerParams::Standard { mean: Some(mean), scale: Some(scale) })
    }

    pub fn min_max(min: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        Self::from_params(ScalerParams::MinMax { min, scale })
    }

    /// Identity transform of the given width
    pub fn identity(width: usize) -> Self {
        Scaler::Standard {
            mean: Array1::zeros(width),
            scale: Array1::ones(width),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scaler::Standard { .. } => "standard",
            Scaler::MinMax { .. } => "min_max",
        }
    }

    fn from_params(params: ScalerParams) -> Result<Self, ModelError> {
        match params {
            ScalerParams::Standard { mean, scale } => {
                let width = match (&mean, &scale) {
                    (Some(m), Some(s)) if m.len() != s.len() => {
                        return Err(ModelError::Invalid(format!(
                            "scaler mean has {} entries but scale has {}",
                            m.len(),
                            s.len()
                        )));
                    }
                    (Some(m), _) => m.len(),
                    (None, Some(s)) => s.len(),
                    (None, None) => {
                        return Err(ModelError::Invalid(
                            "standard scaler needs `mean` or `scale`".to_string(),
                        ));
                    }
                };

                let mean = mean.map(Array1::from).unwrap_or_else(|| Array1::zeros(width));
                // Zero-variance columns are only centered
                let scale = scale
                    .map(|s| s.into_iter().map(|v| if v == 0.0 { 1.0 } else { v }).collect())
                    .unwrap_or_else(|| Array1::ones(width));

                Ok(Scaler::Standard { mean, scale })
            }
            ScalerParams::MinMax { min, scale } => {
                if min.len() != scale.len() {
                    return Err(ModelError::Invalid(format!(
                        "scaler min has {} entries but scale has {}",
                        min.len(),
                        scale.len()
                    )));
                }
                Ok(Scaler::MinMax {
                    min: Array1::from(min),
                    scale: Array1::from(scale),
                })
            }
        }
    }
}

impl TryFrom<ScalerArtifact> for Scaler {
    type Error = ModelError;

    fn try_from(artifact: ScalerArtifact) -> Result<Self, Self::Error> {
        Scaler::from_params(artifact.params)
    }
}

impl FeatureScaler for Scaler {
    fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { mean, .. } => mean.len(),
            Scaler::MinMax { min, .. } => min.len(),
        }
    }

    fn transform(&self, row: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
        if row.len() != self.n_features() {
            return Err(ModelError::ShapeMismatch {
                stage: "scaler",
                expected: self.n_features(),
                actual: row.len(),
            });
        }

        Ok(match self {
            Scaler::Standard { mean, scale } => (row - mean) / scale,
            Scaler::MinMax { min, scale } => row * scale + min,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_transform() {
        let scaler = Scaler::standard(vec![1.0, 10.0], vec![2.0, 5.0]).unwrap();
        let out = scaler.transform(&array![3.0, 0.0]).unwrap();
        assert_eq!(out, array![1.0, -2.0]);
    }

    #[test]
    fn test_zero_scale_only_centers() {
        let scaler = Scaler::standard(vec![4.0], vec![0.0]).unwrap();
        let out = scaler.transform(&array![6.0]).unwrap();
        assert_eq!(out, array![2.0]);
    }

    #[test]
    fn test_min_max_transform() {
        let scaler = Scaler::min_max(vec![-0.5, 0.0], vec![0.1, 2.0]).unwrap();
        let out = scaler.transform(&array![10.0, 0.25]).unwrap();
        assert!((out[0] - 0.5).abs() < 1e-12);
        assert!((out[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_width_mismatch_is_error() {
        let scaler = Scaler::identity(3);
        let err = scaler.transform(&array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_parse_sklearn_spelling() {
        let json = r#"{
            "kind": "standard",
            "mean_": [0.5, 1.5],
            "scale_": [1.0, 3.0],
            "feature_names_in_": ["humidity", "snow"]
        }"#;
        let artifact: ScalerArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(
            artifact.feature_names_in.as_deref(),
            Some(&["humidity".to_string(), "snow".to_string()][..])
        );

        let scaler = Scaler::try_from(artifact).unwrap();
        assert_eq!(scaler.n_features(), 2);
        assert_eq!(scaler.kind(), "standard");
    }

    #[test]
    fn test_parse_scale_only() {
        let json = r#"{"kind": "standard", "scale": [2.0, 4.0]}"#;
        let artifact: ScalerArtifact = serde_json::from_str(json).unwrap();
        let scaler = Scaler::try_from(artifact).unwrap();
        assert_eq!(scaler.transform(&array![2.0, 2.0]).unwrap(), array![1.0, 0.5]);
    }

    #[test]
    fn test_mismatched_params_rejected() {
        let json = r#"{"kind": "min_max", "min": [0.0], "scale": [1.0, 1.0]}"#;
        let artifact: ScalerArtifact = serde_json::from_str(json).unwrap();
        assert!(matches!(Scaler::try_from(artifact), Err(ModelError::Invalid(_))));
    }
}
