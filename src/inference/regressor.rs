//! Regressor - trained model capability and artifact dispatch

use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::booster::XgbModel;
use super::error::ModelError;
use super::linear::LinearModel;

/// Capability: map one scaled feature row to a scalar score
pub trait Regressor: Send + Sync {
    /// Fitted width, when the artifact records it
    fn n_features(&self) -> Option<usize>;

    fn predict(&self, row: &Array1<f64>) -> Result<f64, ModelError>;

    fn describe(&self) -> ModelDescription;

    /// Column order the model was fitted on, if recorded
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Smallest row width every split can read
    fn required_features(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelDescription {
    pub kind: &'static str,
    pub objective: String,
    pub n_features: Option<usize>,
    /// Ensemble size for tree models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trees: Option<usize>,
}

/// Output transform applied to the raw margin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    #[default]
    Identity,
    Logistic,
}

impl Link {
    pub fn apply(self, margin: f64) -> f64 {
        match self {
            Link::Identity => margin,
            Link::Logistic => 1.0 / (1.0 + (-margin).exp()),
        }
    }

    /// Inverse of `apply`, used to turn a base score into a margin
    pub fn inverse(self, value: f64) -> f64 {
        match self {
            Link::Identity => value,
            Link::Logistic => {
                let p = value.clamp(1e-16, 1.0 - 1e-16);
                (p / (1.0 - p)).ln()
            }
        }
    }
}

/// Parse a model artifact, detecting the format from its top-level keys
pub fn parse_model(bytes: &[u8], path: &Path) -> Result<Box<dyn Regressor>, ModelError> {
    let malformed = |source| ModelError::Malformed { path: path.to_path_buf(), source };

    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(malformed)?;

    if value.get("learner").is_some() {
        let doc = serde_json::from_value(value).map_err(malformed)?;
        return Ok(Box::new(XgbModel::from_document(doc)?));
    }

    match value.get("kind").and_then(|k| k.as_str()) {
        Some("linear") => {
            let model: LinearModel = serde_json::from_value(value).map_err(malformed)?;
            model.check()?;
            Ok(Box::new(model))
        }
        Some(other) => Err(ModelError::Unsupported(format!("model kind `{}`", other))),
        None => Err(ModelError::Unsupported(
            "expected an XGBoost JSON model or a `kind` tag".to_string(),
        )),
    }
}
