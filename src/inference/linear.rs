//! Linear / logistic model

use ndarray::{Array1, ArrayView1};
use serde::Deserialize;

use super::error::ModelError;
use super::regressor::{Link, ModelDescription, Regressor};

#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub link: Link,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>, link: Link) -> Self {
        Self {
            intercept,
            coefficients,
            link,
            feature_names: None,
        }
    }

    pub(crate) fn check(&self) -> Result<(), ModelError> {
        if self.coefficients.is_empty() {
            return Err(ModelError::Invalid("linear model has no coefficients".to_string()));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.coefficients.len() {
                return Err(ModelError::Invalid(format!(
                    "linear model has {} coefficients but {} feature names",
                    self.coefficients.len(),
                    names.len()
                )));
            }
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, row: &Array1<f64>) -> Result<f64, ModelError> {
        if row.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                stage: "model",
                expected: self.coefficients.len(),
                actual: row.len(),
            });
        }
        let weights = ArrayView1::from(&self.coefficients[..]);
        Ok(self.link.apply(self.intercept + row.dot(&weights)))
    }

    fn describe(&self) -> ModelDescription {
        let objective = match self.link {
            Link::Identity => "linear",
            Link::Logistic => "logistic",
        };
        ModelDescription {
            kind: "linear",
            objective: objective.to_string(),
            n_features: Some(self.coefficients.len()),
            trees: None,
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }
}
