//! Flood Predictor - assemble, scale, predict, classify

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::Serialize;

use super::artifacts::{ArtifactBundle, ArtifactInfo};
use super::error::ModelError;
use super::layout::LayoutSource;
use super::regressor::ModelDescription;
use super::threshold::{confidence_percent, RiskThresholds};
use crate::models::{FloodRisk, InputRecord};

/// Prediction output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub risk: FloodRisk,
    /// Percentage in [0, 100], 2 decimals
    pub confidence: f64,
    /// Raw model output
    pub score: f64,
}

/// Loaded bundle plus the classification settings. Built once, shared by `Arc`.
#[derive(Debug)]
pub struct FloodPredictor {
    bundle: ArtifactBundle,
    thresholds: RiskThresholds,
    missing_value: f64,
}

impl FloodPredictor {
    pub fn new(bundle: ArtifactBundle, thresholds: RiskThresholds, missing_value: f64) -> Self {
        Self {
            bundle,
            thresholds,
            missing_value,
        }
    }

    pub fn predict(&self, record: &InputRecord) -> Result<Prediction, ModelError> {
        let row = single_precision(self.bundle.layout.assemble(record, self.missing_value));
        let scaled = single_precision(self.bundle.scaler.transform(&row)?);
        let score = self.bundle.model.predict(&scaled)?;

        tracing::debug!(?row, ?scaled, score, "prediction intermediates");

        if !score.is_finite() {
            return Err(ModelError::NonFinite(score));
        }

        // Classify the displayed percentage so the label never disagrees with it
        let confidence = confidence_percent(score);
        let risk = self.thresholds.classify(confidence / 100.0);

        Ok(Prediction { risk, confidence, score })
    }

    pub fn info(&self) -> ModelInfo {
        let layout = &self.bundle.layout;
        ModelInfo {
            model: self.bundle.model.describe(),
            scaler: self.bundle.scaler_kind,
            feature_count: layout.len(),
            layout_source: layout.source(),
            layout_hash: format!("{:08x}", layout.hash()),
            feature_names: layout.names().to_vec(),
            unmatched_features: layout.unmatched().into_iter().map(str::to_string).collect(),
            thresholds: self.thresholds,
            missing_value: Some(self.missing_value).filter(|v| v.is_finite()),
            artifacts: self.bundle.artifacts.clone(),
            loaded_at: self.bundle.loaded_at,
        }
    }
}

/// Models are fitted on float32 frames; split thresholds only line up at that precision
fn single_precision(mut values: Array1<f64>) -> Array1<f64> {
    values.mapv_inplace(|v| v as f32 as f64);
    values
}

/// Read-only description of the loaded bundle
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model: ModelDescription,
    pub scaler: &'static str,
    pub feature_count: usize,
    pub layout_source: LayoutSource,
    pub layout_hash: String,
    pub feature_names: Vec<String>,
    pub unmatched_features: Vec<String>,
    pub thresholds: RiskThresholds,
    /// `None` when the sentinel is NaN
    pub missing_value: Option<f64>,
    pub artifacts: Vec<ArtifactInfo>,
    pub loaded_at: DateTime<Utc>,
}
