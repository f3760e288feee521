//! Prediction response schema

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FloodRisk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub flood_risk: FloodRisk,
    /// Percentage, 2 decimals
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPredictionResponse {
    #[serde(flatten)]
    pub prediction: PredictionResponse,
    pub resolved_address: Option<String>,
    pub datetime: Option<String>,
}
