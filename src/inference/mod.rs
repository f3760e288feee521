//! Inference Module - scaler, model and risk classification
//!
//! The endpoint only talks to `FloodPredictor`; the scaler and model sit
//! behind `FeatureScaler` and `Regressor` so the model technology can change
//! without touching the handlers.

pub mod artifacts;
pub mod booster;
pub mod engine;
pub mod error;
pub mod layout;
pub mod linear;
pub mod regressor;
pub mod scaler;
pub mod threshold;

// Re-export common types
pub use artifacts::{ArtifactBundle, ArtifactPaths};
pub use engine::{FloodPredictor, ModelInfo, Prediction};
pub use error::ModelError;
pub use threshold::RiskThresholds;
