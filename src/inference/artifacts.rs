//! Artifact Loader - one-shot startup load of scaler, model and layout
//!
//! Everything here runs before the listener binds. Any failure is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::ModelError;
use super::layout::{FeatureLayout, LayoutSource};
use super::regressor::{parse_model, Regressor};
use super::scaler::{FeatureScaler, Scaler, ScalerArtifact};

/// Artifact locations on disk
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub model: PathBuf,
    pub feature_names: Option<PathBuf>,
}

/// File fingerprint recorded at load time
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub role: &'static str,
    pub path: String,
    pub bytes: usize,
    pub sha256: String,
}

/// Process-wide, read-only model state
pub struct ArtifactBundle {
    pub scaler: Box<dyn FeatureScaler>,
    pub scaler_kind: &'static str,
    pub model: Box<dyn Regressor>,
    pub layout: FeatureLayout,
    pub artifacts: Vec<ArtifactInfo>,
    pub loaded_at: DateTime<Utc>,
}

impl std::fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("scaler_kind", &self.scaler_kind)
            .field("model", &self.model.describe())
            .field("layout", &self.layout)
            .field("artifacts", &self.artifacts)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

impl ArtifactBundle {
    /// Assemble a bundle from in-memory parts, checking widths agree
    pub fn new(scaler: Scaler, model: Box<dyn Regressor>, layout: FeatureLayout) -> Result<Self, ModelError> {
        check_widths(&scaler, model.as_ref(), &layout)?;

        Ok(Self {
            scaler_kind: scaler.kind(),
            scaler: Box::new(scaler),
            model,
            layout,
            artifacts: Vec::new(),
            loaded_at: Utc::now(),
        })
    }

    /// Load every artifact from disk
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ModelError> {
        let mut artifacts = Vec::with_capacity(3);

        let (bytes, info) = read_artifact("scaler", &paths.scaler)?;
        artifacts.push(info);
        let scaler_artifact: ScalerArtifact = serde_json::from_slice(&bytes)
            .map_err(|source| ModelError::Malformed { path: paths.scaler.clone(), source })?;
        let scaler_names = scaler_artifact.feature_names_in.clone();
        let scaler = Scaler::try_from(scaler_artifact)?;
        tracing::info!("Scaler loaded: {} ({} features)", scaler.kind(), scaler.n_features());

        let (bytes, info) = read_artifact("model", &paths.model)?;
        artifacts.push(info);
        let model = parse_model(&bytes, &paths.model)?;
        let description = model.describe();
        tracing::info!("Model loaded: {} / {}", description.kind, description.objective);

        let layout = match &paths.feature_names {
            Some(path) => {
                let (bytes, info) = read_artifact("feature_names", path)?;
                artifacts.push(info);
                let names: Vec<String> = serde_json::from_slice(&bytes)
                    .map_err(|source| ModelError::Malformed { path: path.clone(), source })?;
                FeatureLayout::from_names(names, LayoutSource::FeatureNamesFile)
            }
            None => match (scaler_names, model.feature_names()) {
                (Some(names), _) => FeatureLayout::from_names(names, LayoutSource::Scaler),
                (None, Some(names)) => FeatureLayout::from_names(names.to_vec(), LayoutSource::Model),
                (None, None) => FeatureLayout::canonical(),
            },
        };

        if layout.is_empty() {
            return Err(ModelError::Invalid("feature layout is empty".to_string()));
        }
        for name in layout.unmatched() {
            tracing::warn!("Feature `{}` has no request field; it will use the missing-value sentinel", name);
        }
        tracing::info!(
            "Feature layout: {:?}, {} columns, hash {:08x}",
            layout.source(),
            layout.len(),
            layout.hash()
        );

        let mut bundle = Self::new(scaler, model, layout)?;
        bundle.artifacts = artifacts;
        Ok(bundle)
    }
}

fn check_widths(scaler: &Scaler, model: &dyn Regressor, layout: &FeatureLayout) -> Result<(), ModelError> {
    if layout.len() != scaler.n_features() {
        return Err(ModelError::ShapeMismatch {
            stage: "scaler",
            expected: scaler.n_features(),
            actual: layout.len(),
        });
    }
    let required = model.required_features();
    if required > scaler.n_features() {
        return Err(ModelError::ShapeMismatch {
            stage: "model splits",
            expected: required,
            actual: scaler.n_features(),
        });
    }
    if let Some(expected) = model.n_features() {
        if expected != scaler.n_features() {
            return Err(ModelError::ShapeMismatch {
                stage: "model",
                expected,
                actual: scaler.n_features(),
            });
        }
    }
    Ok(())
}

fn read_artifact(role: &'static str, path: &Path) -> Result<(Vec<u8>, ArtifactInfo), ModelError> {
    if !path.exists() {
        return Err(ModelError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|source| ModelError::Io { path: path.to_path_buf(), source })?;
    let info = ArtifactInfo {
        role,
        path: path.display().to_string(),
        bytes: bytes.len(),
        sha256: hex::encode(Sha256::digest(&bytes)),
    };
    tracing::debug!("Read {} artifact {} ({} bytes)", role, info.path, info.bytes);

    Ok((bytes, info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::layout::{FEATURE_COUNT, FEATURE_LAYOUT};
    use crate::inference::linear::LinearModel;
    use crate::inference::regressor::Link;
    use crate::inference::{FloodPredictor, RiskThresholds};
    use crate::models::{FloodRisk, InputRecord};
    use serde_json::json;
    use tempfile::tempdir;

    fn write_json(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();
        path
    }

    fn scaler_json(width: usize) -> serde_json::Value {
        json!({ "kind": "standard", "mean": vec![0.0; width], "scale": vec![1.0; width] })
    }

    /// One-tree `binary:logistic` booster: feature `split` < 80 gives -1.0, else 1.0
    fn xgboost_json(feature_names: &[&str], split: usize, num_feature: usize) -> serde_json::Value {
        json!({
            "learner": {
                "feature_names": feature_names,
                "gradient_booster": {
                    "name": "gbtree",
                    "model": {
                        "tree_info": [0],
                        "trees": [{
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [split, 0, 0],
                            "split_conditions": [80.0, -1.0, 1.0],
                            "default_left": [1, 0, 0]
                        }]
                    }
                },
                "learner_model_param": {
                    "base_score": "5E-1",
                    "num_class": "0",
                    "num_feature": num_feature.to_string(),
                    "num_target": "1"
                },
                "objective": { "name": "binary:logistic" }
            },
            "version": [2, 1, 0]
        })
    }

    fn linear_json(width: usize) -> serde_json::Value {
        json!({ "kind": "linear", "intercept": 0.2, "coefficients": vec![0.01; width], "link": "identity" })
    }

    #[test]
    fn test_load_canonical_bundle() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths {
            scaler: write_json(dir.path(), "scaler.json", scaler_json(FEATURE_COUNT)),
            model: write_json(dir.path(), "model.json", linear_json(FEATURE_COUNT)),
            feature_names: None,
        };

        let bundle = ArtifactBundle::load(&paths).unwrap();
        assert_eq!(bundle.layout.source(), LayoutSource::Canonical);
        assert_eq!(bundle.layout.len(), FEATURE_COUNT);
        assert_eq!(bundle.artifacts.len(), 2);
        assert_eq!(bundle.artifacts[0].role, "scaler");
        assert_eq!(bundle.artifacts[0].sha256.len(), 64);
    }

    #[test]
    fn test_feature_names_file_wins() {
        let dir = tempdir().unwrap();
        let mut names: Vec<&str> = FEATURE_LAYOUT.to_vec();
        names.swap(0, 1);
        let mut scaler = scaler_json(FEATURE_COUNT);
        scaler["feature_names_in_"] = json!(FEATURE_LAYOUT);

        let paths = ArtifactPaths {
            scaler: write_json(dir.path(), "scaler.json", scaler),
            model: write_json(dir.path(), "model.json", linear_json(FEATURE_COUNT)),
            feature_names: Some(write_json(dir.path(), "names.json", json!(names))),
        };

        let bundle = ArtifactBundle::load(&paths).unwrap();
        assert_eq!(bundle.layout.source(), LayoutSource::FeatureNamesFile);
        assert_eq!(bundle.layout.names()[0], "longitude");
        assert_eq!(bundle.artifacts.len(), 3);
    }

    #[test]
    fn test_scaler_names_used_without_file() {
        let dir = tempdir().unwrap();
        let mut scaler = scaler_json(3);
        scaler["feature_names_in_"] = json!(["humidity", "precipitation", "river_level"]);

        let paths = ArtifactPaths {
            scaler: write_json(dir.path(), "scaler.json", scaler),
            model: write_json(dir.path(), "model.json", linear_json(3)),
            feature_names: None,
        };

        let bundle = ArtifactBundle::load(&paths).unwrap();
        assert_eq!(bundle.layout.source(), LayoutSource::Scaler);
        assert_eq!(bundle.layout.unmatched(), vec!["river_level"]);
    }

    #[test]
    fn test_booster_names_used_without_file() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths {
            scaler: write_json(dir.path(), "scaler.json", scaler_json(2)),
            model: write_json(dir.path(), "model.json", xgboost_json(&["humidity", "precipitation"], 0, 2)),
            feature_names: None,
        };

        let bundle = ArtifactBundle::load(&paths).unwrap();
        assert_eq!(bundle.layout.source(), LayoutSource::Model);
        assert_eq!(bundle.layout.names(), &["humidity".to_string(), "precipitation".to_string()]);
        assert_eq!(bundle.model.describe().kind, "xgboost");

        // Slot 0 holds humidity even though the request lists precipitation first
        let predictor = FloodPredictor::new(bundle, RiskThresholds::default(), 0.0);
        let mut values = [0.0; FEATURE_COUNT];
        values[2] = 95.0;
        values[3] = 40.0;
        let dry = predictor.predict(&InputRecord::from_array(values)).unwrap();
        assert_eq!(dry.risk, FloodRisk::Low);
        assert!((dry.score - 1.0 / (1.0 + 1f64.exp())).abs() < 1e-9);

        values[3] = 95.0;
        let wet = predictor.predict(&InputRecord::from_array(values)).unwrap();
        assert_eq!(wet.risk, FloodRisk::High);
    }

    #[test]
    fn test_split_past_scaler_width_fails_at_load() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths {
            scaler: write_json(dir.path(), "scaler.json", scaler_json(2)),
            model: write_json(dir.path(), "model.json", xgboost_json(&["humidity", "precipitation"], 4, 0)),
            feature_names: None,
        };

        let err = ArtifactBundle::load(&paths).unwrap_err();
        assert!(matches!(
            err,
            ModelError::ShapeMismatch { stage: "model splits", expected: 5, actual: 2 }
        ));
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths {
            scaler: dir.path().join("scaler.json"),
            model: write_json(dir.path(), "model.json", linear_json(FEATURE_COUNT)),
            feature_names: None,
        };

        let err = ArtifactBundle::load(&paths).unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn test_malformed_artifact() {
        let dir = tempdir().unwrap();
        let scaler = dir.path().join("scaler.pkl");
        fs::write(&scaler, b"\x80\x04\x95 not json").unwrap();
        let paths = ArtifactPaths {
            scaler,
            model: write_json(dir.path(), "model.json", linear_json(FEATURE_COUNT)),
            feature_names: None,
        };

        let err = ArtifactBundle::load(&paths).unwrap_err();
        assert!(matches!(err, ModelError::Malformed { .. }));
    }

    #[test]
    fn test_width_disagreement_fails_at_load() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths {
            scaler: write_json(dir.path(), "scaler.json", scaler_json(FEATURE_COUNT)),
            model: write_json(dir.path(), "model.json", linear_json(FEATURE_COUNT - 1)),
            feature_names: None,
        };

        let err = ArtifactBundle::load(&paths).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { stage: "model", .. }));
    }

    #[test]
    fn test_layout_must_match_scaler() {
        let model = LinearModel::new(0.0, vec![1.0; 4], Link::Identity);
        let err = ArtifactBundle::new(Scaler::identity(4), Box::new(model), FeatureLayout::canonical())
            .unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { stage: "scaler", expected: 4, actual: 20 }));
    }
}
