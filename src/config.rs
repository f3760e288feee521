//! Configuration module

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderValue;
use validator::Validate;

use crate::inference::threshold::{DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD};
use crate::inference::{ArtifactPaths, RiskThresholds};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}: cannot parse `{value}`")]
    Parse { key: &'static str, value: String },

    #[error("invalid risk thresholds: {0}")]
    Thresholds(#[from] validator::ValidationErrors),

    #[error("invalid CORS origin `{0}`")]
    Origin(String),
}

/// Cross-origin policy
#[derive(Debug, Clone, PartialEq)]
pub enum CorsPolicy {
    /// Every origin accepted
    Any,
    /// Only these origins, with credentials
    AllowList(Vec<HeaderValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Scaler / model / feature-name files
    pub artifacts: ArtifactPaths,

    /// Risk band edges
    pub thresholds: RiskThresholds,

    /// Value for layout slots with no request field
    pub missing_value: f64,

    pub cors: CorsPolicy,

    /// Environment (development, production)
    pub environment: String,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let thresholds = RiskThresholds::new(
            parse_or(&get, "RISK_LOW_THRESHOLD", DEFAULT_LOW_THRESHOLD)?,
            parse_or(&get, "RISK_HIGH_THRESHOLD", DEFAULT_HIGH_THRESHOLD)?,
        );
        thresholds.validate()?;

        let cors = match get("CORS_ALLOWED_ORIGINS") {
            None => CorsPolicy::Any,
            Some(raw) if raw == "*" => CorsPolicy::Any,
            Some(raw) => {
                let origins = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(|o| HeaderValue::from_str(o).map_err(|_| ConfigError::Origin(o.to_string())))
                    .collect::<Result<Vec<_>, _>>()?;
                CorsPolicy::AllowList(origins)
            }
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: parse_or(&get, "HOST", IpAddr::from([0, 0, 0, 0]))?,

            port: parse_or(&get, "PORT", 8000)?,

            artifacts: ArtifactPaths {
                scaler: get("SCALER_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("artifacts/scaler.json")),
                model: get("MODEL_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("artifacts/model.json")),
                feature_names: get("FEATURE_NAMES_PATH").map(PathBuf::from),
            },

            thresholds,

            // Accepts `nan`
            missing_value: parse_or(&get, "MISSING_VALUE", 0.0)?,

            cors,

            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),

            log_format,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::Parse { key, value }),
        None => Ok(default),
    }
}
