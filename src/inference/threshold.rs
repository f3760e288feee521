//! Risk Threshold Configuration
//!
//! Maps the model's probability-like score onto the three risk bands.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::FloodRisk;

pub const DEFAULT_LOW_THRESHOLD: f64 = 0.3;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.7;

/// Band edges: `score < low` is Low, `score >= high` is High
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_order"))]
pub struct RiskThresholds {
    #[validate(range(min = 0.0, max = 1.0))]
    pub low: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub high: f64,
}

fn validate_order(thresholds: &RiskThresholds) -> Result<(), ValidationError> {
    // `range` lets NaN through
    if !thresholds.low.is_finite() || !thresholds.high.is_finite() {
        return Err(ValidationError::new("not_finite"));
    }
    if thresholds.low >= thresholds.high {
        return Err(ValidationError::new("low_not_below_high"));
    }
    Ok(())
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl RiskThresholds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn classify(&self, score: f64) -> FloodRisk {
        if score < self.low {
            FloodRisk::Low
        } else if score < self.high {
            FloodRisk::Medium
        } else {
            FloodRisk::High
        }
    }
}

/// Score as a percentage in [0, 100], rounded to 2 decimals
pub fn confidence_percent(score: f64) -> f64 {
    (score.clamp(0.0, 1.0) * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = RiskThresholds::default();
        assert_eq!(t.low, 0.3);
        assert_eq!(t.high, 0.7);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_band_edges() {
        let t = RiskThresholds::default();
        assert_eq!(t.classify(0.0), FloodRisk::Low);
        assert_eq!(t.classify(0.2999), FloodRisk::Low);
        assert_eq!(t.classify(0.3), FloodRisk::Medium);
        assert_eq!(t.classify(0.6999), FloodRisk::Medium);
        assert_eq!(t.classify(0.7), FloodRisk::High);
        assert_eq!(t.classify(1.3), FloodRisk::High);
        assert_eq!(t.classify(-0.2), FloodRisk::Low);
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(RiskThresholds::new(0.7, 0.3).validate().is_err());
        assert!(RiskThresholds::new(0.5, 0.5).validate().is_err());
        assert!(RiskThresholds::new(-0.1, 0.5).validate().is_err());
        assert!(RiskThresholds::new(0.2, 1.5).validate().is_err());
        assert!(RiskThresholds::new(0.3, f64::NAN).validate().is_err());
        assert!(RiskThresholds::new(f64::NAN, 0.7).validate().is_err());
    }

    #[test]
    fn test_confidence_rounding() {
        assert_eq!(confidence_percent(0.123456), 12.35);
        assert_eq!(confidence_percent(0.7), 70.0);
        assert_eq!(confidence_percent(1.2), 100.0);
        assert_eq!(confidence_percent(-0.01), 0.0);
    }
}
