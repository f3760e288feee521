//! Feature Layout - Column order presented to the scaler
//!
//! The scaler and model were fitted on a fixed column order. Request fields
//! are bound by name, so the layout is the only place where order is decided.
//!
//! ## Sources (highest precedence first)
//! 1. Stored feature-name list (`FEATURE_NAMES_PATH`)
//! 2. Scaler `feature_names_in`
//! 3. Model `feature_names`
//! 4. Canonical order below

use crc32fast::Hasher;
use ndarray::Array1;
use serde::Serialize;

use crate::models::InputRecord;

// ============================================================================
// CANONICAL LAYOUT
// ============================================================================

/// Request field names in training column order
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Location (0-1) ===
    "latitude",
    "longitude",

    // === Weather (2-8) ===
    "precipitation",
    "humidity",
    "temperature",
    "windSpeed",
    "pressure",
    "cloudCover",
    "visibility",

    // === Risk / solar (9-13) ===
    "severerisk",
    "solarradiation",
    "solarenergy",
    "uvindex",
    "moonphase",

    // === Snow / rain (14-17) ===
    "snowdepth",
    "snow",
    "precipprob",
    "winddir",

    // === Terrain (18-19) ===
    "elevation",
    "soilMoisture",
];

/// Number of request fields
pub const FEATURE_COUNT: usize = 20;

/// Where the active layout came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSource {
    Canonical,
    FeatureNamesFile,
    Scaler,
    Model,
}

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

/// Ordered column names plus, for each slot, the request field feeding it.
#[derive(Debug, Clone)]
pub struct FeatureLayout {
    names: Vec<String>,
    /// Index into `FEATURE_LAYOUT` per slot; `None` = filled with sentinel
    slots: Vec<Option<usize>>,
    source: LayoutSource,
}

impl FeatureLayout {
    /// Canonical 20-column layout
    pub fn canonical() -> Self {
        Self {
            names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            slots: (0..FEATURE_COUNT).map(Some).collect(),
            source: LayoutSource::Canonical,
        }
    }

    /// Layout re-aligned against a stored name list
    pub fn from_names(names: Vec<String>, source: LayoutSource) -> Self {
        let slots = names.iter().map(|n| feature_index(n)).collect();
        Self { names, slots, source }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn source(&self) -> LayoutSource {
        self.source
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names with no matching request field
    pub fn unmatched(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Build one feature row; unmatched slots get `missing_value`
    pub fn assemble(&self, record: &InputRecord, missing_value: f64) -> Array1<f64> {
        let values = record.to_array();
        self.slots
            .iter()
            .map(|slot| slot.map(|i| values[i]).unwrap_or(missing_value))
            .collect()
    }

    /// CRC32 over the ordered names, for comparing deployments
    pub fn hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        for name in &self.names {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize()
    }
}

/// Get request field index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential_record() -> InputRecord {
        let mut values = [0.0; FEATURE_COUNT];
        for (i, v) in values.iter_mut().enumerate() {
            *v = i as f64;
        }
        InputRecord::from_array(values)
    }

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_canonical_assemble_keeps_order() {
        let row = FeatureLayout::canonical().assemble(&sequential_record(), f64::NAN);
        assert_eq!(row.len(), FEATURE_COUNT);
        for (i, v) in row.iter().enumerate() {
            assert_eq!(*v, i as f64);
        }
    }

    #[test]
    fn test_reindex_follows_stored_order() {
        let names = vec!["soilMoisture".to_string(), "latitude".to_string(), "humidity".to_string()];
        let layout = FeatureLayout::from_names(names, LayoutSource::FeatureNamesFile);

        let row = layout.assemble(&sequential_record(), -1.0);
        assert_eq!(row.to_vec(), vec![19.0, 0.0, 3.0]);
        assert!(layout.unmatched().is_empty());
    }

    #[test]
    fn test_reindex_fills_unknown_with_sentinel() {
        let mut names: Vec<String> = FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect();
        names[5] = "wind_gust".to_string();
        let layout = FeatureLayout::from_names(names, LayoutSource::FeatureNamesFile);

        let row = layout.assemble(&sequential_record(), -999.0);
        assert_eq!(row[5], -999.0);
        assert_eq!(row[6], 6.0);
        assert_eq!(layout.unmatched(), vec!["wind_gust"]);
    }

    #[test]
    fn test_layout_hash_depends_on_order() {
        let canonical = FeatureLayout::canonical();
        let mut reversed: Vec<String> = FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect();
        reversed.reverse();
        let reversed = FeatureLayout::from_names(reversed, LayoutSource::Scaler);

        assert_eq!(canonical.hash(), FeatureLayout::canonical().hash());
        assert_ne!(canonical.hash(), reversed.hash());
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("latitude"), Some(0));
        assert_eq!(feature_index("windSpeed"), Some(5));
        assert_eq!(feature_index("soilMoisture"), Some(19));
        assert_eq!(feature_index("wind_speed"), None);
    }
}
