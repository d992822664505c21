// In: src/config.rs

//! The single source of truth for all conversion configuration.
//!
//! `ConversionConfig` is created once at the application boundary (e.g., from a
//! user's JSON file) and then passed down read-only through identity validation,
//! collection assembly, export and storage.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DownholeError, Result};

//==================================================================================
// I. Core Configuration Enums & Structs
//==================================================================================

/// How a reported final depth of exactly `0.0` is interpreted.
///
/// Upstream CPT parsers report `0.0` both for "not supplied" and for a genuinely
/// zero depth, so the two cannot be told apart from the value alone.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDepthPolicy {
    /// **Default:** `0.0` means "not supplied"; the depth is derived from the
    /// maximum `penetrationLength` instead.
    #[default]
    TreatAsAbsent,

    /// `0.0` is kept as a literal final depth.
    Keep,
}

/// Settings for the columnar export stage.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ExportConfig {
    /// If true, the independent `save` calls are issued on a rayon pool.
    /// The store must tolerate concurrent use.
    #[serde(default)]
    pub parallel_saves: bool,

    /// Sentinel values declared as "not a number" for every attribute.
    #[serde(default)]
    pub default_nan_values: Vec<f64>,

    /// Per-attribute sentinel values, keyed by measurement column name.
    /// Overrides `default_nan_values` for the named attribute.
    #[serde(default)]
    pub nan_values: BTreeMap<String, Vec<f64>>,
}

impl ExportConfig {
    /// The sentinel list declared for `attribute`.
    pub fn nan_values_for(&self, attribute: &str) -> Vec<f64> {
        self.nan_values
            .get(attribute)
            .cloned()
            .unwrap_or_else(|| self.default_nan_values.clone())
    }
}

/// Settings for the bundled table stores.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Zstd level applied to every table artifact payload.
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
        }
    }
}

//==================================================================================
// II. The Unified ConversionConfig
//==================================================================================

/// The single, unified configuration for a conversion run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ConversionConfig {
    /// Unit tag written for every distance in the output object.
    #[serde(default = "default_distance_unit")]
    pub distance_unit: String,

    #[serde(default)]
    pub zero_final_depth: ZeroDepthPolicy,

    /// Overrides the `<first>...<last>` collection name derived from the hole ids.
    #[serde(default)]
    pub collection_name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// User tags, merged over the provenance tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Recorded in the `InputType` provenance tag.
    #[serde(default = "default_input_type")]
    pub input_type: String,

    /// Measurement columns every hole must carry when it is added to a batch.
    #[serde(default = "default_required_columns")]
    pub required_columns: Vec<String>,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            distance_unit: default_distance_unit(),
            zero_final_depth: ZeroDepthPolicy::default(),
            collection_name: None,
            description: None,
            tags: BTreeMap::new(),
            input_type: default_input_type(),
            required_columns: default_required_columns(),
            export: ExportConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ConversionConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.distance_unit.trim().is_empty() {
            return Err(DownholeError::Config(
                "distance_unit must not be empty".to_string(),
            ));
        }
        if !(1..=22).contains(&self.store.compression_level) {
            return Err(DownholeError::Config(format!(
                "store.compression_level must be within 1..=22, got {}",
                self.store.compression_level
            )));
        }
        if let Some(name) = &self.collection_name {
            if name.trim().is_empty() {
                return Err(DownholeError::Config(
                    "collection_name must not be blank when set".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn default_distance_unit() -> String {
    "m".to_string()
}

fn default_input_type() -> String {
    "GEF-CPT".to_string()
}

fn default_required_columns() -> Vec<String> {
    vec!["penetrationLength".to_string(), "coneResistance".to_string()]
}

fn default_compression_level() -> i32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = ConversionConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ConversionConfig::default());
        assert_eq!(config.distance_unit, "m");
        assert_eq!(config.zero_final_depth, ZeroDepthPolicy::TreatAsAbsent);
        assert_eq!(config.store.compression_level, 3);
        assert!(!config.export.parallel_saves);
    }

    #[test]
    fn test_nested_sections_parse() {
        let json = r#"{
            "zero_final_depth": "keep",
            "tags": {"Project": "Delft"},
            "export": {
                "parallel_saves": true,
                "default_nan_values": [-9999.0],
                "nan_values": {"friction": [-1.0]}
            },
            "store": {"compression_level": 9}
        }"#;
        let config = ConversionConfig::from_json_str(json).unwrap();
        assert_eq!(config.zero_final_depth, ZeroDepthPolicy::Keep);
        assert_eq!(config.tags["Project"], "Delft");
        assert!(config.export.parallel_saves);
        assert_eq!(config.export.nan_values_for("friction"), vec![-1.0]);
        assert_eq!(config.export.nan_values_for("coneResistance"), vec![-9999.0]);
        assert_eq!(config.store.compression_level, 9);
    }

    #[test]
    fn test_invalid_compression_level_is_rejected() {
        let err = ConversionConfig::from_json_str(r#"{"store": {"compression_level": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, DownholeError::Config(_)));
    }

    #[test]
    fn test_blank_distance_unit_is_rejected() {
        let err = ConversionConfig::from_json_str(r#"{"distance_unit": " "}"#).unwrap_err();
        assert!(err.to_string().contains("distance_unit"));
    }
}
