// In: src/error.rs

//! This module defines the single, unified error type for the entire downhole library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Hole-level validation variants carry the identifier of the offending hole.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownholeError {
    // =========================================================================
    // === Batch & Hole Validation Errors
    // =========================================================================
    #[error("No CPT holes provided: a collection must contain at least one hole")]
    EmptyBatch,

    #[error("Duplicate ID '{0}' encountered. Each hole ID must be unique across all input files")]
    DuplicateHoleIdentifier(String),

    #[error("CPT missing required identifier 'bro_id' / 'alias'")]
    MissingIdentifier,

    #[error("Hole '{hole_id}' is missing required columns: {missing:?}")]
    MissingRequiredColumns { hole_id: String, missing: Vec<String> },

    #[error("Measurement column '{0}' appears more than once in the header")]
    DuplicateMeasurementColumn(String),

    #[error("Measurement row {row} has {found} values, expected {expected}")]
    RaggedMeasurementRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Hole '{hole_id}' has an invalid spatial reference: {reason}")]
    InvalidSpatialReference { hole_id: String, reason: String },

    #[error("Inconsistent EPSG codes: hole '{hole_id}' uses {found}, collection uses {expected}")]
    InconsistentSpatialReference {
        hole_id: String,
        expected: i32,
        found: i32,
    },

    #[error("Hole '{hole_id}' is missing required location attribute '{axis}'")]
    MissingLocation { hole_id: String, axis: &'static str },

    #[error("Hole '{hole_id}' has no final depth and is missing 'penetrationLength' column")]
    MissingPrimaryAxis { hole_id: String },

    #[error("Hole '{hole_id}' has no final depth and an empty penetrationLength column")]
    EmptyPrimaryAxis { hole_id: String },

    // =========================================================================
    // === Collection & Export Errors
    // =========================================================================
    #[error("Measurement layout '{0}' cannot be exported as a distance table")]
    UnsupportedLayout(String),

    #[error("Measurements for hole_index {0} are not contiguous")]
    NonContiguousMeasurements(i32),

    #[error("Measurement row references hole_index {0} which has no collar")]
    UnknownHoleIndex(i32),

    #[error("Cannot compute a bounding box over an empty collar table")]
    EmptyCollars,

    #[error("Collar column '{column}' holds a non-finite value at row {row}")]
    NonFiniteCoordinate { column: &'static str, row: usize },

    #[error("Unsupported data type for this operation: {0}")]
    UnsupportedType(String),

    #[error("Column '{0}' is missing from the table")]
    MissingColumn(String),

    // =========================================================================
    // === Storage & Configuration Errors
    // =========================================================================
    #[error("Table artifact serialization/deserialization failed: {0}")]
    ArtifactFormat(String),

    #[error("Zstd operation failed: {0}")]
    Zstd(String),

    #[error("No table stored under '{0}'")]
    MissingTable(String),

    #[error("Table store lock poisoned")]
    LockPoisoned,

    #[error("Invalid configuration: {0}")]
    Config(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically during config or object serialization.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DownholeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_hole() {
        let err = DownholeError::InconsistentSpatialReference {
            hole_id: "CPT-002".to_string(),
            expected: 28992,
            found: 4326,
        };
        let msg = err.to_string();
        assert!(msg.contains("Inconsistent EPSG codes"));
        assert!(msg.contains("CPT-002"));
        assert!(msg.contains("28992"));
        assert!(msg.contains("4326"));

        let err = DownholeError::MissingLocation {
            hole_id: "TEST-001".to_string(),
            axis: "x",
        };
        assert_eq!(
            err.to_string(),
            "Hole 'TEST-001' is missing required location attribute 'x'"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DownholeError = io.into();
        assert!(matches!(err, DownholeError::Io(_)));
    }
}
