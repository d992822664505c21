//! This module defines the canonical, type-safe representation of the column
//! types that appear in downhole tables.

use crate::error::DownholeError;
use arrow::datatypes::DataType as ArrowDataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic type of a column in a collar, measurement, or exported table.
///
/// Only the handful of types the geoscience object contract actually uses are
/// representable; anything else coming out of Arrow is rejected.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int32,
    UInt64,
    Float64,
    Utf8,
}

impl ColumnType {
    /// Converts an Arrow `DataType` into a `ColumnType`.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Result<Self, DownholeError> {
        match arrow_type {
            ArrowDataType::Int32 => Ok(Self::Int32),
            ArrowDataType::UInt64 => Ok(Self::UInt64),
            ArrowDataType::Float64 => Ok(Self::Float64),
            ArrowDataType::Utf8 => Ok(Self::Utf8),
            dt => Err(DownholeError::UnsupportedType(format!(
                "Cannot convert Arrow type {:?} to ColumnType",
                dt
            ))),
        }
    }

    /// Converts a `ColumnType` back into an Arrow `DataType`.
    pub fn to_arrow_type(&self) -> ArrowDataType {
        match self {
            Self::Int32 => ArrowDataType::Int32,
            Self::UInt64 => ArrowDataType::UInt64,
            Self::Float64 => ArrowDataType::Float64,
            Self::Utf8 => ArrowDataType::Utf8,
        }
    }

    /// The type tag written into table references (`data_type`, `keys_data_type`, ...).
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::UInt64 => "uint64",
            Self::Float64 => "float64",
            Self::Utf8 => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_conversion_is_symmetric() {
        for ty in [
            ColumnType::Int32,
            ColumnType::UInt64,
            ColumnType::Float64,
            ColumnType::Utf8,
        ] {
            assert_eq!(ColumnType::from_arrow_type(&ty.to_arrow_type()).unwrap(), ty);
        }
    }

    #[test]
    fn test_unsupported_arrow_type_is_rejected() {
        let err = ColumnType::from_arrow_type(&ArrowDataType::Boolean).unwrap_err();
        assert!(matches!(err, DownholeError::UnsupportedType(_)));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(ColumnType::Utf8.to_string(), "string");
        assert_eq!(ColumnType::UInt64.wire_name(), "uint64");
    }
}
