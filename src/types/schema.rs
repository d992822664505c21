//! Explicit schema descriptors for the fixed-shape tables of a collection.
//!
//! A descriptor is an ordered list of `(name, ColumnType)` pairs. It is used both
//! to build the Arrow schema a table is created with and to check, statically, that
//! a concrete table conforms to the shape downstream consumers expect.

use std::sync::Arc;

use arrow::datatypes::{Field, Schema, SchemaRef};

use super::ColumnType;

/// An ordered, named list of column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub fields: &'static [(&'static str, ColumnType)],
}

/// Collars: one row per hole.
pub const COLLARS: SchemaDescriptor = SchemaDescriptor {
    fields: &[
        ("hole_index", ColumnType::Int32),
        ("hole_id", ColumnType::Utf8),
        ("x", ColumnType::Float64),
        ("y", ColumnType::Float64),
        ("z", ColumnType::Float64),
        ("final_depth", ColumnType::Float64),
    ],
};

/// `(x, y, z)` per hole.
pub const COORDINATES: SchemaDescriptor = SchemaDescriptor {
    fields: &[
        ("x", ColumnType::Float64),
        ("y", ColumnType::Float64),
        ("z", ColumnType::Float64),
    ],
};

/// `(final, target, current)` per hole.
pub const DISTANCES: SchemaDescriptor = SchemaDescriptor {
    fields: &[
        ("final", ColumnType::Float64),
        ("target", ColumnType::Float64),
        ("current", ColumnType::Float64),
    ],
};

/// Hole chunk index records.
pub const HOLE_CHUNKS: SchemaDescriptor = SchemaDescriptor {
    fields: &[
        ("hole_index", ColumnType::Int32),
        ("offset", ColumnType::UInt64),
        ("count", ColumnType::UInt64),
    ],
};

/// Key/value half of a category lookup.
pub const LOOKUP: SchemaDescriptor = SchemaDescriptor {
    fields: &[("key", ColumnType::Int32), ("value", ColumnType::Utf8)],
};

/// Values half of a category lookup.
pub const INTEGER_ARRAY: SchemaDescriptor = SchemaDescriptor {
    fields: &[("data", ColumnType::Int32)],
};

/// Downhole direction vectors.
pub const PATH: SchemaDescriptor = SchemaDescriptor {
    fields: &[
        ("distance", ColumnType::Float64),
        ("azimuth", ColumnType::Float64),
        ("dip", ColumnType::Float64),
    ],
};

/// Distance values of a distance-table collection.
pub const DISTANCE_VALUES: SchemaDescriptor = SchemaDescriptor {
    fields: &[("values", ColumnType::Float64)],
};

/// A single continuous attribute.
pub const ATTRIBUTE: SchemaDescriptor = SchemaDescriptor {
    fields: &[("data", ColumnType::Float64)],
};

impl SchemaDescriptor {
    /// Builds the Arrow schema described by this descriptor, every field sharing `nullable`.
    pub fn to_arrow_schema(&self, nullable: bool) -> SchemaRef {
        let fields: Vec<Field> = self
            .fields
            .iter()
            .map(|(name, ty)| Field::new(*name, ty.to_arrow_type(), nullable))
            .collect();
        Arc::new(Schema::new(fields))
    }

    /// Returns `true` iff `schema` has exactly this descriptor's column set with the
    /// declared types. Column order is not significant; extra or missing columns are.
    pub fn conforms(&self, schema: &Schema) -> bool {
        if schema.fields().len() != self.fields.len() {
            return false;
        }
        self.fields.iter().all(|(name, ty)| {
            schema
                .field_with_name(name)
                .ok()
                .and_then(|field| ColumnType::from_arrow_type(field.data_type()).ok())
                == Some(*ty)
        })
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(name, _)| *name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;

    #[test]
    fn test_descriptor_conforms_to_its_own_schema() {
        for descriptor in [COLLARS, COORDINATES, HOLE_CHUNKS, LOOKUP, PATH] {
            assert!(descriptor.conforms(&descriptor.to_arrow_schema(false)));
        }
    }

    #[test]
    fn test_column_order_is_not_significant() {
        let schema = Schema::new(vec![
            Field::new("z", DataType::Float64, false),
            Field::new("x", DataType::Float64, false),
            Field::new("y", DataType::Float64, false),
        ]);
        assert!(COORDINATES.conforms(&schema));
    }

    #[test]
    fn test_wrong_type_or_extra_column_fails() {
        let wrong_type = Schema::new(vec![
            Field::new("x", DataType::Float64, false),
            Field::new("y", DataType::Float64, false),
            Field::new("z", DataType::Int32, false),
        ]);
        assert!(!COORDINATES.conforms(&wrong_type));

        let extra = Schema::new(vec![
            Field::new("x", DataType::Float64, false),
            Field::new("y", DataType::Float64, false),
            Field::new("z", DataType::Float64, false),
            Field::new("w", DataType::Float64, false),
        ]);
        assert!(!COORDINATES.conforms(&extra));
    }
}
