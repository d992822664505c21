// In: src/store/mod.rs

//! The storage seam of the exporter.
//!
//! Every derived table is handed to a [`TableStore`], which persists it and hands
//! back a [`TableRef`]: an opaque payload locator plus the row count and column
//! type description the output object embeds. The bundled stores write the
//! self-describing [`artifact::TableArtifact`] format and address it by the
//! SHA-256 digest of its bytes, so saving identical tables twice is idempotent.

pub mod artifact;
pub mod codec;
pub mod directory;
pub mod memory;

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::types::schema::LOOKUP;
use crate::types::ColumnType;

pub use artifact::TableArtifact;
pub use directory::DirectoryStore;
pub use memory::MemoryStore;

/// Persists a table and returns a reference to it.
///
/// `save` may be called from several rayon workers at once when parallel saves
/// are enabled, hence the `Send + Sync` bound.
pub trait TableStore: Send + Sync {
    fn save(&self, table: &RecordBatch) -> Result<TableRef>;
}

impl<T: TableStore + ?Sized> TableStore for &T {
    fn save(&self, table: &RecordBatch) -> Result<TableRef> {
        (**self).save(table)
    }
}

/// The reference embedded in the output object for one saved table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Payload locator returned by the store.
    pub data: String,
    /// Number of rows.
    pub length: u64,
    #[serde(flatten)]
    pub types: TableTypes,
}

/// Column type description of a saved table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TableTypes {
    /// A `(key int32, value string)` category lookup.
    Lookup {
        keys_data_type: String,
        values_data_type: String,
    },
    /// Any other table. Mixed column types are joined with `/`, e.g. `int32/uint64/uint64`.
    Uniform { width: u64, data_type: String },
}

impl TableTypes {
    /// Describes the columns of `table`.
    pub fn describe(table: &RecordBatch) -> Result<Self> {
        let schema = table.schema();
        let types = schema
            .fields()
            .iter()
            .map(|f| ColumnType::from_arrow_type(f.data_type()))
            .collect::<Result<Vec<_>>>()?;

        let is_lookup = LOOKUP.fields.len() == schema.fields().len()
            && LOOKUP
                .fields
                .iter()
                .zip(schema.fields().iter().zip(&types))
                .all(|((name, ty), (field, actual))| field.name() == name && actual == ty);
        if is_lookup {
            return Ok(Self::Lookup {
                keys_data_type: types[0].wire_name().to_string(),
                values_data_type: types[1].wire_name().to_string(),
            });
        }

        let data_type = match types.split_first() {
            Some((first, rest)) if rest.iter().all(|ty| ty == first) => {
                first.wire_name().to_string()
            }
            _ => types
                .iter()
                .map(ColumnType::wire_name)
                .collect::<Vec<_>>()
                .join("/"),
        };
        Ok(Self::Uniform {
            width: types.len() as u64,
            data_type,
        })
    }
}

impl TableRef {
    /// Builds the reference for `table` stored under `data`.
    pub fn describe(data: impl Into<String>, table: &RecordBatch) -> Result<Self> {
        Ok(Self {
            data: data.into(),
            length: table.num_rows() as u64,
            types: TableTypes::describe(table)?,
        })
    }
}

/// Lower-case hex SHA-256 digest of `bytes`, used as a payload locator.
pub fn content_locator(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::{HOLE_CHUNKS, PATH};
    use arrow::array::{Float64Array, Int32Array, StringArray, UInt64Array};
    use std::sync::Arc;

    #[test]
    fn test_lookup_tables_describe_keys_and_values() {
        let table = RecordBatch::try_new(
            LOOKUP.to_arrow_schema(false),
            vec![
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["A", "B"])),
            ],
        )
        .unwrap();
        let reference = TableRef::describe("abc", &table).unwrap();
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": "abc",
                "length": 2,
                "keys_data_type": "int32",
                "values_data_type": "string",
            })
        );
    }

    #[test]
    fn test_uniform_and_mixed_tables() {
        let path = RecordBatch::try_new(
            PATH.to_arrow_schema(false),
            vec![
                Arc::new(Float64Array::from(vec![0.0])),
                Arc::new(Float64Array::from(vec![0.0])),
                Arc::new(Float64Array::from(vec![90.0])),
            ],
        )
        .unwrap();
        assert_eq!(
            TableTypes::describe(&path).unwrap(),
            TableTypes::Uniform {
                width: 3,
                data_type: "float64".into()
            }
        );

        let chunks = RecordBatch::try_new(
            HOLE_CHUNKS.to_arrow_schema(false),
            vec![
                Arc::new(Int32Array::from(vec![1])),
                Arc::new(UInt64Array::from(vec![0])),
                Arc::new(UInt64Array::from(vec![4])),
            ],
        )
        .unwrap();
        let reference = TableRef::describe("x", &chunks).unwrap();
        assert_eq!(
            reference.types,
            TableTypes::Uniform {
                width: 3,
                data_type: "int32/uint64/uint64".into()
            }
        );
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(
            json,
            r#"{"data":"x","length":1,"width":3,"data_type":"int32/uint64/uint64"}"#
        );
        let back: TableRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);
    }

    #[test]
    fn test_content_locator_is_sha256_hex() {
        assert_eq!(
            content_locator(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
