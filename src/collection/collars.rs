//! Collar table builder: one strictly-typed row per hole.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::record_batch::RecordBatch;
use hashbrown::HashSet;

use super::identity::ValidatedHole;
use crate::error::{DownholeError, Result};
use crate::types::schema::COLLARS;

/// Converts a 0-based position into the 1-based `hole_index` of that hole.
pub(crate) fn hole_index_at(position: usize) -> Result<i32> {
    i32::try_from(position + 1).map_err(|_| {
        DownholeError::UnsupportedType(format!(
            "hole position {} does not fit an int32 hole_index",
            position
        ))
    })
}

/// Builds the collars table. `hole_index` is the 1-based position of each hole, so
/// the indices are exactly `1..=N` in the order the holes were validated.
pub fn build_collars(holes: &[ValidatedHole]) -> Result<RecordBatch> {
    let mut seen = HashSet::with_capacity(holes.len());
    for hole in holes {
        if !seen.insert(hole.hole_id.as_str()) {
            return Err(DownholeError::DuplicateHoleIdentifier(hole.hole_id.clone()));
        }
    }

    let hole_index = (0..holes.len())
        .map(hole_index_at)
        .collect::<Result<Vec<i32>>>()?;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(hole_index)),
        Arc::new(StringArray::from_iter_values(
            holes.iter().map(|h| h.hole_id.as_str()),
        )),
        Arc::new(Float64Array::from_iter_values(holes.iter().map(|h| h.x))),
        Arc::new(Float64Array::from_iter_values(holes.iter().map(|h| h.y))),
        Arc::new(Float64Array::from_iter_values(holes.iter().map(|h| h.z))),
        Arc::new(Float64Array::from_iter_values(
            holes.iter().map(|h| h.final_depth),
        )),
    ];

    Ok(RecordBatch::try_new(COLLARS.to_arrow_schema(false), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::AsArray;
    use arrow::datatypes::{DataType, Float64Type, Int32Type};

    fn hole(id: &str, x: f64) -> ValidatedHole {
        ValidatedHole {
            hole_id: id.to_string(),
            x,
            y: x + 400.0,
            z: 1.5,
            final_depth: 10.0,
        }
    }

    #[test]
    fn test_hole_index_is_dense_and_one_based() {
        let batch = build_collars(&[hole("C", 1.0), hole("A", 2.0), hole("B", 3.0)]).unwrap();
        let index = batch.column(0).as_primitive::<Int32Type>();
        assert_eq!(index.values().to_vec(), vec![1, 2, 3]);
        let ids = batch.column(1).as_string::<i32>();
        assert_eq!(ids.value(0), "C");
        assert_eq!(ids.value(2), "B");
    }

    #[test]
    fn test_collar_datatypes_are_correct() {
        let batch = build_collars(&[hole("CPT-001", 100000.0)]).unwrap();
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int32);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        for i in 2..6 {
            assert_eq!(schema.field(i).data_type(), &DataType::Float64);
        }
        let y = batch.column_by_name("y").unwrap().as_primitive::<Float64Type>();
        assert_eq!(y.value(0), 100400.0);
    }

    #[test]
    fn test_duplicate_hole_id_is_a_hard_error() {
        let err = build_collars(&[hole("A", 1.0), hole("A", 2.0)]).unwrap_err();
        assert!(matches!(err, DownholeError::DuplicateHoleIdentifier(id) if id == "A"));
    }
}
