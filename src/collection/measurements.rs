// In: src/collection/measurements.rs

//! Measurement concatenator.
//!
//! Every hole's row-oriented table is tagged with the hole's synthetic
//! `hole_index` and stacked vertically into a single columnar table. Holes keep
//! their collar order and rows keep their intra-hole order, so the rows of one
//! hole always form a single contiguous run.
//!
//! Holes are not required to carry identical columns. The output carries the
//! union of all columns in first-seen order; a hole lacking a column contributes
//! nulls for it.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, Int32Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use hashbrown::HashMap;

use crate::error::Result;
use crate::input::MeasurementTable;

/// Name of the synthetic foreign key column.
pub const HOLE_INDEX: &str = "hole_index";

/// Concatenates `(hole_index, table)` pairs in the given order.
///
/// A `hole_index` column already present in a source table is dropped and
/// replaced by the synthetic one. With no rows at all the result is an empty
/// table that still carries `hole_index`.
pub fn concatenate<'a, I>(tables: I) -> Result<RecordBatch>
where
    I: IntoIterator<Item = (i32, &'a MeasurementTable)>,
{
    let tables: Vec<(i32, &MeasurementTable)> = tables.into_iter().collect();

    // 1. Resolve the output column order (union, first-seen).
    let mut column_names: Vec<&str> = Vec::new();
    let mut column_slots: HashMap<&str, usize> = HashMap::new();
    for (_, table) in &tables {
        for name in table.columns() {
            if name == HOLE_INDEX || column_slots.contains_key(name.as_str()) {
                continue;
            }
            column_slots.insert(name.as_str(), column_names.len());
            column_names.push(name.as_str());
        }
    }

    let total_rows: usize = tables.iter().map(|(_, t)| t.num_rows()).sum();

    // 2. Fill the builders hole by hole.
    let mut hole_index = Int32Builder::with_capacity(total_rows);
    let mut builders: Vec<Float64Builder> = column_names
        .iter()
        .map(|_| Float64Builder::with_capacity(total_rows))
        .collect();

    for (index, table) in &tables {
        let rows = table.rows();
        hole_index.append_slice(&vec![*index; rows.len()]);

        // Source position feeding each output slot, if this hole has the column.
        let mut sources: Vec<Option<usize>> = vec![None; column_names.len()];
        for (pos, name) in table.columns().iter().enumerate() {
            if let Some(&slot) = column_slots.get(name.as_str()) {
                sources[slot] = Some(pos);
            }
        }

        for (builder, source) in builders.iter_mut().zip(&sources) {
            match source {
                Some(pos) => {
                    for row in rows {
                        builder.append_value(row[*pos]);
                    }
                }
                None => builder.append_nulls(rows.len()),
            }
        }
    }

    // 3. Assemble.
    let mut fields = Vec::with_capacity(column_names.len() + 1);
    fields.push(Field::new(HOLE_INDEX, DataType::Int32, false));
    fields.extend(
        column_names
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, true)),
    );

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.len());
    columns.push(Arc::new(hole_index.finish()));
    columns.extend(
        builders
            .iter_mut()
            .map(|builder| Arc::new(builder.finish()) as ArrayRef),
    );

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::{Float64Type, Int32Type};

    fn table(columns: &[(&str, Vec<f64>)]) -> MeasurementTable {
        MeasurementTable::from_columns(
            columns
                .iter()
                .map(|(name, values)| (name.to_string(), values.clone()))
                .collect(),
        )
        .unwrap()
    }

    fn column_names(batch: &RecordBatch) -> Vec<String> {
        batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    #[test]
    fn test_preserves_original_column_order() {
        let t = table(&[
            ("penetrationLength", vec![0.0, 1.0]),
            ("coneResistance", vec![1.0, 2.0]),
            ("friction", vec![0.01, 0.02]),
        ]);
        let batch = concatenate([(1, &t)]).unwrap();
        assert_eq!(
            column_names(&batch),
            vec!["hole_index", "penetrationLength", "coneResistance", "friction"]
        );
    }

    #[test]
    fn test_rows_are_grouped_by_hole_in_order() {
        let a = table(&[("penetrationLength", vec![0.0, 1.0, 2.0, 3.0])]);
        let b = table(&[("penetrationLength", vec![0.0, 1.5, 3.0])]);
        let batch = concatenate([(1, &a), (2, &b)]).unwrap();

        assert_eq!(batch.num_rows(), 7);
        let index = batch.column(0).as_primitive::<Int32Type>();
        assert_eq!(index.values().to_vec(), vec![1, 1, 1, 1, 2, 2, 2]);
        let depth = batch.column(1).as_primitive::<Float64Type>();
        assert_eq!(depth.value(4), 0.0);
        assert_eq!(depth.value(5), 1.5);
    }

    #[test]
    fn test_no_column_duplication_if_hole_index_exists() {
        let t = table(&[
            ("penetrationLength", vec![0.0, 1.0]),
            ("hole_index", vec![99.0, 99.0]),
            ("coneResistance", vec![1.0, 2.0]),
        ]);
        let batch = concatenate([(1, &t)]).unwrap();
        let names = column_names(&batch);
        assert_eq!(names.iter().filter(|n| *n == "hole_index").count(), 1);
        assert_eq!(names, vec!["hole_index", "penetrationLength", "coneResistance"]);
        let index = batch.column(0).as_primitive::<Int32Type>();
        assert!(index.values().iter().all(|&v| v == 1));
    }

    #[test]
    fn test_heterogeneous_columns_are_unioned_with_nulls() {
        let a = table(&[
            ("penetrationLength", vec![0.0, 1.0]),
            ("coneResistance", vec![1.0, 2.0]),
        ]);
        let b = table(&[
            ("penetrationLength", vec![0.0]),
            ("friction", vec![0.5]),
        ]);
        let batch = concatenate([(1, &a), (2, &b)]).unwrap();
        assert_eq!(
            column_names(&batch),
            vec!["hole_index", "penetrationLength", "coneResistance", "friction"]
        );
        let cone = batch.column(2).as_primitive::<Float64Type>();
        assert!(cone.is_valid(1));
        assert!(cone.is_null(2));
        let friction = batch.column(3).as_primitive::<Float64Type>();
        assert_eq!(friction.null_count(), 2);
        assert_eq!(friction.value(2), 0.5);
    }

    #[test]
    fn test_no_rows_still_has_hole_index() {
        let empty = MeasurementTable::default();
        let batch = concatenate([(1, &empty)]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(column_names(&batch), vec!["hole_index"]);
    }
}
