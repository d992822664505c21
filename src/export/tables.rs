// In: src/export/tables.rs

//! Pure table derivation over an immutable collection.
//!
//! Nothing here touches a store: each function reads the collar or measurement
//! table and returns a freshly built `RecordBatch` in one of the fixed shapes of
//! `types::schema`. Per-hole tables follow collar order; per-reading tables follow
//! measurement row order.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int32Array, UInt64Array};
use arrow::datatypes::{Float64Type, Int32Type};
use arrow::record_batch::RecordBatch;
use hashbrown::{HashMap, HashSet};

use crate::collection::{DownholeCollection, MeasurementLayout, HOLE_INDEX};
use crate::error::{DownholeError, Result};
use crate::types::schema::{
    ATTRIBUTE, COORDINATES, DISTANCES, DISTANCE_VALUES, HOLE_CHUNKS, INTEGER_ARRAY, LOOKUP, PATH,
};

/// Holes are assumed vertical.
pub const AZIMUTH: f64 = 0.0;
/// Positive dip points down.
pub const DIP: f64 = 90.0;

/// Where one hole's readings sit in the concatenated measurement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleChunk {
    pub hole_index: i32,
    pub offset: u64,
    pub count: u64,
}

//==================================================================================
// Column access helpers
//==================================================================================

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| DownholeError::MissingColumn(name.to_string()))?;
    column.as_primitive_opt::<Float64Type>().ok_or_else(|| {
        DownholeError::UnsupportedType(format!(
            "column '{}' is {:?}, expected Float64",
            name,
            column.data_type()
        ))
    })
}

fn int32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| DownholeError::MissingColumn(name.to_string()))?;
    column.as_primitive_opt::<Int32Type>().ok_or_else(|| {
        DownholeError::UnsupportedType(format!(
            "column '{}' is {:?}, expected Int32",
            name,
            column.data_type()
        ))
    })
}

/// The primary distance axis of the measurement table (column 2).
///
/// An empty measurement table yields an empty axis whatever its columns; any other
/// table must be in distance layout.
pub fn primary_axis(collection: &DownholeCollection) -> Result<Float64Array> {
    let measurements = collection.measurements();
    if measurements.num_rows() == 0 {
        return Ok(Float64Array::from(Vec::<f64>::new()));
    }
    let layout = collection.measurement_layout();
    if layout != MeasurementLayout::Distance {
        return Err(DownholeError::UnsupportedLayout(layout.to_string()));
    }
    let schema = measurements.schema();
    let name = schema.field(1).name();
    Ok(float_column(measurements, name)?.clone())
}

//==================================================================================
// Location tables (one row per hole)
//==================================================================================

/// `(x, y, z)` of every collar.
pub fn coordinates_table(collection: &DownholeCollection) -> Result<RecordBatch> {
    let collars = collection.collars();
    let columns = COORDINATES
        .column_names()
        .into_iter()
        .map(|name| Ok(Arc::new(float_column(collars, name)?.clone()) as ArrayRef))
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordBatch::try_new(COORDINATES.to_arrow_schema(false), columns)?)
}

/// `(final, target, current)`, all three taken from the collar final depth.
pub fn distances_table(collection: &DownholeCollection) -> Result<RecordBatch> {
    let final_depth: ArrayRef = Arc::new(float_column(collection.collars(), "final_depth")?.clone());
    Ok(RecordBatch::try_new(
        DISTANCES.to_arrow_schema(false),
        vec![final_depth.clone(), final_depth.clone(), final_depth],
    )?)
}

/// Derives the hole chunks of the measurement table, one per collar in collar order.
///
/// Counts come from grouping `hole_index` by first appearance; offsets are the
/// running sum of the preceding counts. A hole with no readings gets `count = 0`
/// at its collar position. Fails on a `hole_index` with no collar
/// (`UnknownHoleIndex`) and on a hole whose readings are split or out of collar
/// order (`NonContiguousMeasurements`).
pub fn hole_chunks(collection: &DownholeCollection) -> Result<Vec<HoleChunk>> {
    let collar_index = int32_column(collection.collars(), HOLE_INDEX)?;
    let readings = int32_column(collection.measurements(), HOLE_INDEX)?;

    let known: HashSet<i32> = collar_index.values().iter().copied().collect();

    // 1. Run-length group the readings: (hole_index, start, count).
    let mut runs: HashMap<i32, (u64, u64)> = HashMap::with_capacity(known.len());
    let mut current: Option<i32> = None;
    for (row, &index) in readings.values().iter().enumerate() {
        if current == Some(index) {
            if let Some(run) = runs.get_mut(&index) {
                run.1 += 1;
            }
            continue;
        }
        if !known.contains(&index) {
            return Err(DownholeError::UnknownHoleIndex(index));
        }
        if runs.insert(index, (row as u64, 1)).is_some() {
            return Err(DownholeError::NonContiguousMeasurements(index));
        }
        current = Some(index);
    }

    // 2. Lay the runs out in collar order.
    let mut chunks = Vec::with_capacity(collar_index.len());
    let mut offset = 0u64;
    for &hole_index in collar_index.values().iter() {
        let count = match runs.get(&hole_index) {
            Some(&(start, count)) if start == offset => count,
            Some(_) => return Err(DownholeError::NonContiguousMeasurements(hole_index)),
            None => 0,
        };
        chunks.push(HoleChunk {
            hole_index,
            offset,
            count,
        });
        offset += count;
    }

    crate::log_metric!("event" = "hole_chunks", "holes" = chunks.len(), "rows" = offset);
    Ok(chunks)
}

/// The `(hole_index, offset, count)` table of `chunks`.
pub fn holes_table(chunks: &[HoleChunk]) -> Result<RecordBatch> {
    let hole_index = Int32Array::from_iter_values(chunks.iter().map(|c| c.hole_index));
    let offset = UInt64Array::from_iter_values(chunks.iter().map(|c| c.offset));
    let count = UInt64Array::from_iter_values(chunks.iter().map(|c| c.count));
    Ok(RecordBatch::try_new(
        HOLE_CHUNKS.to_arrow_schema(false),
        vec![Arc::new(hole_index), Arc::new(offset), Arc::new(count)],
    )?)
}

/// The hole identifier as category data: a `(key, value)` lookup from
/// `hole_index` to `hole_id`, and the per-hole `data` array of keys.
pub fn hole_id_tables(collection: &DownholeCollection) -> Result<(RecordBatch, RecordBatch)> {
    let collars = collection.collars();
    let keys: ArrayRef = Arc::new(int32_column(collars, HOLE_INDEX)?.clone());
    let ids = collars
        .column_by_name("hole_id")
        .ok_or_else(|| DownholeError::MissingColumn("hole_id".to_string()))?;
    if ids.as_string_opt::<i32>().is_none() {
        return Err(DownholeError::UnsupportedType(format!(
            "column 'hole_id' is {:?}, expected Utf8",
            ids.data_type()
        )));
    }

    let lookup = RecordBatch::try_new(LOOKUP.to_arrow_schema(false), vec![keys.clone(), ids.clone()])?;
    let values = RecordBatch::try_new(INTEGER_ARRAY.to_arrow_schema(false), vec![keys])?;
    Ok((lookup, values))
}

//==================================================================================
// Per-reading tables
//==================================================================================

/// `(distance, azimuth, dip)` per reading, with a fixed vertical direction.
pub fn path_table(collection: &DownholeCollection) -> Result<RecordBatch> {
    let distance = primary_axis(collection)?;
    let n = distance.len();
    Ok(RecordBatch::try_new(
        PATH.to_arrow_schema(true),
        vec![
            Arc::new(distance),
            Arc::new(Float64Array::from(vec![AZIMUTH; n])),
            Arc::new(Float64Array::from(vec![DIP; n])),
        ],
    )?)
}

/// The primary axis as the `values` of the distance-table collection.
pub fn collection_distances_table(collection: &DownholeCollection) -> Result<RecordBatch> {
    Ok(RecordBatch::try_new(
        DISTANCE_VALUES.to_arrow_schema(true),
        vec![Arc::new(primary_axis(collection)?)],
    )?)
}

/// One single-column `data` table per attribute, that is every measurement column
/// after `hole_index` and the primary axis, in column order.
pub fn collection_attribute_tables(
    collection: &DownholeCollection,
) -> Result<Vec<(String, RecordBatch)>> {
    let measurements = collection.measurements();
    let schema = measurements.schema();
    schema
        .fields()
        .iter()
        .skip(2)
        .map(|field| {
            let values = float_column(measurements, field.name())?.clone();
            let table = RecordBatch::try_new(ATTRIBUTE.to_arrow_schema(true), vec![Arc::new(values)])?;
            Ok((field.name().clone(), table))
        })
        .collect()
}
