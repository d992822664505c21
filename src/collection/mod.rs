// In: src/collection/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Collection Layer
// ====================================================================================
//
// A `DownholeCollection` separates collar information (stored once per hole) from
// measurement data (stored once per reading):
//
//   1. [identity]      HoleBatch -> ValidatedBatch (EPSG code, x/y, final depth)
//   2. [collars]       ValidatedBatch -> collars RecordBatch (hole_index 1..=N)
//   3. [measurements]  per-hole tables -> one concatenated RecordBatch
//
// The collection is immutable once built. The exporter only ever reads it.
// ====================================================================================

pub mod collars;
pub mod identity;
pub mod measurements;

use std::collections::BTreeMap;
use std::fmt;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::config::ConversionConfig;
use crate::error::{DownholeError, Result};
use crate::input::HoleBatch;
use crate::types::schema::COLLARS;

pub use identity::{ValidatedBatch, ValidatedHole};
pub use measurements::HOLE_INDEX;

/// How the measurement table positions its readings along the hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementLayout {
    /// Column 2 is `penetrationLength` or `depth`.
    Distance,
    /// Columns 2 and 3 are `from` and `to`.
    Interval,
    Unknown,
}

impl fmt::Display for MeasurementLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Distance => "distance",
            Self::Interval => "interval",
            Self::Unknown => "unknown",
        })
    }
}

/// Extent of the collar locations.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

/// Collars plus concatenated measurements plus collection-level metadata.
#[derive(Debug, Clone)]
pub struct DownholeCollection {
    collars: RecordBatch,
    measurements: RecordBatch,

    name: String,
    epsg_code: i32,

    uuid: Option<String>,
    tags: BTreeMap<String, String>,
    description: Option<String>,
    distance_unit: Option<String>,
    desurvey_method: Option<String>,
}

impl DownholeCollection {
    /// Wraps already-built tables. No validation happens here; use the
    /// `is_*_valid` queries to check them.
    pub fn new(
        name: impl Into<String>,
        epsg_code: i32,
        collars: RecordBatch,
        measurements: RecordBatch,
    ) -> Self {
        Self {
            collars,
            measurements,
            name: name.into(),
            epsg_code,
            uuid: None,
            tags: BTreeMap::new(),
            description: None,
            distance_unit: None,
            desurvey_method: None,
        }
    }

    /// Validates a batch of holes and assembles the collection from it.
    pub fn from_batch(batch: &HoleBatch, config: &ConversionConfig) -> Result<Self> {
        let validated = identity::validate_batch(batch, config)?;
        let collars = collars::build_collars(&validated.holes)?;

        let tables = batch
            .iter()
            .enumerate()
            .map(|(position, (_, record))| {
                Ok((collars::hole_index_at(position)?, &record.measurements))
            })
            .collect::<Result<Vec<_>>>()?;
        let measurements = measurements::concatenate(tables)?;

        let name = config.collection_name.clone().unwrap_or_else(|| {
            identity::collection_name(validated.holes.iter().map(|h| h.hole_id.as_str()))
        });

        log::info!(
            "Built downhole collection '{}': {} holes, {} measurements, EPSG:{}",
            name,
            collars.num_rows(),
            measurements.num_rows(),
            validated.epsg_code
        );

        let mut collection = Self::new(name, validated.epsg_code, collars, measurements)
            .with_distance_unit(Some(config.distance_unit.clone()))
            .with_description(config.description.clone());
        collection.tags = config.tags.clone();
        Ok(collection)
    }

    pub fn with_uuid(mut self, uuid: Option<String>) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_distance_unit(mut self, unit: Option<String>) -> Self {
        self.distance_unit = unit;
        self
    }

    pub fn with_desurvey_method(mut self, method: Option<String>) -> Self {
        self.desurvey_method = method;
        self
    }

    //==============================================================================
    // Accessors
    //==============================================================================

    pub fn collars(&self) -> &RecordBatch {
        &self.collars
    }

    pub fn measurements(&self) -> &RecordBatch {
        &self.measurements
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn epsg_code(&self) -> i32 {
        self.epsg_code
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn distance_unit(&self) -> Option<&str> {
        self.distance_unit.as_deref()
    }

    pub fn desurvey_method(&self) -> Option<&str> {
        self.desurvey_method.as_deref()
    }

    //==============================================================================
    // Queries
    //==============================================================================

    /// `true` iff the collars table has exactly the collar column set and types.
    pub fn is_collars_valid(&self) -> bool {
        COLLARS.conforms(self.collars.schema().as_ref())
    }

    /// `true` iff measurements lead with an Int32 `hole_index` followed by Float64 columns.
    pub fn is_measurements_valid(&self) -> bool {
        let schema = self.measurements.schema();
        let mut fields = schema.fields().iter();
        match fields.next() {
            Some(first) if first.name() == HOLE_INDEX && first.data_type() == &DataType::Int32 => {
                fields.all(|f| f.data_type() == &DataType::Float64)
            }
            _ => false,
        }
    }

    fn measurement_column_name(&self, position: usize) -> Option<String> {
        if self.measurements.num_rows() == 0 {
            return None;
        }
        self.measurements
            .schema()
            .fields()
            .get(position)
            .map(|f| f.name().to_lowercase())
    }

    /// Column 2 is `penetrationLength` or `depth` (case-insensitive).
    pub fn is_distance_layout(&self) -> bool {
        matches!(
            self.measurement_column_name(1).as_deref(),
            Some("penetrationlength") | Some("depth")
        )
    }

    /// Columns 2 and 3 are `from` and `to` (case-insensitive).
    pub fn is_interval_layout(&self) -> bool {
        self.measurement_column_name(1).as_deref() == Some("from")
            && self.measurement_column_name(2).as_deref() == Some("to")
    }

    pub fn measurement_layout(&self) -> MeasurementLayout {
        if self.is_distance_layout() {
            MeasurementLayout::Distance
        } else if self.is_interval_layout() {
            MeasurementLayout::Interval
        } else {
            MeasurementLayout::Unknown
        }
    }

    /// Extrema of the collar `x`, `y` and `z` columns.
    ///
    /// Fails with `EmptyCollars` when there are no collars and with
    /// `NonFiniteCoordinate` when a coordinate is missing, `NaN` or infinite.
    pub fn bounding_box(&self) -> Result<BoundingBox> {
        if self.collars.num_rows() == 0 {
            return Err(DownholeError::EmptyCollars);
        }
        let (min_x, max_x) = self.coordinate_extent("x")?;
        let (min_y, max_y) = self.coordinate_extent("y")?;
        let (min_z, max_z) = self.coordinate_extent("z")?;
        Ok(BoundingBox {
            min_x,
            max_x,
            min_y,
            max_y,
            min_z,
            max_z,
        })
    }

    fn coordinate_extent(&self, column: &'static str) -> Result<(f64, f64)> {
        let values = self
            .collars
            .column_by_name(column)
            .and_then(|c| c.as_primitive_opt::<Float64Type>())
            .ok_or_else(|| DownholeError::MissingColumn(column.to_string()))?;

        let mut extent = (f64::INFINITY, f64::NEG_INFINITY);
        for row in 0..values.len() {
            let value = values.value(row);
            if values.is_null(row) || !value.is_finite() {
                return Err(DownholeError::NonFiniteCoordinate { column, row });
            }
            extent = (extent.0.min(value), extent.1.max(value));
        }
        Ok(extent)
    }
}
