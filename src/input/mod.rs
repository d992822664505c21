// In: src/input/mod.rs

//! Already-parsed borehole records, as handed over by a CPT file parser.
//!
//! Nothing in here reads files. A parser builds one `HoleRecord` per sounding and
//! pushes it into a `HoleBatch`, which keeps the holes in encounter order and
//! refuses duplicate identifiers.

mod measurement_table;

pub use measurement_table::MeasurementTable;

use hashbrown::HashSet;

use crate::error::{DownholeError, Result};

/// Name of the primary distance axis in CPT measurement tables.
pub const PENETRATION_LENGTH: &str = "penetrationLength";

/// Surface location as delivered by the survey.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Spatial reference name, e.g. `EPSG:28992` or `urn:ogc:def:crs:EPSG::28992`.
    pub srs_name: Option<String>,
}

impl Location {
    pub fn new(x: f64, y: f64, srs_name: impl Into<String>) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            srs_name: Some(srs_name.into()),
        }
    }
}

/// The final depth reported for a hole.
///
/// Parsers report `0.0` when the header carries no final depth, so an explicit zero
/// is kept apart from a supplied value and from a missing one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FinalDepth {
    Supplied(f64),
    SuppliedZero,
    Absent,
}

impl FinalDepth {
    pub fn from_reported(value: Option<f64>) -> Self {
        match value {
            None => Self::Absent,
            Some(v) if v == 0.0 => Self::SuppliedZero,
            Some(v) => Self::Supplied(v),
        }
    }
}

impl Default for FinalDepth {
    fn default() -> Self {
        Self::Absent
    }
}

/// One parsed borehole.
#[derive(Debug, Clone, PartialEq)]
pub struct HoleRecord {
    pub location: Location,
    /// Collar elevation; `None` is stored as `0.0`.
    pub vertical_offset: Option<f64>,
    pub final_depth: FinalDepth,
    pub measurements: MeasurementTable,
}

impl HoleRecord {
    pub fn new(location: Location, measurements: MeasurementTable) -> Self {
        Self {
            location,
            vertical_offset: None,
            final_depth: FinalDepth::Absent,
            measurements,
        }
    }

    pub fn with_vertical_offset(mut self, offset: Option<f64>) -> Self {
        self.vertical_offset = offset;
        self
    }

    pub fn with_final_depth(mut self, reported: Option<f64>) -> Self {
        self.final_depth = FinalDepth::from_reported(reported);
        self
    }
}

/// Picks the hole identifier for a sounding: the BRO id of GEF-XML files wins over
/// the `#TESTID` alias of GEF-CPT files. Blank values count as missing.
pub fn resolve_hole_id(bro_id: Option<&str>, alias: Option<&str>) -> Result<String> {
    [bro_id, alias]
        .into_iter()
        .flatten()
        .find(|id| !id.trim().is_empty())
        .map(str::to_string)
        .ok_or(DownholeError::MissingIdentifier)
}

/// An ordered batch of `(hole_id, HoleRecord)` pairs with unique identifiers.
#[derive(Debug, Clone, Default)]
pub struct HoleBatch {
    holes: Vec<(String, HoleRecord)>,
    seen: HashSet<String>,
}

impl HoleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hole, rejecting an identifier that is already present.
    pub fn push(&mut self, hole_id: impl Into<String>, record: HoleRecord) -> Result<()> {
        let hole_id = hole_id.into();
        if !self.seen.insert(hole_id.clone()) {
            return Err(DownholeError::DuplicateHoleIdentifier(hole_id));
        }
        self.holes.push((hole_id, record));
        Ok(())
    }

    /// Like `push`, but first checks the record carries every column in `required`.
    pub fn push_checked(
        &mut self,
        hole_id: impl Into<String>,
        record: HoleRecord,
        required: &[String],
    ) -> Result<()> {
        let hole_id = hole_id.into();
        record.measurements.check_required_columns(&hole_id, required)?;
        self.push(hole_id, record)
    }

    pub fn len(&self) -> usize {
        self.holes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HoleRecord)> {
        self.holes.iter().map(|(id, record)| (id.as_str(), record))
    }
}

impl TryFrom<Vec<(String, HoleRecord)>> for HoleBatch {
    type Error = DownholeError;

    fn try_from(holes: Vec<(String, HoleRecord)>) -> Result<Self> {
        let mut batch = Self::new();
        for (hole_id, record) in holes {
            batch.push(hole_id, record)?;
        }
        Ok(batch)
    }
}
