// In: src/collection/identity.rs

//! Hole identity and validation.
//!
//! Walks a `HoleBatch` in order and turns every record into a `ValidatedHole`:
//! the EPSG code is pulled out of the spatial reference name and checked against
//! the rest of the batch, the collar location is checked for presence, and the
//! final depth is resolved from the tri-state `FinalDepth`.

use crate::config::{ConversionConfig, ZeroDepthPolicy};
use crate::error::{DownholeError, Result};
use crate::input::{FinalDepth, HoleBatch, HoleRecord, Location, PENETRATION_LENGTH};

/// The per-hole fields a collar row is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedHole {
    pub hole_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub final_depth: f64,
}

/// A batch that passed validation, still in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch {
    pub epsg_code: i32,
    pub holes: Vec<ValidatedHole>,
}

/// Validates every hole of `batch`. The first hole's EPSG code becomes the code of
/// the whole batch.
pub fn validate_batch(batch: &HoleBatch, config: &ConversionConfig) -> Result<ValidatedBatch> {
    if batch.is_empty() {
        return Err(DownholeError::EmptyBatch);
    }

    let mut epsg_code: Option<i32> = None;
    let mut holes = Vec::with_capacity(batch.len());

    for (hole_id, record) in batch.iter() {
        let code = extract_epsg_code(record.location.srs_name.as_deref(), hole_id)?;
        match epsg_code {
            None => epsg_code = Some(code),
            Some(expected) if expected != code => {
                return Err(DownholeError::InconsistentSpatialReference {
                    hole_id: hole_id.to_string(),
                    expected,
                    found: code,
                });
            }
            Some(_) => {}
        }

        let (x, y) = validate_location(&record.location, hole_id)?;
        let final_depth = calculate_final_depth(record, hole_id, config.zero_final_depth)?;

        log::debug!(
            "Validated hole '{}': x={} y={} final_depth={} rows={}",
            hole_id,
            x,
            y,
            final_depth,
            record.measurements.num_rows()
        );

        holes.push(ValidatedHole {
            hole_id: hole_id.to_string(),
            x,
            y,
            z: record.vertical_offset.unwrap_or(0.0),
            final_depth,
        });
    }

    // The batch is non-empty, so the first iteration always set the code.
    let epsg_code = epsg_code.ok_or(DownholeError::EmptyBatch)?;
    Ok(ValidatedBatch { epsg_code, holes })
}

/// Extracts the integer EPSG code after the last `:` of a spatial reference name.
///
/// Both `EPSG:28992` and `urn:ogc:def:crs:EPSG::28992` yield `28992`.
pub fn extract_epsg_code(srs_name: Option<&str>, hole_id: &str) -> Result<i32> {
    let invalid = |reason: String| DownholeError::InvalidSpatialReference {
        hole_id: hole_id.to_string(),
        reason,
    };

    let srs_name = srs_name
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| invalid("missing delivered_location.srs_name".to_string()))?;

    let (_, code) = srs_name
        .rsplit_once(':')
        .ok_or_else(|| invalid(format!("malformed SRS name '{}'", srs_name)))?;

    code.trim()
        .parse::<i32>()
        .map_err(|_| invalid(format!("invalid EPSG code '{}' in '{}'", code, srs_name)))
}

/// Checks both collar coordinates are present.
pub fn validate_location(location: &Location, hole_id: &str) -> Result<(f64, f64)> {
    let missing = |axis| DownholeError::MissingLocation {
        hole_id: hole_id.to_string(),
        axis,
    };
    let x = location.x.ok_or_else(|| missing("x"))?;
    let y = location.y.ok_or_else(|| missing("y"))?;
    Ok((x, y))
}

/// Resolves the final depth of a hole.
///
/// A supplied non-zero depth is used as-is. Otherwise the depth is the largest
/// `penetrationLength` reading, ignoring `NaN`s. Under `ZeroDepthPolicy::Keep` an
/// explicit `0.0` is returned unchanged.
pub fn calculate_final_depth(
    record: &HoleRecord,
    hole_id: &str,
    policy: ZeroDepthPolicy,
) -> Result<f64> {
    match (record.final_depth, policy) {
        (FinalDepth::Supplied(depth), _) => return Ok(depth),
        (FinalDepth::SuppliedZero, ZeroDepthPolicy::Keep) => return Ok(0.0),
        (FinalDepth::SuppliedZero, ZeroDepthPolicy::TreatAsAbsent) | (FinalDepth::Absent, _) => {}
    }

    let penetration = record.measurements.column(PENETRATION_LENGTH).ok_or_else(|| {
        DownholeError::MissingPrimaryAxis {
            hole_id: hole_id.to_string(),
        }
    })?;

    penetration
        .into_iter()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
        .ok_or_else(|| DownholeError::EmptyPrimaryAxis {
            hole_id: hole_id.to_string(),
        })
}

/// `<first>...<last>` for several holes, the hole id for one, empty for none.
pub fn collection_name<'a>(hole_ids: impl IntoIterator<Item = &'a str>) -> String {
    let mut ids = hole_ids.into_iter();
    match (ids.next(), ids.last()) {
        (None, _) => String::new(),
        (Some(only), None) => only.to_string(),
        (Some(first), Some(last)) => format!("{}...{}", first, last),
    }
}
