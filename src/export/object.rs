//! The serialized shape of an exported downhole collection.
//!
//! Field declaration order is the serialization order and is part of the output
//! contract; do not reorder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collection::BoundingBox;
use crate::error::Result;
use crate::store::TableRef;

/// Name of the single distance-table collection the exporter emits.
pub const DISTANCE_COLLECTION_NAME: &str = "distances";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DownholeCollectionObject {
    pub name: String,
    pub uuid: Option<String>,
    pub bounding_box: BoundingBox,
    pub coordinate_reference_system: CoordinateReferenceSystem,
    pub distance_unit: String,
    pub location: LocationObject,
    pub collections: Vec<DistanceTableCollection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateReferenceSystem {
    pub epsg_code: i32,
}

/// Per-hole tables.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LocationObject {
    pub coordinates: TableRef,
    pub distances: TableRef,
    pub holes: TableRef,
    pub hole_id: CategoryData,
    pub path: TableRef,
}

/// A lookup table plus the per-row keys into it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CategoryData {
    pub table: TableRef,
    pub values: TableRef,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DistanceTableCollection {
    pub name: String,
    pub holes: TableRef,
    pub distance: DistanceObject,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DistanceObject {
    pub values: TableRef,
    pub unit: String,
    pub attributes: Vec<ContinuousAttribute>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContinuousAttribute {
    pub key: String,
    pub name: String,
    pub nan_description: NanDescription,
    pub values: TableRef,
}

/// Sentinel values that stand for "no reading" in an attribute.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NanDescription {
    pub values: Vec<f64>,
}

impl DownholeCollectionObject {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
