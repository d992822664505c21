// In: src/export/exporter.rs

//! Drives the columnar export of one collection.
//!
//! The exporter first derives every table (pure, see `tables`), then hands each
//! one to the store exactly once, and finally composes the output object from the
//! returned references. Only the save step can run in parallel; the composition
//! order never depends on which save finishes first.

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;

use super::object::{
    CategoryData, ContinuousAttribute, CoordinateReferenceSystem, DistanceObject,
    DistanceTableCollection, DownholeCollectionObject, LocationObject, NanDescription,
    DISTANCE_COLLECTION_NAME,
};
use super::tables;
use crate::collection::DownholeCollection;
use crate::config::ExportConfig;
use crate::error::{DownholeError, Result};
use crate::store::{TableRef, TableStore};

/// A derived table waiting to be saved, labelled for logging.
struct SaveJob {
    label: String,
    table: RecordBatch,
}

impl SaveJob {
    fn new(label: impl Into<String>, table: RecordBatch) -> Self {
        Self {
            label: label.into(),
            table,
        }
    }
}

pub struct ColumnarExporter<'a, S: TableStore + ?Sized> {
    store: &'a S,
    config: &'a ExportConfig,
}

impl<'a, S: TableStore + ?Sized> ColumnarExporter<'a, S> {
    pub fn new(store: &'a S, config: &'a ExportConfig) -> Self {
        Self { store, config }
    }

    /// Exports `collection`, issuing one `save` per derived table.
    pub fn export(&self, collection: &DownholeCollection) -> Result<DownholeCollectionObject> {
        let start = Instant::now();
        let bounding_box = collection.bounding_box()?;

        //--- 1. Derive every table up front.
        let chunks = tables::hole_chunks(collection)?;
        let (hole_id_lookup, hole_id_values) = tables::hole_id_tables(collection)?;
        let attributes = tables::collection_attribute_tables(collection)?;

        let mut jobs = vec![
            SaveJob::new("coordinates", tables::coordinates_table(collection)?),
            SaveJob::new("distances", tables::distances_table(collection)?),
            SaveJob::new("holes", tables::holes_table(&chunks)?),
            SaveJob::new("hole_id.table", hole_id_lookup),
            SaveJob::new("hole_id.values", hole_id_values),
            SaveJob::new("path", tables::path_table(collection)?),
            SaveJob::new("distance.values", tables::collection_distances_table(collection)?),
        ];
        let attribute_names: Vec<String> = attributes.iter().map(|(name, _)| name.clone()).collect();
        jobs.extend(
            attributes
                .into_iter()
                .map(|(name, table)| SaveJob::new(format!("attribute.{}", name), table)),
        );

        //--- 2. Save.
        let references = self.save_all(&jobs)?;

        //--- 3. Compose in fixed order.
        let mut references = references.into_iter();
        let mut next = || {
            references
                .next()
                .ok_or_else(|| DownholeError::MissingTable("export reference".to_string()))
        };
        let coordinates = next()?;
        let distances = next()?;
        let holes = next()?;
        let hole_id = CategoryData {
            table: next()?,
            values: next()?,
        };
        let path = next()?;
        let distance_values = next()?;
        let attributes = attribute_names
            .into_iter()
            .map(|name| {
                Ok(ContinuousAttribute {
                    key: name.clone(),
                    nan_description: NanDescription {
                        values: self.config.nan_values_for(&name),
                    },
                    name,
                    values: next()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let distance_unit = collection.distance_unit().unwrap_or("m").to_string();
        let object = DownholeCollectionObject {
            name: collection.name().to_string(),
            uuid: collection.uuid().map(str::to_string),
            bounding_box,
            coordinate_reference_system: CoordinateReferenceSystem {
                epsg_code: collection.epsg_code(),
            },
            distance_unit: distance_unit.clone(),
            location: LocationObject {
                coordinates,
                distances,
                holes: holes.clone(),
                hole_id,
                path,
            },
            collections: vec![DistanceTableCollection {
                name: DISTANCE_COLLECTION_NAME.to_string(),
                holes,
                distance: DistanceObject {
                    values: distance_values,
                    unit: distance_unit,
                    attributes,
                },
            }],
            description: collection.description().map(str::to_string),
            tags: collection.tags().clone(),
        };

        log::info!(
            "Exported collection '{}': {} tables saved in {:.2?}",
            object.name,
            jobs.len(),
            start.elapsed()
        );
        Ok(object)
    }

    /// Saves every job, returning references in job order.
    fn save_all(&self, jobs: &[SaveJob]) -> Result<Vec<TableRef>> {
        if self.config.parallel_saves {
            jobs.par_iter().map(|job| self.save_one(job)).collect()
        } else {
            jobs.iter().map(|job| self.save_one(job)).collect()
        }
    }

    fn save_one(&self, job: &SaveJob) -> Result<TableRef> {
        let reference = self.store.save(&job.table)?;
        log::info!(
            "  - Saved {:<32} | rows: {:>8} | {}",
            job.label,
            reference.length,
            reference.data
        );
        crate::log_metric!("event" = "table_saved", "table" = &job.label, "rows" = reference.length);
        Ok(reference)
    }
}
