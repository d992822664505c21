// In: src/convert.rs

//! The one-call conversion entry point: validated holes in, exported object out.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::collection::DownholeCollection;
use crate::config::ConversionConfig;
use crate::error::Result;
use crate::export::{ColumnarExporter, DownholeCollectionObject};
use crate::input::HoleBatch;
use crate::store::TableStore;

/// Tags recording where a converted object came from.
pub fn provenance_tags(config: &ConversionConfig) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "Source".to_string(),
            format!("{} files (via Evo Data Converters)", config.input_type),
        ),
        ("Stage".to_string(), "Experimental".to_string()),
        ("InputType".to_string(), config.input_type.clone()),
    ])
}

/// Assembles `batch` into a collection and exports it through `store`.
///
/// The object carries the provenance tags with the configured user tags merged
/// over them.
pub fn convert_holes<S: TableStore + ?Sized>(
    batch: &HoleBatch,
    config: &ConversionConfig,
    store: &S,
) -> Result<DownholeCollectionObject> {
    let start = Instant::now();
    config.validate()?;
    log::info!("Converting {} {} holes", batch.len(), config.input_type);

    let collection = DownholeCollection::from_batch(batch, config)?;
    let mut tags = provenance_tags(config);
    tags.extend(collection.tags().clone());
    let collection = collection.with_tags(tags);

    let object = ColumnarExporter::new(store, &config.export).export(&collection)?;

    log::info!(
        "Conversion of '{}' finished in {:.2?}",
        object.name,
        start.elapsed()
    );
    log_metric!(
        "event" = "conversion_finished",
        "holes" = batch.len(),
        "measurements" = collection.measurements().num_rows()
    );
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DownholeError;
    use crate::input::{HoleRecord, Location, MeasurementTable};
    use crate::store::MemoryStore;

    fn cpt(srs: &str, penetration: Vec<f64>) -> HoleRecord {
        let n = penetration.len();
        let table = MeasurementTable::from_columns(vec![
            ("penetrationLength".to_string(), penetration),
            ("coneResistance".to_string(), vec![2.5; n]),
        ])
        .unwrap();
        HoleRecord::new(Location::new(155000.0, 463000.0, srs), table)
    }

    #[test]
    fn test_convert_tags_and_names_the_object() {
        let mut config = ConversionConfig::default();
        config.tags.insert("Stage".into(), "Production".into());
        config.tags.insert("Project".into(), "Delft".into());

        let mut batch = HoleBatch::new();
        batch
            .push_checked(
                "CPT-001",
                cpt("urn:ogc:def:crs:EPSG::28992", vec![0.0, 2.5, 5.0, 7.8]),
                &config.required_columns,
            )
            .unwrap();
        batch
            .push_checked(
                "CPT-002",
                cpt("urn:ogc:def:crs:EPSG::28992", vec![0.0, 1.0]),
                &config.required_columns,
            )
            .unwrap();

        let store = MemoryStore::default();
        let object = convert_holes(&batch, &config, &store).unwrap();

        assert_eq!(object.name, "CPT-001...CPT-002");
        assert_eq!(object.coordinate_reference_system.epsg_code, 28992);
        assert_eq!(object.tags["Source"], "GEF-CPT files (via Evo Data Converters)");
        assert_eq!(object.tags["InputType"], "GEF-CPT");
        assert_eq!(object.tags["Stage"], "Production");
        assert_eq!(object.tags["Project"], "Delft");
        assert_eq!(object.collections[0].distance.values.length, 6);
        assert!(object.to_json_pretty().unwrap().contains("\"tags\""));
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let store = MemoryStore::default();
        let err = convert_holes(&HoleBatch::new(), &ConversionConfig::default(), &store).unwrap_err();
        assert!(matches!(err, DownholeError::EmptyBatch));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_any_save() {
        let config = ConversionConfig {
            distance_unit: " ".into(),
            ..ConversionConfig::default()
        };
        let store = MemoryStore::default();
        let mut batch = HoleBatch::new();
        batch.push("X", cpt("EPSG:28992", vec![0.0, 1.0])).unwrap();
        assert!(matches!(
            convert_holes(&batch, &config, &store),
            Err(DownholeError::Config(_))
        ));
        assert!(store.is_empty().unwrap());
    }
}
