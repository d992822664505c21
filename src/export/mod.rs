// In: src/export/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Export Layer
// ====================================================================================
//
//   1. [tables]    DownholeCollection -> derived RecordBatches (pure)
//   2. [exporter]  derived tables -> TableStore::save -> TableRef per table
//   3. [object]    TableRefs + collection metadata -> DownholeCollectionObject
//
// Hole chunks are derived and saved once; the location and the distance-table
// collection share the same reference.
// ====================================================================================

pub mod exporter;
pub mod object;
pub mod tables;

pub use exporter::ColumnarExporter;
pub use object::DownholeCollectionObject;
pub use tables::HoleChunk;
