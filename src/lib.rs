//! This file is the root of the `downhole_core` Rust crate.
//!
//! `downhole_core` assembles already-parsed cone penetration test (CPT) soundings
//! into a Downhole Collection and exports that collection as a set of columnar
//! tables plus the object that references them.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`collection`, `export`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types a caller needs for a conversion run.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod collection;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod input;
pub mod store;
pub mod types;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use collection::{BoundingBox, DownholeCollection, MeasurementLayout};
pub use config::{ConversionConfig, ExportConfig, StoreConfig, ZeroDepthPolicy};
pub use convert::convert_holes;
pub use error::{DownholeError, Result};
pub use export::{ColumnarExporter, DownholeCollectionObject, HoleChunk};
pub use input::{FinalDepth, HoleBatch, HoleRecord, Location, MeasurementTable};
pub use observability::enable_verbose_logging;
pub use store::{DirectoryStore, MemoryStore, TableRef, TableStore};
