//! This module defines the core, strongly-typed column representations used
//! throughout the downhole pipeline.
//!
//! It includes the canonical `ColumnType` enum and the `SchemaDescriptor`s that
//! pin down the shape of every fixed table (collars, hole chunks, lookups, ...).

pub mod column_type;
pub mod schema;

// Re-export the main type(s) for easier access.
pub use column_type::ColumnType;
pub use schema::SchemaDescriptor;
