//! Defines the self-describing on-disk format for a single stored table.
//! This module is the single source of truth for serialization, deserialization,
//! and efficient metadata peeking of the artifact.
//!
//! Layout (little-endian):
//!
//! ```text
//! magic "DHTA" (4) | version u16 | num_rows u64 | header_len u32
//! header: schema_json_len u32 | schema JSON
//! payload: zstd frame of an Arrow IPC stream
//! ```

use std::io::{Cursor, Read};
use std::sync::Arc;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;

use super::codec;
use crate::error::{DownholeError, Result};

//==================================================================================
// Format Constants
//==================================================================================
/// The magic number to identify a stored table artifact.
pub const ARTIFACT_MAGIC: &[u8; 4] = b"DHTA";
/// The version of the artifact format.
pub const ARTIFACT_FORMAT_VERSION: u16 = 1;
/// magic(4) + ver(2) + rows(8) + header_len(4)
const FIXED_HEADER_SIZE: usize = 18;
/// Upper bound on the schema JSON length, guarding against corrupt length fields (16MB).
const MAX_REASONABLE_HEADER_LEN: usize = 16 * 1024 * 1024;

//==================================================================================
// Public Structs
//==================================================================================

/// Metadata read from an artifact's header without touching the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderInfo {
    pub format_version: u16,
    pub num_rows: u64,
    pub schema: Schema,
    /// Size of the fixed and variable header sections in bytes.
    pub header_size: usize,
    /// Size of the compressed payload in bytes.
    pub payload_size: usize,
}

/// A table in its stored form: the schema plus a compressed IPC payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TableArtifact {
    pub num_rows: u64,
    pub schema: Schema,
    pub payload: Vec<u8>,
}

//==================================================================================
// Core Implementation
//==================================================================================

impl TableArtifact {
    /// Encodes `batch` into an artifact, compressing the IPC payload at `level`.
    pub fn from_batch(batch: &RecordBatch, level: i32) -> Result<Self> {
        let ipc = codec::ipc_encode(batch)?;
        Ok(Self {
            num_rows: batch.num_rows() as u64,
            schema: batch.schema().as_ref().clone(),
            payload: codec::zstd_encode(&ipc, level)?,
        })
    }

    /// Decodes the payload back into the stored table.
    pub fn to_batch(&self) -> Result<RecordBatch> {
        let ipc = codec::zstd_decode(&self.payload)?;
        let batch = codec::ipc_decode(&ipc, Arc::new(self.schema.clone()))?;
        if batch.num_rows() as u64 != self.num_rows {
            return Err(DownholeError::ArtifactFormat(format!(
                "Row count mismatch: header says {}, payload holds {}",
                self.num_rows,
                batch.num_rows()
            )));
        }
        Ok(batch)
    }

    /// Serializes the artifact into its canonical byte form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let schema_json = serde_json::to_vec(&self.schema)?;
        let header_len = 4 + schema_json.len();

        let mut buf = Vec::with_capacity(FIXED_HEADER_SIZE + header_len + self.payload.len());
        buf.extend_from_slice(ARTIFACT_MAGIC);
        buf.extend_from_slice(&ARTIFACT_FORMAT_VERSION.to_le_bytes());
        buf.extend_from_slice(&self.num_rows.to_le_bytes());
        buf.extend_from_slice(&(header_len as u32).to_le_bytes());
        buf.extend_from_slice(&(schema_json.len() as u32).to_le_bytes());
        buf.extend_from_slice(&schema_json);
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// Deserializes a full byte slice into a `TableArtifact`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let info = Self::peek_info(bytes)?;
        Ok(Self {
            num_rows: info.num_rows,
            schema: info.schema,
            payload: bytes[info.header_size..].to_vec(),
        })
    }

    /// Parses only the header of a serialized artifact.
    pub fn peek_info(bytes: &[u8]) -> Result<HeaderInfo> {
        if bytes.len() < FIXED_HEADER_SIZE {
            return Err(DownholeError::ArtifactFormat(format!(
                "Artifact is too small to be valid. Minimum size: {}, got: {}",
                FIXED_HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut cursor = Cursor::new(bytes);
        let map_err = |e: std::io::Error| DownholeError::ArtifactFormat(e.to_string());

        let mut magic_buf = [0u8; 4];
        cursor.read_exact(&mut magic_buf).map_err(map_err)?;
        if magic_buf != *ARTIFACT_MAGIC {
            return Err(DownholeError::ArtifactFormat(
                "Invalid artifact magic number".into(),
            ));
        }

        let mut u16_buf = [0u8; 2];
        cursor.read_exact(&mut u16_buf).map_err(map_err)?;
        let format_version = u16::from_le_bytes(u16_buf);
        if format_version != ARTIFACT_FORMAT_VERSION {
            return Err(DownholeError::ArtifactFormat(format!(
                "Unsupported artifact version: expected {}, got {}",
                ARTIFACT_FORMAT_VERSION, format_version
            )));
        }

        let mut u64_buf = [0u8; 8];
        cursor.read_exact(&mut u64_buf).map_err(map_err)?;
        let num_rows = u64::from_le_bytes(u64_buf);

        let mut u32_buf = [0u8; 4];
        cursor.read_exact(&mut u32_buf).map_err(map_err)?;
        let header_len = u32::from_le_bytes(u32_buf) as usize;
        if header_len > MAX_REASONABLE_HEADER_LEN
            || FIXED_HEADER_SIZE + header_len > bytes.len()
        {
            return Err(DownholeError::ArtifactFormat(format!(
                "Header length {} exceeds artifact size {}",
                header_len,
                bytes.len()
            )));
        }

        cursor.read_exact(&mut u32_buf).map_err(map_err)?;
        let schema_len = u32::from_le_bytes(u32_buf) as usize;
        if schema_len + 4 != header_len {
            return Err(DownholeError::ArtifactFormat(format!(
                "Schema length {} does not match header length {}",
                schema_len, header_len
            )));
        }
        let mut schema_json = vec![0u8; schema_len];
        cursor.read_exact(&mut schema_json).map_err(map_err)?;
        let schema: Schema = serde_json::from_slice(&schema_json)?;

        let header_size = FIXED_HEADER_SIZE + header_len;
        Ok(HeaderInfo {
            format_version,
            num_rows,
            schema,
            header_size,
            payload_size: bytes.len() - header_size,
        })
    }
}
