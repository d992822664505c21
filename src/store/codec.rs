//! Byte-level codecs behind the table artifact: Arrow IPC stream encoding of a
//! `RecordBatch`, and a length-prefixed Zstandard frame around it.
//!
//! This module is a safe, panic-free wrapper around the `zstd` and `arrow::ipc` crates.

use std::io::{Cursor, Write};

use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;

use crate::error::{DownholeError, Result};

/// Size of the little-endian uncompressed-length prefix of a zstd frame.
const LEN_PREFIX: usize = 8;
/// Cap on the up-front buffer reservation relative to the compressed size; the
/// prefix is untrusted input.
const MAX_PREALLOC_RATIO: usize = 64;

//==================================================================================
// 1. Zstd framing
//==================================================================================

/// Compresses `input_bytes`, prepending the uncompressed length.
pub fn zstd_encode(input_bytes: &[u8], level: i32) -> Result<Vec<u8>> {
    if input_bytes.is_empty() {
        return Ok(Vec::new());
    }

    let mut output_buf = Vec::with_capacity(input_bytes.len() / 2 + LEN_PREFIX);
    output_buf.extend_from_slice(&(input_bytes.len() as u64).to_le_bytes());

    let mut encoder = zstd::stream::Encoder::new(&mut output_buf, level)
        .map_err(|e| DownholeError::Zstd(e.to_string()))?;
    encoder
        .write_all(input_bytes)
        .map_err(|e| DownholeError::Zstd(e.to_string()))?;
    // `finish` is essential to finalize the Zstd frame.
    encoder
        .finish()
        .map_err(|e| DownholeError::Zstd(e.to_string()))?;

    Ok(output_buf)
}

/// Reverses `zstd_encode`, checking the decoded size against the prefix.
pub fn zstd_decode(input_bytes: &[u8]) -> Result<Vec<u8>> {
    if input_bytes.is_empty() {
        return Ok(Vec::new());
    }
    if input_bytes.len() < LEN_PREFIX {
        return Err(DownholeError::Zstd(
            "Input stream too short to contain size header.".to_string(),
        ));
    }

    let (prefix, compressed) = input_bytes.split_at(LEN_PREFIX);
    let mut len_bytes = [0u8; LEN_PREFIX];
    len_bytes.copy_from_slice(prefix);
    let expected = u64::from_le_bytes(len_bytes) as usize;

    let mut decoded = Vec::with_capacity(expected.min(compressed.len() * MAX_PREALLOC_RATIO));
    zstd::stream::copy_decode(compressed, &mut decoded)
        .map_err(|e| DownholeError::Zstd(e.to_string()))?;

    if decoded.len() != expected {
        return Err(DownholeError::Zstd(format!(
            "Decompressed size does not match header. Expected {}, got {}.",
            expected,
            decoded.len()
        )));
    }
    Ok(decoded)
}

//==================================================================================
// 2. Arrow IPC
//==================================================================================

/// Writes a single batch as an Arrow IPC stream.
pub fn ipc_encode(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buf, batch.schema().as_ref())?;
        writer.write(batch)?;
        writer.finish()?;
    }
    Ok(buf)
}

/// Reads an Arrow IPC stream back into one batch. A stream holding no batches
/// yields an empty batch of `schema`.
pub fn ipc_decode(bytes: &[u8], schema: SchemaRef) -> Result<RecordBatch> {
    let reader = StreamReader::try_new(Cursor::new(bytes), None)?;
    let mut batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    match batches.len() {
        0 => Ok(RecordBatch::new_empty(schema)),
        1 => Ok(batches.remove(0)),
        _ => Ok(arrow::compute::concat_batches(&schema, &batches)?),
    }
}
