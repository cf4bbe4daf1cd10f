//! Decoder for the IDX container used by the MNIST family of datasets.
//!
//! Layout: a big-endian `u32` magic (`0x0000_08NN`, where `NN` is the number
//! of dimensions), one big-endian `u32` per dimension, then the unsigned byte
//! payload. Gzip-compressed input is detected by its magic and inflated first.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;

use super::DatasetError;

const UBYTE_TYPE: u8 = 0x08;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// Largest inflated payload accepted; the training images are about 47 MB.
const MAX_INFLATED_BYTES: u64 = 128 * 1024 * 1024;

/// Raw image tensor decoded from an `idx3-ubyte` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    pub pixels: Vec<u8>,
}

/// Parse an `idx3-ubyte` image file (optionally gzipped).
pub fn parse_images(bytes: &[u8]) -> Result<IdxImages, DatasetError> {
    let data = inflate_if_gzipped(bytes)?;
    let (dims, payload) = read_header(&data, 3)?;
    let (count, rows, cols) = (dims[0], dims[1], dims[2]);
    if rows == 0 || cols == 0 {
        return Err(DatasetError::InvalidIdx(format!(
            "image dimensions must be non-zero (got {rows}x{cols})"
        )));
    }
    let expected = count
        .checked_mul(rows)
        .and_then(|v| v.checked_mul(cols))
        .ok_or_else(|| DatasetError::InvalidIdx("image payload size overflows".into()))?;
    let pixels = take_payload(payload, expected)?;
    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels,
    })
}

/// Parse an `idx1-ubyte` label file (optionally gzipped).
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>, DatasetError> {
    let data = inflate_if_gzipped(bytes)?;
    let (dims, payload) = read_header(&data, 1)?;
    take_payload(payload, dims[0])
}

fn inflate_if_gzipped(bytes: &[u8]) -> Result<Cow<'_, [u8]>, DatasetError> {
    inflate_with_limit(bytes, MAX_INFLATED_BYTES)
}

fn inflate_with_limit(bytes: &[u8], limit: u64) -> Result<Cow<'_, [u8]>, DatasetError> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(bytes));
    }
    let mut inflated = Vec::new();
    GzDecoder::new(bytes)
        .take(limit.saturating_add(1))
        .read_to_end(&mut inflated)
        .map_err(DatasetError::Decompress)?;
    if inflated.len() as u64 > limit {
        return Err(DatasetError::InvalidIdx(format!(
            "inflated data exceeds {limit} bytes"
        )));
    }
    Ok(Cow::Owned(inflated))
}

fn read_header(data: &[u8], expected_dims: usize) -> Result<(Vec<usize>, &[u8]), DatasetError> {
    let Some(magic) = data.get(..4) else {
        return Err(DatasetError::InvalidIdx(format!(
            "magic truncated ({} of 4 bytes)",
            data.len()
        )));
    };
    if magic[0] != 0 || magic[1] != 0 {
        return Err(DatasetError::InvalidIdx("magic must start with two zero bytes".into()));
    }
    if magic[2] != UBYTE_TYPE {
        return Err(DatasetError::InvalidIdx(format!(
            "unsupported element type 0x{:02x}",
            magic[2]
        )));
    }
    if magic[3] as usize != expected_dims {
        return Err(DatasetError::InvalidIdx(format!(
            "expected {expected_dims} dimension(s), found {}",
            magic[3]
        )));
    }
    let header_len = 4 + expected_dims * 4;
    if data.len() < header_len {
        return Err(DatasetError::InvalidIdx(format!(
            "header truncated ({} of {header_len} bytes)",
            data.len()
        )));
    }
    let dims = data[4..header_len]
        .chunks_exact(4)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize)
        .collect();
    Ok((dims, &data[header_len..]))
}

fn take_payload(payload: &[u8], expected: usize) -> Result<Vec<u8>, DatasetError> {
    if payload.len() < expected {
        return Err(DatasetError::InvalidIdx(format!(
            "payload truncated ({} of {expected} bytes)",
            payload.len()
        )));
    }
    Ok(payload[..expected].to_vec())
}
