//! Binary encoding for stored vectors.
//!
//! Each element is an IEEE-754 `f32` in little-endian order, concatenated
//! with no separator and no length prefix. The element count is recovered
//! as `bytes.len() / 4`.

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Width of one encoded element in bytes.
pub const ELEMENT_WIDTH: usize = std::mem::size_of::<f32>();

/// Encode a vector into its blob representation.
pub fn encode(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * ELEMENT_WIDTH);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a blob produced by [`encode`].
///
/// A blob whose length is not a multiple of [`ELEMENT_WIDTH`] is corrupt and
/// is rejected instead of truncated.
pub fn decode(bytes: &[u8]) -> Result<Embedding> {
    if bytes.len() % ELEMENT_WIDTH != 0 {
        return Err(EmbeddingError::CorruptBlob { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(ELEMENT_WIDTH)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
