//! Persisted Entry Codec
//!
//! Turns cache entries into the text stored by a backing store and back.
//!
//! Pipeline: JSON, then optional gzip, then optional byte mask. When either
//! binary step runs the bytes are hex-encoded; otherwise the JSON text is
//! stored unchanged.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

/// Repeating mask for the obfuscation step. Not secret.
const MASK: &[u8] = b"q7#cache-mask!";

// == Encode ==
/// Serializes `value` and applies the enabled transforms.
pub fn encode<V: Serialize>(value: &V, compress: bool, obfuscate: bool) -> Result<String> {
    let json = serde_json::to_vec(value)?;

    if !compress && !obfuscate {
        return String::from_utf8(json).map_err(|e| CacheError::Codec(e.to_string()));
    }

    let mut bytes = if compress { gzip(&json)? } else { json };
    if obfuscate {
        apply_mask(&mut bytes);
    }

    Ok(hex::encode(bytes))
}

// == Decode ==
/// Reverses [`encode`] under the same flags.
pub fn decode<V: DeserializeOwned>(text: &str, compress: bool, obfuscate: bool) -> Result<V> {
    if !compress && !obfuscate {
        return Ok(serde_json::from_str(text)?);
    }

    let mut bytes = hex::decode(text).map_err(|e| CacheError::Codec(e.to_string()))?;
    if obfuscate {
        apply_mask(&mut bytes);
    }
    let json = if compress { gunzip(&bytes)? } else { bytes };

    Ok(serde_json::from_slice(&json)?)
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CacheError::Codec(format!("gzip: {}", e)))?;
    Ok(out)
}

// XOR is its own inverse
fn apply_mask(bytes: &mut [u8]) {
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte ^= MASK[i % MASK.len()];
    }
}
