//! URL-safe persisted form of the network: JSON, LZ4, base64.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{DecodeError, EncodeError};
use crate::model::NeuralNetwork;

/// Upper bound on the decompressed document, far above any hand-built network.
const MAX_DOCUMENT_BYTES: i32 = 16 * 1024 * 1024;

pub fn encode(nn: &NeuralNetwork) -> Result<String, EncodeError> {
    let json = serde_json::to_vec(nn)?;
    let compressed = lz4::block::compress(&json, Some(lz4::block::CompressionMode::DEFAULT), true)
        .map_err(EncodeError::Compress)?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Decodes and validates a string produced by [`encode`].
pub fn decode(encoded: &str) -> Result<NeuralNetwork, DecodeError> {
    let compressed = URL_SAFE_NO_PAD.decode(encoded.trim())?;
    let json = decompress(&compressed).map_err(DecodeError::Decompress)?;
    let nn: NeuralNetwork = serde_json::from_slice(&json)?;
    nn.validate()?;
    Ok(nn)
}

/// Reads the little-endian size prefix and bounds it before decompressing.
fn decompress(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let invalid = |msg: &str| std::io::Error::new(std::io::ErrorKind::InvalidData, msg.to_string());
    let (prefix, body) = compressed
        .split_first_chunk::<4>()
        .ok_or_else(|| invalid("missing size prefix"))?;
    let size = i32::from_le_bytes(*prefix);
    if !(0..=MAX_DOCUMENT_BYTES).contains(&size) {
        return Err(invalid("size prefix out of range"));
    }
    lz4::block::decompress(body, Some(size))
}
