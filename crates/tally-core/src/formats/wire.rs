//! # Wire Format
//!
//! Binary encoding of a `ScanResult` for shipping to a remote display.
//!
//! Format: Header (5 bytes) + postcard-serialized result.
//! - 4 bytes: Magic ("TALY")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded.

use crate::{primitives, ScanResult, TallyError};

/// Maximum accepted encoded size.
///
/// A full result is 54 keys with their tags; 4 MB leaves room for heavy
/// metadata while refusing garbage early.
pub const MAX_WIRE_PAYLOAD_SIZE: usize = 4 * 1024 * 1024;

/// Header size in bytes.
const HEADER_SIZE: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// Magic bytes followed by the format version.
fn encode_header() -> [u8; HEADER_SIZE] {
    let mut header = [primitives::FORMAT_VERSION; HEADER_SIZE];
    header[..4].copy_from_slice(primitives::MAGIC_BYTES);
    header
}

/// Split off the header and return the payload behind it.
fn check_header(bytes: &[u8]) -> Result<&[u8], TallyError> {
    let Some((header, payload)) = bytes.split_first_chunk::<HEADER_SIZE>() else {
        return Err(TallyError::DeserializationError(
            "Header too short".to_string(),
        ));
    };
    let [magic @ .., version] = header;
    if magic != primitives::MAGIC_BYTES {
        return Err(TallyError::DeserializationError(
            "Invalid magic bytes".to_string(),
        ));
    }
    if *version != primitives::FORMAT_VERSION {
        return Err(TallyError::DeserializationError(format!(
            "Unsupported version: {} (expected {})",
            version,
            primitives::FORMAT_VERSION
        )));
    }
    Ok(payload)
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode a result (header + payload).
pub fn result_to_bytes(result: &ScanResult) -> Result<Vec<u8>, TallyError> {
    let payload = postcard::to_stdvec(result)
        .map_err(|e| TallyError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&encode_header());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a result.
pub fn result_from_bytes(bytes: &[u8]) -> Result<ScanResult, TallyError> {
    if bytes.len() > MAX_WIRE_PAYLOAD_SIZE {
        return Err(TallyError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_WIRE_PAYLOAD_SIZE
        )));
    }

    let payload = check_header(bytes)?;
    postcard::from_bytes(payload).map_err(|e| {
        TallyError::DeserializationError(format!("Failed to decode result: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ItemKey, Tag, TagValue, ViewGroup};

    fn sample() -> ScanResult {
        let tag = Tag::new()
            .with("Enchanted", TagValue::Bool(true))
            .with("Lore", TagValue::List(vec![TagValue::Str("old".into())]));
        let mut result = ScanResult::single(ViewGroup::new(vec![
            ItemKey::new("stone").to_view(64),
            ItemKey::with_tag("sword", tag).to_view(1),
        ]));
        result.set_progress(Some(0.5));
        result
    }

    #[test]
    fn header_layout() {
        let bytes = result_to_bytes(&sample()).expect("encode");
        assert_eq!(&bytes[0..4], b"TALY");
        assert_eq!(bytes[4], primitives::FORMAT_VERSION);
    }

    #[test]
    fn check_header_strips_exactly_the_header() {
        let mut bytes = encode_header().to_vec();
        assert_eq!(check_header(&bytes).expect("header"), &[] as &[u8]);

        bytes.extend_from_slice(&[7, 8]);
        assert_eq!(check_header(&bytes).expect("header"), &[7, 8]);
        assert!(check_header(&bytes[..HEADER_SIZE - 1]).is_err());
    }

    #[test]
    fn encoded_result_decodes_identically() {
        let result = sample();
        let bytes = result_to_bytes(&result).expect("encode");
        assert_eq!(result_from_bytes(&bytes).expect("decode"), result);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = result_to_bytes(&sample()).expect("encode");
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(result_from_bytes(&bytes).is_err());
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = result_to_bytes(&sample()).expect("encode");
        bytes[4] = primitives::FORMAT_VERSION + 1;
        assert!(matches!(
            result_from_bytes(&bytes),
            Err(TallyError::DeserializationError(msg)) if msg.contains("Unsupported version")
        ));
    }

    #[test]
    fn truncated_input_rejected() {
        assert!(result_from_bytes(b"TAL").is_err());
        let bytes = result_to_bytes(&sample()).expect("encode");
        assert!(result_from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }
}
