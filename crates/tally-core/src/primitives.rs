//! # Innate Primitives
//!
//! Hardcoded defaults and limits for the Tally CORE.
//!
//! `CollectorConfig` starts from these values; the wire format constants
//! are fixed.

/// Maximum number of distinct keys in one result.
///
/// - The first `MAX_ENTRIES` keys encountered survive.
/// - Anything beyond is dropped silently, never reordered.
pub const MAX_ENTRIES: usize = 54;

/// Minimum number of ticks between the end of one pass and the start of
/// the next, even when the container version has changed.
pub const THROTTLE_TICKS: u64 = 5;

/// Property name suffix that marks an entry as hidden when its value is true.
///
/// Compared case-insensitively.
pub const DEFAULT_EXCLUSION_SUFFIX: &str = "clear";

/// Default number of slots a `SlottedIterator` reads per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Magic bytes for the Tally wire format header.
pub const MAGIC_BYTES: &[u8; 4] = b"TALY";

/// Current wire format version.
///
/// Increment this when making breaking changes to the result layout.
pub const FORMAT_VERSION: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_bound_is_six_rows_of_nine() {
        assert_eq!(MAX_ENTRIES, 6 * 9);
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"TALY");
    }
}
