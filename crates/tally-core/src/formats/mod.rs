//! # Formats Module
//!
//! Byte-level encodings of Tally results.
//!
//! File and socket I/O live in the app layer; this module only turns
//! values into bytes and back.

mod wire;

pub use wire::*;
