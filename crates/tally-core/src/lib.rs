//! # tally-core
//!
//! The incremental aggregation engine for Tally - THE LOGIC.
//!
//! This crate summarizes the contents of a dynamic, possibly slow to
//! enumerate container into a deduplicated, count-merged, size-bounded list
//! that a renderer can show every frame.
//!
//! ## Pieces
//!
//! - `types`: keys, raw stacks, result views, errors
//! - `exclusion`: the "hide this instance" rule over a property bag
//! - `accumulator`: insertion-ordered running counts of a pass
//! - `iterator`: the `ContentIterator` strategy and a slotted implementation
//! - `collector`: `AggregationCache`, the poll-driven core
//! - `config`: TOML-backed collector settings
//! - `formats`: binary encoding of results
//!
//! ## Architectural Constraints
//!
//! - Single-threaded and poll-driven: work only happens inside `update`
//! - Long scans are amortized over many polls, never done in one call
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod accumulator;
pub mod collector;
pub mod config;
pub mod exclusion;
pub mod formats;
pub mod iterator;
pub mod primitives;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    EntityType, GroupMeta, ItemKey, ItemView, ScanResult, Stack, Tag, TagValue, TallyError,
    ViewGroup,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use accumulator::Accumulator;
pub use collector::{AggregationCache, CacheEntry, normalize_progress};
pub use config::CollectorConfig;
pub use exclusion::{ExclusionRule, PropertyBag};
pub use iterator::{
    ContentIterator, InventoryContainer, Locator, SlottedContainer, SlottedIterator,
};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{MAX_WIRE_PAYLOAD_SIZE, result_from_bytes, result_to_bytes};
