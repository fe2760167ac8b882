//! # Core Type Definitions
//!
//! This module contains all core types for the Tally aggregation engine:
//! - Entry identity (`EntityType`, `Tag`, `TagValue`, `ItemKey`)
//! - Raw container entries (`Stack`)
//! - Output structures (`ItemView`, `ViewGroup`, `GroupMeta`, `ScanResult`)
//! - Error types (`TallyError`)
//!
//! ## Ordering Guarantees
//!
//! Identity types implement `Ord` so they can key a `BTreeMap`.
//! Counts use saturating arithmetic to prevent overflow.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// ENTRY IDENTITY
// =============================================================================

/// The kind of thing an entry holds (e.g. `"minecraft:cobblestone"`).
///
/// An empty entity type is the "nothing here" marker of a slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityType(pub String);

impl EntityType {
    /// Create a new entity type from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the entity type as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the empty marker.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single value inside a [`Tag`].
///
/// Floats are deliberately absent so that tags stay `Eq + Ord + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<TagValue>),
    Compound(Tag),
}

/// Opaque per-entry metadata.
///
/// The engine only compares tags for equality and asks them for boolean
/// properties (see [`crate::exclusion::PropertyBag`]). Everything else is
/// carried through untouched.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Tag(BTreeMap<String, TagValue>);

impl Tag {
    /// Create an empty tag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: TagValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: TagValue) -> Option<TagValue> {
        self.0.insert(name.into(), value)
    }

    /// Look up a value by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.0.get(name)
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The identity under which duplicate entries are merged.
///
/// Two raw entries merge iff their keys are equal: same entity type and
/// equal (or both absent) tags.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    /// What the entry is.
    pub entity: EntityType,
    /// Optional metadata distinguishing otherwise identical entries.
    pub tag: Option<Tag>,
}

impl ItemKey {
    /// Create a key without metadata.
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: EntityType::new(entity),
            tag: None,
        }
    }

    /// Create a key carrying metadata.
    #[must_use]
    pub fn with_tag(entity: impl Into<String>, tag: Tag) -> Self {
        Self {
            entity: EntityType::new(entity),
            tag: Some(tag),
        }
    }

    /// Rebuild a display entry for this key with a merged count.
    #[must_use]
    pub fn to_view(&self, count: u64) -> ItemView {
        ItemView {
            key: self.clone(),
            count,
        }
    }
}

// =============================================================================
// RAW ENTRIES
// =============================================================================

/// A raw entry as found in a container slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stack {
    pub key: ItemKey,
    pub count: u32,
}

impl Stack {
    /// Create a new stack.
    #[must_use]
    pub fn new(key: ItemKey, count: u32) -> Self {
        Self { key, count }
    }

    /// The canonical empty slot.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            key: ItemKey::new(""),
            count: 0,
        }
    }

    /// A stack is empty if it holds nothing or is of the empty entity type.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.key.entity.is_empty()
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// One merged entry of a result: a key and its summed count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub key: ItemKey,
    pub count: u64,
}

/// Metadata attached to a [`ViewGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupMeta {
    /// Fraction of the container scanned, in `[0, 1)`.
    /// Absent once the content is fully resolved.
    pub progress: Option<f32>,
}

/// An ordered group of views handed to a renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewGroup {
    pub views: Vec<ItemView>,
    pub meta: GroupMeta,
}

impl ViewGroup {
    /// Create a group with no progress annotation.
    #[must_use]
    pub fn new(views: Vec<ItemView>) -> Self {
        Self {
            views,
            meta: GroupMeta::default(),
        }
    }
}

/// The output of one poll: an ordered list of view groups.
///
/// The collector always emits exactly one group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub groups: Vec<ViewGroup>,
}

impl ScanResult {
    /// Create a result holding a single group.
    #[must_use]
    pub fn single(group: ViewGroup) -> Self {
        Self {
            groups: vec![group],
        }
    }

    /// The first group, if any.
    #[must_use]
    pub fn group(&self) -> Option<&ViewGroup> {
        self.groups.first()
    }

    /// Mutable access to the first group, creating it if missing.
    pub fn group_mut(&mut self) -> &mut ViewGroup {
        if self.groups.is_empty() {
            self.groups.push(ViewGroup::default());
        }
        &mut self.groups[0]
    }

    /// Views of the first group (empty if there is no group).
    #[must_use]
    pub fn views(&self) -> &[ItemView] {
        self.group().map(|g| g.views.as_slice()).unwrap_or_default()
    }

    /// Progress annotation of the first group.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        self.group().and_then(|g| g.meta.progress)
    }

    /// Replace the progress annotation of the first group.
    pub fn set_progress(&mut self, progress: Option<f32>) {
        self.group_mut().meta.progress = progress;
    }

    /// Summed count for a key, if it is present.
    #[must_use]
    pub fn count_of(&self, key: &ItemKey) -> Option<u64> {
        self.views().iter().find(|v| &v.key == key).map(|v| v.count)
    }

    /// Number of distinct keys in the first group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views().is_empty()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Tally system.
///
/// The poll path never produces these: a missing container or a hidden
/// entry is a normal outcome, not an error. They come from configuration,
/// the wire format and scenario input.
#[derive(Debug, Error)]
pub enum TallyError {
    /// A configuration value is out of range.
    #[error("Invalid config field '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A scenario description could not be understood.
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_equal_tags_are_equal() {
        let a = ItemKey::with_tag("gem", Tag::new().with("Level", TagValue::Int(2)));
        let b = ItemKey::with_tag("gem", Tag::new().with("Level", TagValue::Int(2)));
        let c = ItemKey::with_tag("gem", Tag::new().with("Level", TagValue::Int(3)));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, ItemKey::new("gem"));
    }

    #[test]
    fn stack_emptiness() {
        assert!(Stack::empty().is_empty());
        assert!(Stack::new(ItemKey::new("stone"), 0).is_empty());
        assert!(Stack::new(ItemKey::new(""), 4).is_empty());
        assert!(!Stack::new(ItemKey::new("stone"), 1).is_empty());
    }

    #[test]
    fn scan_result_progress_slot() {
        let mut result = ScanResult::default();
        assert!(result.progress().is_none());

        result.set_progress(Some(0.25));
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.progress(), Some(0.25));

        result.set_progress(None);
        assert!(result.progress().is_none());
    }

    #[test]
    fn scan_result_count_lookup() {
        let key = ItemKey::new("dirt");
        let result = ScanResult::single(ViewGroup::new(vec![key.to_view(12)]));

        assert_eq!(result.count_of(&key), Some(12));
        assert_eq!(result.count_of(&ItemKey::new("sand")), None);
        assert_eq!(result.len(), 1);
    }
}
