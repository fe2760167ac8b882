//! # Exclusion Module
//!
//! Decides which raw entries are dropped before merging.
//!
//! - Empty entries are always dropped
//! - Entries whose metadata carries a truthy property named `*<suffix>`
//!   (case-insensitive) are hidden
//! - Dropped entries still count as seen by the iterator
//!
//! The rule never looks at a concrete metadata schema. It only needs
//! something that can list property names and read a boolean.

use crate::primitives::DEFAULT_EXCLUSION_SUFFIX;
use crate::{Stack, Tag, TagValue};

/// Read-only access to a bag of named, typed properties.
pub trait PropertyBag {
    /// All property names at the top level of the bag.
    fn property_names(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    /// The boolean reading of a property, or `None` if it is absent or not
    /// boolean-like.
    fn bool_property(&self, name: &str) -> Option<bool>;
}

impl PropertyBag for Tag {
    fn property_names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(|(name, _)| name))
    }

    /// Integers read as booleans (`0` is false), matching byte-encoded flags.
    fn bool_property(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            TagValue::Bool(b) => Some(*b),
            TagValue::Int(n) => Some(*n != 0),
            _ => None,
        }
    }
}

/// The "hide this instance" convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRule {
    /// Lowercased suffix.
    suffix: String,
}

impl ExclusionRule {
    /// Create a rule for the given suffix (stored lowercased).
    #[must_use]
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_lowercase(),
        }
    }

    /// The lowercased suffix this rule matches.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Check whether a property bag asks to be hidden.
    pub fn hides<B: PropertyBag + ?Sized>(&self, bag: &B) -> bool {
        bag.property_names().any(|name| {
            name.to_lowercase().ends_with(&self.suffix) && bag.bool_property(name) == Some(true)
        })
    }

    /// Check whether a raw entry must be left out of the merge.
    pub fn excludes(&self, stack: &Stack) -> bool {
        if stack.is_empty() {
            return true;
        }
        stack.key.tag.as_ref().is_some_and(|tag| self.hides(tag))
    }
}

impl Default for ExclusionRule {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSION_SUFFIX)
    }
}

// =============================================================================
// TESTS
// =============================================================================
