//! # Accumulator Module
//!
//! The running counts of an in-progress pass.
//!
//! - Unique keys, summed counts
//! - Iteration order = first-encounter order
//! - Volatile: cleared when a pass finalizes

use crate::exclusion::ExclusionRule;
use crate::{ItemKey, ItemView, Stack};
use std::collections::BTreeMap;

/// Insertion-ordered `ItemKey -> count` map.
///
/// `index` maps a key to its position in `entries`; `entries` holds the
/// keys in the order they were first seen.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    index: BTreeMap<ItemKey, usize>,
    entries: Vec<(ItemKey, u64)>,
}

impl Accumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to `key`, inserting it at the end if unseen.
    pub fn add(&mut self, key: ItemKey, count: u64) {
        if let Some(&pos) = self.index.get(&key) {
            let total = &mut self.entries[pos].1;
            *total = total.saturating_add(count);
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, count));
        }
    }

    /// Fold a batch of raw entries, skipping the excluded ones.
    ///
    /// Returns how many entries were seen, excluded ones included.
    pub fn fold(&mut self, batch: Vec<Stack>, rule: &ExclusionRule) -> usize {
        let seen = batch.len();
        for stack in batch {
            if !rule.excludes(&stack) {
                self.add(stack.key, u64::from(stack.count));
            }
        }
        seen
    }

    /// Summed count for a key.
    #[must_use]
    pub fn count_of(&self, key: &ItemKey) -> Option<u64> {
        self.index.get(key).map(|&pos| self.entries[pos].1)
    }

    /// Iterate `(key, count)` in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, u64)> {
        self.entries.iter().map(|(k, c)| (k, *c))
    }

    /// The first `limit` entries as display views.
    #[must_use]
    pub fn views(&self, limit: usize) -> Vec<ItemView> {
        self.entries
            .iter()
            .take(limit)
            .map(|(key, count)| key.to_view(*count))
            .collect()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
