//! # Content Iterators
//!
//! The strategy a collector uses to walk one kind of container.
//!
//! A `ContentIterator` owns its cursor. The collector only asks it for the
//! next batch, tells it how many entries were seen, and reads back whether
//! the pass is finished and how far along it is.
//!
//! This module also ships one concrete strategy, `SlottedIterator`, which
//! reads a fixed number of slots per poll from anything implementing
//! `SlottedContainer`.

use crate::primitives::DEFAULT_BATCH_SIZE;
use crate::Stack;

// =============================================================================
// CONTENT ITERATOR
// =============================================================================

/// Capability object for enumerating a container across many polls.
pub trait ContentIterator {
    /// What the caller points at (a block, an entity, a screen...).
    type Target: ?Sized;
    /// The container found behind a target.
    type Container: ?Sized;

    /// Resolve the container behind `target`, if there is one.
    fn locate<'t>(&self, target: &'t Self::Target) -> Option<&'t Self::Container>;

    /// A number that changes whenever the container's content changes.
    fn version_of(&self, container: &Self::Container) -> u64;

    /// The next unseen batch of the current pass.
    ///
    /// Cheap containers may return everything at once.
    fn next_batch(&mut self, container: &Self::Container) -> Vec<Stack>;

    /// Whether the current pass has consumed all content.
    fn is_finished(&self) -> bool;

    /// Fraction of the pass completed; `NaN` when unknown.
    fn progress(&self) -> f32;

    /// Restart the pass from the beginning.
    fn reset(&mut self);

    /// Bookkeeping after a batch was folded. `seen` counts every entry of
    /// the batch, excluded ones included.
    fn after_batch(&mut self, seen: usize);
}

// =============================================================================
// SLOTTED CONTAINERS
// =============================================================================

/// A container addressed by slot index.
pub trait SlottedContainer {
    /// Number of slots, empty ones included.
    fn slot_count(&self) -> usize;

    /// Content of slot `index`, or `None` past the end.
    fn slot(&self, index: usize) -> Option<Stack>;

    /// Content version, bumped on every change.
    fn version(&self) -> u64;
}

/// Locates a slotted container inside a target.
pub type Locator<T, C> = fn(&T) -> Option<&C>;

/// Reads a slotted container `batch_size` slots per poll.
pub struct SlottedIterator<T: ?Sized, C: ?Sized> {
    locator: Locator<T, C>,
    batch_size: usize,
    cursor: usize,
    slot_count: usize,
    started: bool,
}

impl<T: ?Sized, C: ?Sized> std::fmt::Debug for SlottedIterator<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlottedIterator")
            .field("batch_size", &self.batch_size)
            .field("cursor", &self.cursor)
            .field("slot_count", &self.slot_count)
            .field("started", &self.started)
            .finish()
    }
}

impl<T: ?Sized, C: ?Sized> SlottedIterator<T, C> {
    /// Create an iterator that finds its container through `locator`.
    ///
    /// A `batch_size` of zero is treated as one.
    #[must_use]
    pub fn new(locator: Locator<T, C>, batch_size: usize) -> Self {
        Self {
            locator,
            batch_size: batch_size.max(1),
            cursor: 0,
            slot_count: 0,
            started: false,
        }
    }

    /// Number of slots per batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Index of the next slot to read.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<C: ?Sized> SlottedIterator<C, C> {
    /// Iterator whose target is the container itself.
    #[must_use]
    pub fn direct(batch_size: usize) -> Self {
        Self::new(|container| Some(container), batch_size)
    }

    /// Iterator that reads the whole container in a single batch.
    #[must_use]
    pub fn all_at_once() -> Self {
        Self::direct(usize::MAX)
    }
}

impl<C: ?Sized> Default for SlottedIterator<C, C> {
    fn default() -> Self {
        Self::direct(DEFAULT_BATCH_SIZE)
    }
}

impl<T: ?Sized, C: SlottedContainer + ?Sized> ContentIterator for SlottedIterator<T, C> {
    type Target = T;
    type Container = C;

    fn locate<'t>(&self, target: &'t T) -> Option<&'t C> {
        (self.locator)(target)
    }

    fn version_of(&self, container: &C) -> u64 {
        container.version()
    }

    fn next_batch(&mut self, container: &C) -> Vec<Stack> {
        self.started = true;
        self.slot_count = container.slot_count();
        let end = self.cursor.saturating_add(self.batch_size).min(self.slot_count);
        (self.cursor..end)
            .map(|i| container.slot(i).unwrap_or_else(Stack::empty))
            .collect()
    }

    fn is_finished(&self) -> bool {
        self.started && self.cursor >= self.slot_count
    }

    #[allow(clippy::float_arithmetic)]
    fn progress(&self) -> f32 {
        if !self.started {
            return f32::NAN;
        }
        if self.slot_count == 0 {
            return 1.0;
        }
        self.cursor as f32 / self.slot_count as f32
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.slot_count = 0;
        self.started = false;
    }

    fn after_batch(&mut self, seen: usize) {
        self.cursor = self.cursor.saturating_add(seen);
    }
}

// =============================================================================
// IN-MEMORY INVENTORY
// =============================================================================

/// A plain list of slots with a change counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryContainer {
    slots: Vec<Stack>,
    version: u64,
}

impl InventoryContainer {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inventory from existing slots.
    #[must_use]
    pub fn with_slots(slots: Vec<Stack>) -> Self {
        Self { slots, version: 0 }
    }

    /// Replace a slot, growing the inventory with empty slots if needed.
    ///
    /// Returns `false` and leaves the inventory untouched when `index` is
    /// `usize::MAX`, which no slot list can reach.
    pub fn set_slot(&mut self, index: usize, stack: Stack) -> bool {
        let Some(len) = index.checked_add(1) else {
            return false;
        };
        if len > self.slots.len() {
            self.slots.resize_with(len, Stack::empty);
        }
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = stack;
        }
        self.touch();
        true
    }

    /// Append a slot.
    pub fn push(&mut self, stack: Stack) {
        self.slots.push(stack);
        self.touch();
    }

    /// Empty every slot, keeping the slot count.
    pub fn clear(&mut self) {
        self.slots.fill_with(Stack::empty);
        self.touch();
    }

    /// All slots in index order.
    #[must_use]
    pub fn slots(&self) -> &[Stack] {
        &self.slots
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

impl SlottedContainer for InventoryContainer {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> Option<Stack> {
        self.slots.get(index).cloned()
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ItemKey;

    fn inventory(n: usize) -> InventoryContainer {
        InventoryContainer::with_slots(
            (0..n)
                .map(|i| Stack::new(ItemKey::new(format!("item{i}")), 1))
                .collect(),
        )
    }

    #[test]
    fn reads_in_bounded_batches() {
        let inv = inventory(5);
        let mut it = SlottedIterator::direct(2);

        let batch = it.next_batch(&inv);
        assert_eq!(batch.len(), 2);
        it.after_batch(batch.len());
        assert!(!it.is_finished());
        assert_eq!(it.progress(), 0.4);

        let batch = it.next_batch(&inv);
        it.after_batch(batch.len());
        let batch = it.next_batch(&inv);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].key, ItemKey::new("item4"));
        it.after_batch(batch.len());

        assert!(it.is_finished());
        assert!(it.progress() >= 1.0);
    }

    #[test]
    fn progress_is_unknown_before_first_batch() {
        let it: SlottedIterator<InventoryContainer, InventoryContainer> = SlottedIterator::default();
        assert!(it.progress().is_nan());
        assert!(!it.is_finished());
    }

    #[test]
    fn empty_container_finishes_immediately() {
        let inv = InventoryContainer::new();
        let mut it = SlottedIterator::direct(8);

        let batch = it.next_batch(&inv);
        it.after_batch(batch.len());

        assert!(batch.is_empty());
        assert!(it.is_finished());
        assert!(it.progress() >= 1.0);
    }

    #[test]
    fn reset_rewinds() {
        let inv = inventory(3);
        let mut it = SlottedIterator::all_at_once();
        let batch = it.next_batch(&inv);
        it.after_batch(batch.len());
        assert!(it.is_finished());

        it.reset();
        assert_eq!(it.cursor(), 0);
        assert!(!it.is_finished());
        assert_eq!(it.next_batch(&inv).len(), 3);
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let it: SlottedIterator<InventoryContainer, InventoryContainer> =
            SlottedIterator::direct(0);
        assert_eq!(it.batch_size(), 1);
    }

    #[test]
    fn inventory_mutations_bump_version() {
        let mut inv = InventoryContainer::new();
        let v0 = inv.version();

        inv.push(Stack::new(ItemKey::new("a"), 1));
        inv.set_slot(3, Stack::new(ItemKey::new("b"), 1));
        assert_eq!(inv.slot_count(), 4);
        assert!(inv.slot(1).is_some_and(|s| s.is_empty()));

        inv.clear();
        assert_eq!(inv.slot_count(), 4);
        assert!(inv.slots().iter().all(Stack::is_empty));
        assert_eq!(inv.version(), v0 + 3);
    }

    #[test]
    fn unreachable_slot_index_is_refused() {
        let mut inv = InventoryContainer::with_slots(vec![Stack::new(ItemKey::new("a"), 1)]);
        let v0 = inv.version();

        assert!(!inv.set_slot(usize::MAX, Stack::new(ItemKey::new("b"), 1)));
        assert_eq!(inv.slot_count(), 1);
        assert_eq!(inv.version(), v0);

        assert!(inv.set_slot(0, Stack::new(ItemKey::new("b"), 1)));
        assert_eq!(inv.version(), v0 + 1);
    }

    #[test]
    fn locator_reaches_into_target() {
        struct Chest {
            inventory: Option<InventoryContainer>,
        }

        let it: SlottedIterator<Chest, InventoryContainer> =
            SlottedIterator::new(|chest| chest.inventory.as_ref(), 4);

        assert!(it.locate(&Chest { inventory: None }).is_none());
        assert!(it.locate(&Chest { inventory: Some(inventory(1)) }).is_some());
    }
}
