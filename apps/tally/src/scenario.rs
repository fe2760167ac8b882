//! # Scenario Replay
//!
//! A scenario is a scripted inventory plus a timeline of mutations.
//! `Replay` applies the mutations at their tick and polls a collector once
//! per tick, the way a renderer would once per frame.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tally_core::{
    AggregationCache, CollectorConfig, InventoryContainer, ScanResult, SlottedIterator, Stack,
    TallyError, primitives::DEFAULT_BATCH_SIZE,
};

/// Maximum scenario file size (16 MB).
pub const MAX_SCENARIO_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Maximum slots a scenario can reach (initial slots plus pushes), and the
/// bound on slot indices `set` events may write.
pub const MAX_SCENARIO_SLOTS: usize = 1_000_000;

// =============================================================================
// SCENARIO FILE
// =============================================================================

/// One mutation of the scripted inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EventOp {
    /// Replace one slot.
    Set { slot: usize, stack: Stack },
    /// Append a slot.
    Push { stack: Stack },
    /// Empty every slot.
    Clear,
    /// Make the inventory unreachable (target resolves to nothing).
    Detach,
    /// Make the inventory reachable again.
    Attach,
}

/// A mutation scheduled at a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub tick: u64,
    #[serde(flatten)]
    pub op: EventOp,
}

/// A scripted inventory and its timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Slots read per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Initial slots.
    #[serde(default)]
    pub slots: Vec<Stack>,
    /// Mutations, applied in tick order.
    #[serde(default)]
    pub events: Vec<Event>,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Scenario {
    /// Parse and validate a scenario from JSON.
    pub fn from_json(source: &[u8]) -> Result<Self, TallyError> {
        let mut scenario: Self = serde_json::from_slice(source)
            .map_err(|e| TallyError::InvalidScenario(format!("JSON: {}", e)))?;
        scenario.validate()?;
        scenario.events.sort_by_key(|e| e.tick);
        Ok(scenario)
    }

    /// Read a scenario file, refusing oversized input.
    pub fn load(path: &Path) -> Result<Self, TallyError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            TallyError::IoError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(TallyError::IoError(format!(
                "Path '{}' is not a regular file",
                path.display()
            )));
        }
        if metadata.len() > MAX_SCENARIO_FILE_SIZE {
            return Err(TallyError::InvalidScenario(format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_SCENARIO_FILE_SIZE
            )));
        }
        let bytes = std::fs::read(path).map_err(|e| TallyError::IoError(e.to_string()))?;
        Self::from_json(&bytes)
    }

    /// Check sizes.
    pub fn validate(&self) -> Result<(), TallyError> {
        self.validate_within(MAX_SCENARIO_SLOTS)
    }

    /// Check sizes against a slot limit covering initial slots, pushes and
    /// `set` indices.
    fn validate_within(&self, max_slots: usize) -> Result<(), TallyError> {
        if self.batch_size == 0 {
            return Err(TallyError::InvalidScenario(
                "batch_size must be at least 1".to_string(),
            ));
        }
        let pushes = self
            .events
            .iter()
            .filter(|e| matches!(e.op, EventOp::Push { .. }))
            .count();
        let reachable = self.slots.len().saturating_add(pushes);
        if reachable > max_slots {
            return Err(TallyError::InvalidScenario(format!(
                "{} slots plus {} pushes exceeds maximum {}",
                self.slots.len(),
                pushes,
                max_slots
            )));
        }
        for event in &self.events {
            if let EventOp::Set { slot, .. } = event.op
                && slot >= max_slots
            {
                return Err(TallyError::InvalidScenario(format!(
                    "event at tick {} writes slot {} beyond maximum {}",
                    event.tick, slot, max_slots
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// WORKBENCH TARGET
// =============================================================================

/// The thing the collector points at: an inventory that may be detached.
#[derive(Debug, Clone, Default)]
pub struct Workbench {
    inventory: InventoryContainer,
    attached: bool,
}

impl Workbench {
    /// An attached workbench holding `slots`.
    #[must_use]
    pub fn new(slots: Vec<Stack>) -> Self {
        Self {
            inventory: InventoryContainer::with_slots(slots),
            attached: true,
        }
    }

    /// The inventory, if reachable.
    #[must_use]
    pub fn inventory(&self) -> Option<&InventoryContainer> {
        self.attached.then_some(&self.inventory)
    }

    /// Apply one mutation.
    pub fn apply(&mut self, op: &EventOp) {
        match op {
            EventOp::Set { slot, stack } => {
                self.inventory.set_slot(*slot, stack.clone());
            }
            EventOp::Push { stack } => self.inventory.push(stack.clone()),
            EventOp::Clear => self.inventory.clear(),
            EventOp::Detach => self.attached = false,
            EventOp::Attach => self.attached = true,
        }
    }
}

/// Iterator type used by the replay.
pub type WorkbenchIterator = SlottedIterator<Workbench, InventoryContainer>;

// =============================================================================
// REPLAY
// =============================================================================

/// What one poll produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    /// Events applied just before this poll.
    pub events_applied: usize,
    /// The result shown, if any.
    pub result: Option<ScanResult>,
    /// Whether this poll finalized a pass.
    pub finalized: bool,
}

impl TickReport {
    /// Sum of all counts shown.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.result
            .as_ref()
            .map(|r| r.views().iter().map(|v| v.count).sum())
            .unwrap_or(0)
    }
}

/// Drives a collector over a scenario.
#[derive(Debug)]
pub struct Replay {
    events: Vec<Event>,
    next_event: usize,
    bench: Workbench,
    collector: AggregationCache<WorkbenchIterator>,
}

impl Replay {
    /// Prepare a replay. Events must already be in tick order
    /// (`Scenario::from_json` sorts them).
    #[must_use]
    pub fn new(scenario: Scenario, config: CollectorConfig) -> Self {
        let iterator: WorkbenchIterator =
            SlottedIterator::new(Workbench::inventory, scenario.batch_size);
        Self {
            events: scenario.events,
            next_event: 0,
            bench: Workbench::new(scenario.slots),
            collector: AggregationCache::with_config(iterator, config),
        }
    }

    /// Apply due events, then poll once.
    pub fn step(&mut self, tick: u64) -> TickReport {
        let mut applied = 0;
        while let Some(event) = self.events.get(self.next_event) {
            if event.tick > tick {
                break;
            }
            tracing::debug!(tick, op = ?event.op, "applying event");
            self.bench.apply(&event.op);
            self.next_event += 1;
            applied += 1;
        }

        let result = self.collector.update(&self.bench, tick).cloned();
        let finalized = self
            .collector
            .cache()
            .is_some_and(|entry| entry.finished_at() == tick);

        TickReport {
            tick,
            events_applied: applied,
            result,
            finalized,
        }
    }

    /// Poll `count` consecutive ticks starting at `from`.
    pub fn run(&mut self, from: u64, count: u64) -> Vec<TickReport> {
        (from..from.saturating_add(count))
            .map(|tick| self.step(tick))
            .collect()
    }

    /// The collector being driven.
    #[must_use]
    pub fn collector(&self) -> &AggregationCache<WorkbenchIterator> {
        &self.collector
    }
}

// =============================================================================
// TESTS
// =============================================================================
