//! # Collector Module
//!
//! `AggregationCache`: the poll-driven engine that turns a container's
//! raw entries into a merged, bounded `ScanResult`.
//!
//! One `update` call does at most one batch of work:
//! - unchanged container → cached result, no scan
//! - changed container, inside the throttle window → cached result, no scan
//! - changed container, window elapsed → reset the iterator, start a pass
//! - pass in progress → fold the next batch, return a partial view
//! - pass finished → build the final result, cache it, clear the accumulator
//!
//! A missing iterator or container yields `None`. Nothing here fails.

use crate::accumulator::Accumulator;
use crate::config::CollectorConfig;
use crate::exclusion::ExclusionRule;
use crate::iterator::ContentIterator;
use crate::{ScanResult, ViewGroup};

/// Normalize a raw progress reading for display.
///
/// `NaN` reads as 0; anything at or above 1 means fully resolved and
/// drops the annotation.
#[must_use]
pub fn normalize_progress(raw: f32) -> Option<f32> {
    let progress = if raw.is_nan() { 0.0 } else { raw };
    if progress >= 1.0 {
        None
    } else {
        Some(progress)
    }
}

/// The last finalized result and when it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    result: ScanResult,
    version: u64,
    finished_at: u64,
}

impl CacheEntry {
    /// The cached result.
    #[must_use]
    pub fn result(&self) -> &ScanResult {
        &self.result
    }

    /// Container version observed when the pass finalized.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Tick at which the pass finalized.
    #[must_use]
    pub fn finished_at(&self) -> u64 {
        self.finished_at
    }
}

/// What to do with a poll once the cache has been consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    /// Content unchanged since the last pass.
    Fresh,
    /// Content changed but the last pass is too recent.
    Throttled,
    /// Start a new pass.
    Rescan,
    /// No finished pass to reuse; keep scanning.
    Continue,
}

/// Incremental aggregation cache for one display context.
///
/// The collector owns every counter it needs; there is no shared state.
/// It is driven by repeated `update` calls from a single owner.
#[derive(Debug)]
pub struct AggregationCache<I: ContentIterator> {
    iterator: Option<I>,
    config: CollectorConfig,
    exclusion: ExclusionRule,
    accumulator: Accumulator,
    cache: Option<CacheEntry>,
    /// Result shown while the very first pass is still running.
    partial: Option<ScanResult>,
}

impl<I: ContentIterator> AggregationCache<I> {
    /// Create a collector with the default configuration.
    #[must_use]
    pub fn new(iterator: I) -> Self {
        Self::with_config(iterator, CollectorConfig::default())
    }

    /// Create a collector with an explicit configuration.
    #[must_use]
    pub fn with_config(iterator: I, config: CollectorConfig) -> Self {
        Self::build(Some(iterator), config)
    }

    /// A collector with no iterator. Every poll yields `None`.
    #[must_use]
    pub fn empty() -> Self {
        Self::build(None, CollectorConfig::default())
    }

    fn build(iterator: Option<I>, config: CollectorConfig) -> Self {
        Self {
            iterator,
            exclusion: ExclusionRule::new(&config.exclusion_suffix),
            config,
            accumulator: Accumulator::new(),
            cache: None,
            partial: None,
        }
    }

    /// Poll once.
    ///
    /// Returns the result to display for `target` at `tick`, or `None`
    /// when there is nothing to show. While a pass is running on top of an
    /// older result, that older result is returned with refreshed progress,
    /// so the same storage backs consecutive partial polls.
    pub fn update(&mut self, target: &I::Target, tick: u64) -> Option<&ScanResult> {
        let first_pass = self.starts_first_pass();
        let iterator = self.iterator.as_mut()?;
        let container = iterator.locate(target)?;
        let version = iterator.version_of(container);

        let decision = match &self.cache {
            Some(entry) if iterator.is_finished() => {
                if entry.version == version {
                    Decision::Fresh
                } else if tick.saturating_sub(entry.finished_at) < self.config.throttle_ticks {
                    Decision::Throttled
                } else {
                    Decision::Rescan
                }
            }
            _ => Decision::Continue,
        };

        match decision {
            Decision::Fresh | Decision::Throttled => {
                tracing::trace!(?decision, version, tick, "serving cached result");
                return self.cache.as_ref().map(|entry| &entry.result);
            }
            Decision::Rescan => {
                tracing::debug!(version, tick, "container changed, starting new pass");
                iterator.reset();
            }
            Decision::Continue if first_pass => {
                tracing::debug!(version, tick, "starting first pass");
            }
            Decision::Continue => {}
        }

        let batch = iterator.next_batch(container);
        let seen = self.accumulator.fold(batch, &self.exclusion);
        iterator.after_batch(seen);

        let progress = normalize_progress(iterator.progress());
        let limit = self.config.max_entries;

        if !iterator.is_finished() {
            tracing::trace!(seen, pending = self.accumulator.len(), "pass in progress");
            if let Some(entry) = self.cache.as_mut() {
                entry.result.set_progress(progress);
                return Some(&entry.result);
            }
            let partial = self.partial.get_or_insert_with(ScanResult::default);
            let group = partial.group_mut();
            group.views = self.accumulator.views(limit);
            group.meta.progress = progress;
            return Some(&*partial);
        }

        let mut result = ScanResult::single(ViewGroup::new(self.accumulator.views(limit)));
        result.set_progress(progress);
        tracing::debug!(
            version,
            tick,
            distinct = self.accumulator.len(),
            kept = result.len(),
            "pass finalized"
        );
        self.accumulator.clear();
        self.partial = None;

        let entry = self.cache.insert(CacheEntry {
            result,
            version,
            finished_at: tick,
        });
        Some(&entry.result)
    }

    /// Whether the next batch opens the very first pass.
    fn starts_first_pass(&self) -> bool {
        self.cache.is_none() && self.partial.is_none() && self.accumulator.is_empty()
    }

    /// The last finalized pass, if any.
    #[must_use]
    pub fn cache(&self) -> Option<&CacheEntry> {
        self.cache.as_ref()
    }

    /// Number of distinct keys gathered by the pass in progress.
    #[must_use]
    pub fn pending_keys(&self) -> usize {
        self.accumulator.len()
    }

    /// Whether an iterator is configured.
    #[must_use]
    pub fn has_iterator(&self) -> bool {
        self.iterator.is_some()
    }

    /// The configured iterator.
    #[must_use]
    pub fn iterator(&self) -> Option<&I> {
        self.iterator.as_ref()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }
}

// =============================================================================
// TESTS
// =============================================================================
