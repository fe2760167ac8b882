//! # Collector Configuration
//!
//! TOML-backed settings for `AggregationCache`.
//!
//! Resolution order (highest priority first), applied by the binary:
//! 1. CLI flags
//! 2. Environment variables (`TALLY_*`)
//! 3. Config file
//! 4. Compiled defaults (`primitives`)

use crate::primitives::{DEFAULT_EXCLUSION_SUFFIX, MAX_ENTRIES, THROTTLE_TICKS};
use crate::TallyError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding `max_entries`.
pub const ENV_MAX_ENTRIES: &str = "TALLY_MAX_ENTRIES";

/// Environment variable overriding `throttle_ticks`.
pub const ENV_THROTTLE_TICKS: &str = "TALLY_THROTTLE_TICKS";

/// Environment variable overriding `exclusion_suffix`.
pub const ENV_EXCLUSION_SUFFIX: &str = "TALLY_EXCLUSION_SUFFIX";

/// Knobs of one collector. Defaults reproduce the fixed display contract:
/// 54 entries, 5-tick throttle, `*clear` hides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Maximum distinct keys in a result.
    pub max_entries: usize,
    /// Ticks to wait after a finalized pass before rescanning a changed container.
    pub throttle_ticks: u64,
    /// Case-insensitive property suffix marking hidden entries.
    pub exclusion_suffix: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_entries: MAX_ENTRIES,
            throttle_ticks: THROTTLE_TICKS,
            exclusion_suffix: DEFAULT_EXCLUSION_SUFFIX.to_string(),
        }
    }
}

impl CollectorConfig {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(source: &str) -> Result<Self, TallyError> {
        let config: Self = toml::from_str(source)
            .map_err(|e| TallyError::DeserializationError(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TallyError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            TallyError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&source)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, TallyError> {
        toml::to_string(self).map_err(|e| TallyError::SerializationError(e.to_string()))
    }

    /// Apply `TALLY_*` overrides read through `lookup`.
    ///
    /// Unparseable numbers are reported, not ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), TallyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_ENTRIES) {
            self.max_entries = parse_number(ENV_MAX_ENTRIES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_THROTTLE_TICKS) {
            self.throttle_ticks = parse_number(ENV_THROTTLE_TICKS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_EXCLUSION_SUFFIX) {
            self.exclusion_suffix = raw;
        }
        self.validate()
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), TallyError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), TallyError> {
        if self.max_entries == 0 {
            return Err(TallyError::InvalidConfig {
                field: "max_entries".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.exclusion_suffix.is_empty() {
            return Err(TallyError::InvalidConfig {
                field: "exclusion_suffix".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<N: std::str::FromStr>(field: &str, raw: &str) -> Result<N, TallyError> {
    raw.trim().parse().map_err(|_| TallyError::InvalidConfig {
        field: field.to_string(),
        message: format!("'{}' is not a valid number", raw),
    })
}

// =============================================================================
// TESTS
// =============================================================================
