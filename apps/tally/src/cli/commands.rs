//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::scenario::{Replay, Scenario, TickReport};
use std::path::{Path, PathBuf};
use tally_core::{
    CollectorConfig, MAX_WIRE_PAYLOAD_SIZE, ScanResult, TallyError, result_from_bytes,
    result_to_bytes,
};

// =============================================================================
// CONFIG RESOLUTION
// =============================================================================

/// Collector settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_entries: Option<usize>,
    pub throttle_ticks: Option<u64>,
}

/// Build the collector config: defaults, then file, then env, then flags.
pub fn resolve_config(
    file: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<CollectorConfig, TallyError> {
    let mut config = match file {
        Some(path) => {
            tracing::debug!("Loading collector config from {:?}", path);
            CollectorConfig::load(path)?
        }
        None => CollectorConfig::default(),
    };

    config.apply_env_overrides()?;

    if let Some(max_entries) = overrides.max_entries {
        config.max_entries = max_entries;
    }
    if let Some(throttle_ticks) = overrides.throttle_ticks {
        config.throttle_ticks = throttle_ticks;
    }
    config.validate()?;
    Ok(config)
}

/// Resolve an output path against its canonical parent directory.
///
/// The parent directory must already exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, TallyError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        TallyError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    let filename = path
        .file_name()
        .ok_or_else(|| TallyError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Replay a scenario and print every tick.
pub fn cmd_run(
    file: &Path,
    config: CollectorConfig,
    json_mode: bool,
    from: u64,
    ticks: u64,
) -> Result<(), TallyError> {
    tracing::info!("Replaying {:?} for {} ticks from tick {}", file, ticks, from);

    let scenario = Scenario::load(file)?;
    let mut replay = Replay::new(scenario, config);
    let reports = replay.run(from, ticks);

    if json_mode {
        let output = serde_json::to_string_pretty(&reports)
            .map_err(|e| TallyError::SerializationError(e.to_string()))?;
        println!("{}", output);
        return Ok(());
    }

    println!("Tally Replay");
    println!("============");
    println!("Scenario: {:?}", file);
    println!();
    for report in &reports {
        println!("{}", format_report(report));
    }

    if let Some(last) = reports.iter().rev().find_map(|r| r.result.as_ref()) {
        println!();
        print!("{}", format_result(last));
    }

    Ok(())
}

/// One line per tick.
#[must_use]
pub fn format_report(report: &TickReport) -> String {
    let mut line = format!("tick {:>6} |", report.tick);
    match &report.result {
        None => line.push_str(" nothing to show"),
        Some(result) => {
            line.push_str(&format!(
                " {:>2} keys | {:>8} items",
                result.len(),
                report.total_count()
            ));
            if let Some(progress) = result.progress() {
                line.push_str(&format!(" | scanning {:.2}", progress));
            }
        }
    }
    if report.events_applied > 0 {
        line.push_str(&format!(" | {} event(s)", report.events_applied));
    }
    if report.finalized {
        line.push_str(" | finalized");
    }
    line
}

/// Multi-line listing of a result's entries.
#[must_use]
pub fn format_result(result: &ScanResult) -> String {
    let mut out = String::new();
    for view in result.views() {
        let tagged = if view.key.tag.is_some() { " (tagged)" } else { "" };
        out.push_str(&format!(
            "  {:>8} x {}{}\n",
            view.count,
            view.key.entity.as_str(),
            tagged
        ));
    }
    if result.is_empty() {
        out.push_str("  (empty)\n");
    }
    out
}

// =============================================================================
// SNAPSHOT COMMAND
// =============================================================================

/// Replay a scenario and write the last shown result in wire format.
pub fn cmd_snapshot(
    file: &Path,
    output: &Path,
    config: CollectorConfig,
    ticks: u64,
) -> Result<(), TallyError> {
    let validated_output = validate_output_path(output)?;

    let scenario = Scenario::load(file)?;
    let mut replay = Replay::new(scenario, config);
    let last = replay
        .run(0, ticks)
        .into_iter()
        .rev()
        .find_map(|r| r.result)
        .ok_or_else(|| {
            TallyError::InvalidScenario(format!("no result was shown within {} ticks", ticks))
        })?;

    let bytes = result_to_bytes(&last)?;
    std::fs::write(&validated_output, &bytes)
        .map_err(|e| TallyError::IoError(format!("Write file: {}", e)))?;

    tracing::info!(
        "Wrote {} bytes ({} keys) to {:?}",
        bytes.len(),
        last.len(),
        validated_output
    );
    Ok(())
}

// =============================================================================
// DECODE COMMAND
// =============================================================================

/// Decode and print a wire-format result.
pub fn cmd_decode(input: &Path, json_mode: bool) -> Result<(), TallyError> {
    let metadata = std::fs::metadata(input)
        .map_err(|e| TallyError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_WIRE_PAYLOAD_SIZE as u64 {
        return Err(TallyError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_WIRE_PAYLOAD_SIZE
        )));
    }

    let bytes =
        std::fs::read(input).map_err(|e| TallyError::IoError(format!("Read file: {}", e)))?;
    let result = result_from_bytes(&bytes)?;

    if json_mode {
        let output = serde_json::to_string_pretty(&result)
            .map_err(|e| TallyError::SerializationError(e.to_string()))?;
        println!("{}", output);
        return Ok(());
    }

    println!("Decoded {} key(s) from {:?}", result.len(), input);
    if let Some(progress) = result.progress() {
        println!("Partial result, scan at {:.2}", progress);
    }
    print!("{}", format_result(&result));
    Ok(())
}

// =============================================================================
// CONFIG COMMAND
// =============================================================================

/// Print the effective collector configuration as TOML.
pub fn cmd_config(config: &CollectorConfig) -> Result<(), TallyError> {
    print!("{}", config.to_toml()?);
    Ok(())
}
