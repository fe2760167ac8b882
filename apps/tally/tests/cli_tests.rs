//! Integration tests for scenario replay and CLI commands.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use std::io::Write;
use tally::cli::{
    ConfigOverrides, cmd_config, cmd_decode, cmd_run, cmd_snapshot, format_report, format_result,
    resolve_config,
};
use tally::scenario::{Replay, Scenario, TickReport};
use tally_core::{CollectorConfig, ItemKey, TallyError, result_from_bytes};

const CHEST: &str = r#"{
    "batch_size": 2,
    "slots": [
        {"key": {"entity": "stone"}, "count": 64},
        {"key": {"entity": "dirt"}, "count": 10},
        {"key": {"entity": "stone"}, "count": 1},
        {"key": {"entity": "gem", "tag": {"clear": {"bool": true}}}, "count": 3},
        {"key": {"entity": "gem"}, "count": 2}
    ],
    "events": [
        {"tick": 6, "op": "set", "slot": 1, "stack": {"key": {"entity": "dirt"}, "count": 11}},
        {"tick": 20, "op": "detach"}
    ]
}"#;

fn write_scenario(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("scenario.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

fn count(report: &TickReport, name: &str) -> u64 {
    report
        .result
        .as_ref()
        .and_then(|r| r.count_of(&ItemKey::new(name)))
        .unwrap_or(0)
}

// =============================================================================
// REPLAY TESTS
// =============================================================================

#[test]
fn test_replay_amortizes_then_finalizes() {
    let scenario = Scenario::from_json(CHEST.as_bytes()).unwrap();
    let mut replay = Replay::new(scenario, CollectorConfig::default());

    let reports = replay.run(0, 3);

    // Five slots at two per poll: partial, partial, final.
    assert!(reports[0].result.as_ref().unwrap().progress().is_some());
    assert!(reports[1].result.as_ref().unwrap().progress().is_some());
    assert!(reports[2].finalized);
    assert_eq!(reports[2].result.as_ref().unwrap().progress(), None);

    assert_eq!(count(&reports[2], "stone"), 65);
    assert_eq!(count(&reports[2], "dirt"), 10);
    assert_eq!(count(&reports[2], "gem"), 2);
}

#[test]
fn test_replay_hides_cleared_entries() {
    let scenario = Scenario::from_json(CHEST.as_bytes()).unwrap();
    let mut replay = Replay::new(scenario, CollectorConfig::default());

    let last = replay.run(0, 3).pop().unwrap();
    let result = last.result.unwrap();
    assert!(result.views().iter().all(|v| v.key.tag.is_none()));
    assert_eq!(result.len(), 3);
}

#[test]
fn test_replay_picks_up_change_after_throttle() {
    let scenario = Scenario::from_json(CHEST.as_bytes()).unwrap();
    let mut replay = Replay::new(scenario, CollectorConfig::default());

    let reports = replay.run(0, 20);

    // Finalized at tick 2, slot change at tick 6, rescan allowed from tick 7.
    assert_eq!(count(&reports[6], "dirt"), 10);
    let refinalized = reports
        .iter()
        .skip(3)
        .find(|r| r.finalized)
        .expect("second pass finalizes");
    assert!(refinalized.tick >= 7);
    assert_eq!(count(refinalized, "dirt"), 11);
}

#[test]
fn test_replay_detach_hides_result() {
    let scenario = Scenario::from_json(CHEST.as_bytes()).unwrap();
    let mut replay = Replay::new(scenario, CollectorConfig::default());

    let reports = replay.run(0, 22);
    assert!(reports[19].result.is_some());
    assert!(reports[20].result.is_none());
    assert_eq!(reports[20].events_applied, 1);
}

#[test]
fn test_replay_respects_max_entries() {
    let scenario = Scenario::from_json(CHEST.as_bytes()).unwrap();
    let config = CollectorConfig {
        max_entries: 1,
        ..CollectorConfig::default()
    };
    let mut replay = Replay::new(scenario, config);

    let last = replay.run(0, 3).pop().unwrap();
    let result = last.result.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.views()[0].key, ItemKey::new("stone"));
}

// =============================================================================
// FORMATTING TESTS
// =============================================================================

#[test]
fn test_format_report_lines() {
    let scenario = Scenario::from_json(CHEST.as_bytes()).unwrap();
    let mut replay = Replay::new(scenario, CollectorConfig::default());
    let reports = replay.run(0, 3);

    assert!(format_report(&reports[0]).contains("scanning"));
    assert!(format_report(&reports[2]).contains("finalized"));
    assert!(format_report(&reports[2]).contains("77 items"));

    let listing = format_result(reports[2].result.as_ref().unwrap());
    assert!(listing.contains("65 x stone"));
}

#[test]
fn test_report_json_shape() {
    let scenario = Scenario::from_json(CHEST.as_bytes()).unwrap();
    let mut replay = Replay::new(scenario, CollectorConfig::default());
    let report = replay.step(0);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"tick\":0"));
    assert!(json.contains("\"finalized\":false"));
}

// =============================================================================
// COMMAND TESTS
// =============================================================================

#[test]
fn test_resolve_config_flags_win_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.toml");
    std::fs::write(&path, "max_entries = 10\nthrottle_ticks = 3\n").unwrap();

    let overrides = ConfigOverrides {
        max_entries: Some(4),
        throttle_ticks: None,
    };
    let config = resolve_config(Some(&path), &overrides).unwrap();
    assert_eq!(config.max_entries, 4);
    assert_eq!(config.throttle_ticks, 3);
    assert_eq!(config.exclusion_suffix, "clear");
}

#[test]
fn test_resolve_config_rejects_zero_entries() {
    let overrides = ConfigOverrides {
        max_entries: Some(0),
        throttle_ticks: None,
    };
    let result = resolve_config(None, &overrides);
    assert!(matches!(result, Err(TallyError::InvalidConfig { .. })));
}

#[test]
fn test_snapshot_then_decode() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = write_scenario(&dir, CHEST);
    let output = dir.path().join("chest.taly");

    cmd_snapshot(&scenario, &output, CollectorConfig::default(), 5).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    let result = result_from_bytes(&bytes).unwrap();
    assert_eq!(result.count_of(&ItemKey::new("stone")), Some(65));
    assert_eq!(result.progress(), None);

    cmd_decode(&output, true).unwrap();
    cmd_decode(&output, false).unwrap();
}

#[test]
fn test_snapshot_without_result_fails() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = write_scenario(
        &dir,
        r#"{"slots": [], "events": [{"tick": 0, "op": "detach"}]}"#,
    );
    let output = dir.path().join("none.taly");

    let result = cmd_snapshot(&scenario, &output, CollectorConfig::default(), 5);
    assert!(matches!(result, Err(TallyError::InvalidScenario(_))));
    assert!(!output.exists());
}

#[test]
fn test_snapshot_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = write_scenario(&dir, CHEST);
    let output = dir.path().join("missing").join("out.taly");

    let result = cmd_snapshot(&scenario, &output, CollectorConfig::default(), 5);
    assert!(matches!(result, Err(TallyError::IoError(_))));
}

#[test]
fn test_decode_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.taly");
    std::fs::write(&path, b"not a tally file").unwrap();

    assert!(cmd_decode(&path, false).is_err());
}

#[test]
fn test_run_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");

    let result = cmd_run(&missing, CollectorConfig::default(), false, 0, 3);
    assert!(matches!(result, Err(TallyError::IoError(_))));
}

#[test]
fn test_run_and_config_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = write_scenario(&dir, CHEST);

    cmd_run(&scenario, CollectorConfig::default(), true, 0, 4).unwrap();
    cmd_config(&CollectorConfig::default()).unwrap();
}
