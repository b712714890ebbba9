#![cfg(feature = "cli")]

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains as str_contains;
use chrono::NaiveDate;
use serde_json::json;
use shift_roster::template::default_templates;
use shift_roster::{RosterSnapshot, ShiftEntry};
use tempfile::{NamedTempFile, tempdir};

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

#[allow(deprecated)]
fn run_cli_with_config(config: &std::path::Path, script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.arg(config).write_stdin(script.to_string()).assert()
}

#[test]
fn cli_lists_default_templates() {
    run_cli("templates\nquit\n")
        .success()
        .stdout(str_contains("t-night"))
        .stdout(str_contains("22:45 - 06:15"))
        .stdout(str_contains("Full Day Block"));
}

#[test]
fn cli_requires_a_selected_date() {
    run_cli("add t-am\nquit\n")
        .success()
        .stdout(str_contains("Select a date first."));
}

#[test]
fn cli_saves_and_shows_an_entry() {
    run_cli("select 2025-03-10\nextra after\nadd t-night\nshow\nquit\n")
        .success()
        .stdout(str_contains("Saved: 2025-03-10"))
        .stdout(str_contains("2025-03-10 22:45 -> 2025-03-11 10:15"))
        .stdout(str_contains("[extra after]"));
}

#[test]
fn cli_prompts_before_overwriting() {
    run_cli("select 2025-03-10\nadd t-am\nadd t-pm\nyes\nshow\nquit\n")
        .success()
        .stdout(str_contains("2025-03-10 is already booked"))
        .stdout(str_contains("Replaced: 2025-03-10"))
        .stdout(str_contains("PM Shift"));
}

#[test]
fn cli_warns_about_short_rest_and_allows_override() {
    run_cli("select 2025-03-10\nadd t-night\nselect 2025-03-11\nadd t-am\noverride\nquit\n")
        .success()
        .stdout(str_contains("Rest warning: only 0h 30m rest against the shift on the previous day (2025-03-10)"))
        .stdout(str_contains("Saved: 2025-03-11"));
}

#[test]
fn cli_cancel_keeps_date_free() {
    run_cli("select 2025-03-10\nadd t-night\nselect 2025-03-11\nadd t-am\ncancel\nshow\nquit\n")
        .success()
        .stdout(str_contains("Cancelled."))
        .stdout(str_contains("Saved: 2025-03-11").not());
}

#[test]
fn cli_delete_removes_entry() {
    run_cli("select 2025-03-10\nadd t-am\ndelete 2025-03-10\nshow\nquit\n")
        .success()
        .stdout(str_contains("Deleted entry on 2025-03-10."))
        .stdout(str_contains("No entries."));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "select 2025-03-10\nnote keep this\nadd t-am\nsave json {path}\nselect 2025-03-12\nadd t-pm\nload json {path}\nshow\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Roster loaded from"));
    let after_reload = output.split("Roster loaded from").last().unwrap_or_default();
    assert!(after_reload.contains("note: keep this"));
    assert!(
        !after_reload.contains("2025-03-12"),
        "entry added after saving should be gone:\n{after_reload}"
    );
}

#[test]
fn cli_exports_ics_and_prints_links() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.ics");
    let script = format!(
        "select 2025-03-10\nadd t-sick\nexport ics {}\nlink 2025-03-10\nquit\n",
        path.display()
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Calendar exported to"))
        .stdout(str_contains("dates=20250310/20250311"));
    let ics = fs::read_to_string(&path).unwrap();
    assert!(ics.contains("DTSTART;VALUE=DATE:20250310"));
}

#[test]
fn cli_persists_entries_in_configured_data_dir() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("roster.json");
    fs::write(
        &config,
        json!({ "data_dir": dir.path().join("data") }).to_string(),
    )
    .unwrap();

    run_cli_with_config(&config, "select 2025-03-10\nadd t-pm\nquit\n")
        .success()
        .stdout(str_contains("Saved: 2025-03-10"));
    run_cli_with_config(&config, "show\nquit\n")
        .success()
        .stdout(str_contains("2025-03-10  🌇 PM Shift"));
}

#[test]
fn cli_week_respects_configured_start_day() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("roster.json");
    fs::write(&config, json!({ "week_starts_on_monday": true }).to_string()).unwrap();

    // 2025-03-12 is a Wednesday.
    let assert = run_cli_with_config(&config, "select 2025-03-12\nweek\nquit\n").success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let week: Vec<&str> = output
        .lines()
        .filter(|line| line.contains("  -"))
        .collect();
    assert_eq!(week.len(), 7);
    assert!(week[0].contains("2025-03-10"));
    assert!(week[6].contains("2025-03-16"));
}

#[test]
fn cli_survives_entries_on_the_last_representable_day() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("edge.json");
    let ics = dir.path().join("edge.ics");
    let last = NaiveDate::MAX;
    let snapshot = RosterSnapshot::new(
        default_templates(),
        vec![ShiftEntry::new("t-night", last).with_extra_hours(shift_roster::ExtraHours::After)],
    );
    fs::write(&roster, serde_json::to_string(&snapshot).unwrap()).unwrap();

    let script = format!(
        "load json {}\nshow\nexport ics {}\nselect {last}\nweek\nlink {last}\nquit\n",
        roster.display(),
        ics.display()
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Roster loaded from"))
        .stdout(str_contains("Calendar exported to"))
        .stdout(str_contains(format!("Entry on {last} is outside the supported date range.")));
    let ics = fs::read_to_string(&ics).unwrap();
    assert!(!ics.contains("BEGIN:VEVENT"));
}
