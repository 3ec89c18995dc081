use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture_path(name: &str) -> String {
    workspace_root()
        .join(format!("tests/fixtures/{name}"))
        .to_string_lossy()
        .to_string()
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_bcsave"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run bcsave CLI")
}

#[test]
fn default_output_is_text_summary() {
    let path = fixture_path("story_base.dat");
    let output = run_cli(&[&path]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("STORY PROGRESS"));
    assert!(stdout.contains("Into the Future 2"));
    assert!(output.stderr.is_empty());
}

#[test]
fn json_summary_reports_detected_layout() {
    let path = fixture_path("story_full.dat");
    let output = run_cli(&["--json", &path]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(json["format"]["treasure_festival"], true);
    assert_eq!(json["format"]["itf_timed_scores"], true);
    assert_eq!(json["file_len"], 4892);
}

#[test]
fn chapter_flag_shows_stage_detail() {
    let path = fixture_path("story_full.dat");
    let output = run_cli(&["--chapter", "4", "--json", &path]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(json["label"], "Into the Future 2");
    assert_eq!(json["stages"][47]["itf_timed_score"], 5047);

    let output = run_cli(&["--chapter", "4", &path]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Timed score"));
}

#[test]
fn unknown_length_without_layout_flags_fails() {
    let path = fixture_path("story_tail.dat");
    let output = run_cli(&[&path]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error parsing story data"));
    assert!(stderr.contains("FormatDetection"));

    let output = run_cli(&["--treasure-festival", "--timed-scores", "--json", &path]);
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(json["tail_len"], 8);
}

#[test]
fn bad_chapter_is_a_runtime_error() {
    let path = fixture_path("story_base.dat");
    let output = run_cli(&["--chapter", "9", &path]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid chapter 9"));
}

#[test]
fn verbose_flag_enables_debug_logging_on_stderr() {
    let path = fixture_path("story_base.dat");
    let output = run_cli(&["--verbose", "--json", &path]);
    assert!(output.status.success());

    serde_json::from_slice::<Value>(&output.stdout).expect("stdout stays json");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("decoded section"));
}
