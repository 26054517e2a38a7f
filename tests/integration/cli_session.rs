#![cfg(unix)]
#![allow(missing_docs)]

mod support;

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use support::Fixture;
use tempfile::TempDir;

fn dry_run_stdout(dir: &TempDir, extra: &[&str]) -> String {
    let output = cargo_bin_cmd!("tldbench")
        .current_dir(dir.path())
        .env_remove("TLDBENCH_CONFIG")
        .args(["--quiet", "--dry-run", "--runs", "4", "--seed", "7"])
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf8 stdout")
}

#[test]
fn dry_run_lists_reproducible_scenarios_without_touching_disk() {
    let dir = TempDir::new().expect("tempdir");
    let first = dry_run_stdout(&dir, &["--tlds", ".com,.io", "--tlds-per-run", "1"]);
    let second = dry_run_stdout(&dir, &["--tlds", ".com,.io", "--tlds-per-run", "1"]);
    assert_eq!(first, second);

    assert!(first.contains("Planned scenarios (dry-run):"));
    let runs: Vec<&str> = first.lines().filter(|l| l.contains("Run ")).collect();
    assert_eq!(runs.len(), 4);
    for line in runs {
        assert!(line.contains("letters=3, limit=500"), "{line}");
        let tlds = line.rsplit("tlds=").next().expect("tlds");
        assert!(tlds == ".com" || tlds == ".io", "{line}");
    }
    assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
}

#[test]
fn negative_sample_size_is_clamped_to_one() {
    let dir = TempDir::new().expect("tempdir");
    let out = dry_run_stdout(&dir, &["--tlds", "a,b,c", "--tlds-per-run", "-2"]);
    for line in out.lines().filter(|l| l.contains("Run ")) {
        assert!(!line.rsplit("tlds=").next().unwrap_or("").contains(','), "{line}");
    }
}

#[test]
fn help_lists_output_flags() {
    cargo_bin_cmd!("tldbench")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("--dry-run"))
        .stdout(predicates::str::contains("--color"));
}

#[test]
fn empty_pool_fails_before_running() {
    let dir = TempDir::new().expect("tempdir");
    cargo_bin_cmd!("tldbench")
        .current_dir(dir.path())
        .args(["--tlds", " , ,", "--quiet"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("no TLDs provided"));
    assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
}

#[test]
fn full_session_writes_summary() {
    let fixture = Fixture::new();
    let config = fixture.write_config("ok", "ok");
    let summary_path = fixture.path("reports/summary.json");

    cargo_bin_cmd!("tldbench")
        .current_dir(fixture.root())
        .arg("--config")
        .arg(&config)
        .args(["--quiet", "--runs", "2", "--tlds", ".com,.io,.dev"])
        .arg("--summary-out")
        .arg(&summary_path)
        .assert()
        .success()
        .stdout(predicates::str::contains("Speedup: 50.0%"))
        .stdout(predicates::str::contains("baseline run 1"))
        .stdout(predicates::str::contains("baseline finished in"))
        .stdout(predicates::str::contains("optimized finished in"));

    let doc: Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).expect("summary")).expect("json");
    assert_eq!(doc["summary"]["run_count"], 2);
    assert_eq!(doc["summary"]["avg_baseline_duration_ms"], 100.5);
    assert_eq!(doc["summary"]["total_mismatched_domains"], 0);
    assert_eq!(doc["runs"][0]["baseline"]["durationMs"], 100.0);
    assert_eq!(doc["runs"][0]["concurrency"], 200);
    assert!(doc.get("failure").is_none());
}

#[test]
fn failing_session_still_summarizes_completed_runs() {
    let fixture = Fixture::new();
    let config = fixture.write_config("ok", "fail-second");
    let summary_path = fixture.path("summary.json");

    cargo_bin_cmd!("tldbench")
        .current_dir(fixture.root())
        .env("TLDBENCH_CONFIG", &config)
        .args(["--quiet", "--runs", "3"])
        .arg("--summary-out")
        .arg(&summary_path)
        .assert()
        .code(1)
        .stdout(predicates::str::contains("Aggregate Summary"))
        .stderr(predicates::str::contains("Benchmark 2 failed"))
        .stderr(predicates::str::contains("second run exploded"));

    let doc: Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).expect("summary")).expect("json");
    assert_eq!(doc["summary"]["run_count"], 1);
    assert_eq!(doc["runs"].as_array().map(Vec::len), Some(1));
    assert!(doc["failure"]
        .as_str()
        .unwrap_or_default()
        .starts_with("benchmark 2 failed"));
    assert_eq!(fixture.run_count("baseline"), 2);
}

#[test]
fn mismatch_warning_is_printed() {
    let fixture = Fixture::new();
    let config = fixture.write_config("ok", "drop");
    cargo_bin_cmd!("tldbench")
        .current_dir(fixture.root())
        .arg("--config")
        .arg(&config)
        .args(["--quiet", "--runs", "1", "--tlds", ".com", "--format", "json"])
        .assert()
        .success()
        .stderr(predicates::str::contains(
            "Availability mismatch detected: 2 domains across 1 TLDs",
        ))
        .stdout(predicates::str::contains("\"total_mismatched_domains\": 2"));
}
