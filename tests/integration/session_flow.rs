#![cfg(unix)]
#![allow(missing_docs)]

mod support;

use std::fs;

use support::Fixture;
use tldbench::{
    AvailabilityDiff, BenchError, BenchmarkOutcome, Implementation, ProcessOutcome, Scenario,
    ScenarioPlanner, Session, SessionObserver,
};

fn scenario(tlds: &[&str]) -> Scenario {
    Scenario {
        letters: 3,
        tlds: tlds.iter().map(|s| s.to_string()).collect(),
        limit: 25,
        concurrency: 8,
    }
}

#[test]
fn completes_every_planned_scenario() {
    let fixture = Fixture::new();
    let config = fixture.config("ok", "ok");
    let pool = vec![".com".to_string(), ".io".to_string(), ".dev".to_string()];
    let planner = ScenarioPlanner {
        letters: 3,
        limit: 25,
        concurrency: 8,
    };
    let scenarios = planner.plan(&pool, 2, 2, 13).expect("plan");

    let report = Session::new(&config, ()).run(&scenarios).expect("session");
    assert!(report.is_complete());
    assert_eq!(report.outcomes.len(), 2);

    let first = &report.outcomes[0];
    assert_eq!(first.baseline.duration_ms, 100.0);
    assert_eq!(first.optimized.duration_ms, 50.0);
    assert_eq!(first.speedup_pct, 50.0);
    assert_eq!(first.mismatched_tlds, 0);
    assert_eq!(first.tlds, scenarios[0].tlds);

    let second = &report.outcomes[1];
    assert_eq!(second.baseline.duration_ms, 101.0);
    assert_eq!(second.optimized.duration_ms, 51.0);

    assert_eq!(fixture.run_count("baseline"), 2);
    assert_eq!(fixture.run_count("optimized"), 2);
}

#[test]
fn concurrency_hint_only_reaches_optimized() {
    let fixture = Fixture::new();
    let config = fixture.config("ok", "ok");
    Session::new(&config, ())
        .run(&[scenario(&[".com"])])
        .expect("session");
    assert_eq!(fixture.read("state/optimized.concurrency").trim(), "8");
    assert_eq!(fixture.read("state/baseline.concurrency").trim(), "unset");
}

#[test]
fn reads_entries_after_existing_ones() {
    let fixture = Fixture::new();
    fixture.seed_results(2, 5);
    let config = fixture.config("ok", "ok");
    let report = Session::new(&config, ())
        .run(&[scenario(&[".io"])])
        .expect("session");
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.baseline.duration_ms, 102.0);
    assert_eq!(outcome.optimized.duration_ms, 55.0);
    assert_eq!(outcome.baseline.summary_text(), "run 2");
}

#[test]
fn halts_on_first_failure_and_keeps_completed_runs() {
    let fixture = Fixture::new();
    let config = fixture.config("ok", "fail-second");
    let scenarios = [scenario(&[".com"]), scenario(&[".io"]), scenario(&[".dev"])];
    let report = Session::new(&config, ()).run(&scenarios).expect("session");

    assert_eq!(report.outcomes.len(), 1);
    let (index, err) = report.failure.expect("failure recorded");
    assert_eq!(index, 2);
    match err {
        BenchError::Execution {
            implementation,
            exit_code,
            output,
            ..
        } => {
            assert_eq!(implementation, Implementation::Optimized);
            assert_eq!(exit_code, Some(9));
            assert!(output.contains("second run exploded"), "{output}");
        }
        other => panic!("unexpected error: {other}"),
    }
    // The third scenario never started.
    assert_eq!(fixture.run_count("baseline"), 2);
}

#[test]
fn missing_entry_is_a_hard_failure() {
    let fixture = Fixture::new();
    let config = fixture.config("noappend", "ok");
    let report = Session::new(&config, ())
        .run(&[scenario(&[".com"]), scenario(&[".io"])])
        .expect("session");
    assert!(report.outcomes.is_empty());
    let (index, err) = report.failure.expect("failure recorded");
    assert_eq!(index, 1);
    assert!(matches!(
        err,
        BenchError::MissingEntry {
            implementation: Implementation::Baseline,
            offset: 0,
            ..
        }
    ));
    assert_eq!(fixture.run_count("optimized"), 0);
}

#[test]
fn availability_mismatch_is_counted() {
    let fixture = Fixture::new();
    let config = fixture.config("ok", "drop");
    let report = Session::new(&config, ())
        .run(&[scenario(&[".com", ".io"])])
        .expect("session");
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.mismatched_tlds, 2);
    assert_eq!(outcome.mismatched_domains, 4);
}

#[test]
fn malformed_store_aborts_before_running() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.path("benchmarking")).unwrap();
    fs::write(fixture.path("benchmarking/results.json"), "[1, 2").unwrap();
    let config = fixture.config("ok", "ok");
    let err = Session::new(&config, ())
        .run(&[scenario(&[".com"])])
        .unwrap_err();
    assert!(matches!(err, BenchError::Parse { .. }));
    assert_eq!(fixture.run_count("baseline"), 0);
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl SessionObserver for Recorder {
    fn scenario_started(&mut self, index: usize, total: usize, _scenario: &Scenario) {
        self.events.push(format!("start {index}/{total}"));
    }

    fn run_started(&mut self, implementation: Implementation, _scenario: &Scenario) {
        self.events.push(format!("run {implementation}"));
    }

    fn run_finished(&mut self, implementation: Implementation, outcome: &ProcessOutcome) {
        assert!(outcome.output.contains("stderr line"));
        self.events.push(format!("done {implementation}"));
    }

    fn scenario_completed(
        &mut self,
        index: usize,
        _outcome: &BenchmarkOutcome,
        diff: &AvailabilityDiff,
    ) {
        self.events
            .push(format!("completed {index} clean={}", diff.is_clean()));
    }

    fn scenario_failed(&mut self, index: usize, _error: &BenchError) {
        self.events.push(format!("failed {index}"));
    }
}

#[test]
fn observer_sees_progress_in_order() {
    let fixture = Fixture::new();
    let config = fixture.config("ok", "fail-second");
    let mut session = Session::new(&config, Recorder::default());
    session
        .run(&[scenario(&[".com"]), scenario(&[".io"])])
        .expect("session");
    let recorder = session.into_observer();
    assert_eq!(
        recorder.events,
        vec![
            "start 1/2",
            "run baseline",
            "done baseline",
            "run optimized",
            "done optimized",
            "completed 1 clean=true",
            "start 2/2",
            "run baseline",
            "done baseline",
            "run optimized",
            "failed 2",
        ]
    );
}
