//! Sequential benchmark session.
//!
//! Each scenario runs the baseline, reads back its entry, runs the optimized
//! implementation with the concurrency hint, reads back its entry, and then
//! diffs the two availability snapshots. The first failing scenario stops
//! the session; outcomes completed before it are kept.

use tracing::{info, warn};

use crate::compare::{diff, AvailabilityDiff};
use crate::config::HarnessConfig;
use crate::error::{BenchError, Result};
use crate::exec::{Executor, Implementation, ProcessOutcome};
use crate::plan::Scenario;
use crate::results::{load_snapshot, ResultCursor, ResultsStore, RunEntry};
use crate::summary::BenchmarkOutcome;

/// Progress callbacks; every method defaults to doing nothing.
pub trait SessionObserver {
    /// A scenario is about to run. `index` is 1-based.
    fn scenario_started(&mut self, _index: usize, _total: usize, _scenario: &Scenario) {}

    /// One implementation is about to be launched.
    fn run_started(&mut self, _implementation: Implementation, _scenario: &Scenario) {}

    /// One implementation exited successfully.
    fn run_finished(&mut self, _implementation: Implementation, _outcome: &ProcessOutcome) {}

    /// A scenario completed.
    fn scenario_completed(
        &mut self,
        _index: usize,
        _outcome: &BenchmarkOutcome,
        _diff: &AvailabilityDiff,
    ) {
    }

    /// A scenario failed and the session is stopping.
    fn scenario_failed(&mut self, _index: usize, _error: &BenchError) {}
}

impl SessionObserver for () {}

/// What a session produced.
#[derive(Debug, Default)]
pub struct SessionReport {
    /// Completed outcomes in execution order.
    pub outcomes: Vec<BenchmarkOutcome>,
    /// 1-based scenario index and error that halted the session.
    pub failure: Option<(usize, BenchError)>,
}

impl SessionReport {
    /// True when every planned scenario completed.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Runs scenarios against the configured implementations.
pub struct Session<'a, O: SessionObserver> {
    config: &'a HarnessConfig,
    executor: Executor,
    store: ResultsStore,
    observer: O,
}

impl<'a, O: SessionObserver> Session<'a, O> {
    /// Prepares a session for `config`.
    pub fn new(config: &'a HarnessConfig, observer: O) -> Self {
        Self {
            config,
            executor: config.executor(),
            store: config.results_store(),
            observer,
        }
    }

    /// Returns the observer, e.g. to inspect what it collected.
    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Runs `scenarios` in order, stopping at the first failure.
    ///
    /// Only an unreadable results store at start-up is returned as `Err`;
    /// scenario failures are reported in [`SessionReport::failure`].
    pub fn run(&mut self, scenarios: &[Scenario]) -> Result<SessionReport> {
        let existing = self.store.load()?;
        let mut cursor = ResultCursor::after(&existing);
        info!(
            scenarios = scenarios.len(),
            baseline_offset = cursor.baseline,
            optimized_offset = cursor.optimized,
            "bench.session.start"
        );

        let mut report = SessionReport::default();
        let total = scenarios.len();
        for (index, scenario) in scenarios.iter().enumerate() {
            let index = index + 1;
            self.observer.scenario_started(index, total, scenario);
            match self.run_scenario(scenario, &cursor) {
                Ok((outcome, availability)) => {
                    cursor.advance();
                    info!(
                        index,
                        speedup_pct = outcome.speedup_pct,
                        mismatched_tlds = outcome.mismatched_tlds,
                        mismatched_domains = outcome.mismatched_domains,
                        "bench.session.scenario_done"
                    );
                    self.observer
                        .scenario_completed(index, &outcome, &availability);
                    report.outcomes.push(outcome);
                }
                Err(err) => {
                    warn!(index, error = %err, "bench.session.halt");
                    self.observer.scenario_failed(index, &err);
                    report.failure = Some((index, err));
                    break;
                }
            }
        }
        Ok(report)
    }

    fn run_scenario(
        &mut self,
        scenario: &Scenario,
        cursor: &ResultCursor,
    ) -> Result<(BenchmarkOutcome, AvailabilityDiff)> {
        let baseline = self.run_side(Implementation::Baseline, scenario, cursor, &[])?;
        let hint = [(
            self.config.concurrency_env.clone(),
            scenario.concurrency.to_string(),
        )];
        let optimized = self.run_side(Implementation::Optimized, scenario, cursor, &hint)?;

        let baseline_available = load_snapshot(self.config.snapshot_path(Implementation::Baseline))?;
        let optimized_available =
            load_snapshot(self.config.snapshot_path(Implementation::Optimized))?;
        let availability = diff(&baseline_available, &optimized_available);
        let outcome = BenchmarkOutcome::new(scenario, baseline, optimized, &availability);
        Ok((outcome, availability))
    }

    fn run_side(
        &mut self,
        implementation: Implementation,
        scenario: &Scenario,
        cursor: &ResultCursor,
        extra_env: &[(String, String)],
    ) -> Result<RunEntry> {
        self.observer.run_started(implementation, scenario);
        let command = self.config.implementation(implementation).command();
        let process = self
            .executor
            .execute(&command, implementation, scenario, extra_env)?;
        self.observer.run_finished(implementation, &process);
        let results = self.store.load()?;
        cursor.entry(&self.store, &results, implementation)
    }
}
