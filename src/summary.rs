//! Per-run speedup and session-wide aggregation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::compare::AvailabilityDiff;
use crate::error::{BenchError, Result};
use crate::plan::Scenario;
use crate::results::RunEntry;

/// Relative duration reduction of `optimized_ms` against `baseline_ms`, in
/// percent. A non-positive baseline has no measurable speedup.
pub fn speedup_pct(baseline_ms: f64, optimized_ms: f64) -> f64 {
    if baseline_ms <= 0.0 {
        return 0.0;
    }
    (baseline_ms - optimized_ms) / baseline_ms * 100.0
}

/// Everything recorded for one completed scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkOutcome {
    /// Letters per domain.
    pub letters: u32,
    /// Categories checked.
    pub tlds: Vec<String>,
    /// Domain limit.
    pub limit: u32,
    /// Concurrency hint given to the optimized run.
    pub concurrency: u32,
    /// Entry the baseline appended.
    pub baseline: RunEntry,
    /// Entry the optimized implementation appended.
    pub optimized: RunEntry,
    /// See [`speedup_pct`].
    pub speedup_pct: f64,
    /// Categories whose availability differed.
    pub mismatched_tlds: usize,
    /// Items present in exactly one snapshot.
    pub mismatched_domains: usize,
}

impl BenchmarkOutcome {
    /// Combines a scenario with the entries and diff it produced.
    pub fn new(
        scenario: &Scenario,
        baseline: RunEntry,
        optimized: RunEntry,
        diff: &AvailabilityDiff,
    ) -> Self {
        let (mismatched_tlds, mismatched_domains) = diff.counts();
        Self {
            letters: scenario.letters,
            tlds: scenario.tlds.clone(),
            limit: scenario.limit,
            concurrency: scenario.concurrency,
            speedup_pct: speedup_pct(baseline.duration_ms, optimized.duration_ms),
            baseline,
            optimized,
            mismatched_tlds,
            mismatched_domains,
        }
    }
}

/// Aggregate statistics over completed outcomes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// When the summary was computed (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub executed_at: OffsetDateTime,
    /// Completed scenarios.
    pub run_count: usize,
    /// Mean speedup percentage.
    pub avg_speedup_pct: f64,
    /// Mean baseline duration.
    pub avg_baseline_duration_ms: f64,
    /// Mean optimized duration.
    pub avg_optimized_duration_ms: f64,
    /// Sum of mismatched categories.
    pub total_mismatched_tlds: usize,
    /// Sum of mismatched items.
    pub total_mismatched_domains: usize,
}

/// Summarizes `outcomes`, stamped with the current time.
pub fn summarize(outcomes: &[BenchmarkOutcome]) -> SessionSummary {
    summarize_at(outcomes, OffsetDateTime::now_utc())
}

/// Summarizes `outcomes` with an explicit timestamp.
pub fn summarize_at(outcomes: &[BenchmarkOutcome], executed_at: OffsetDateTime) -> SessionSummary {
    let run_count = outcomes.len();
    let mean = |total: f64| {
        if run_count == 0 {
            0.0
        } else {
            total / run_count as f64
        }
    };
    let sum = |f: fn(&BenchmarkOutcome) -> f64| outcomes.iter().map(f).sum::<f64>();

    SessionSummary {
        executed_at,
        run_count,
        avg_speedup_pct: mean(sum(|o| o.speedup_pct)),
        avg_baseline_duration_ms: mean(sum(|o| o.baseline.duration_ms)),
        avg_optimized_duration_ms: mean(sum(|o| o.optimized.duration_ms)),
        total_mismatched_tlds: outcomes.iter().map(|o| o.mismatched_tlds).sum(),
        total_mismatched_domains: outcomes.iter().map(|o| o.mismatched_domains).sum(),
    }
}

/// Persisted session artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryDocument {
    /// Completed outcomes in execution order.
    pub runs: Vec<BenchmarkOutcome>,
    /// Aggregates over `runs`.
    pub summary: SessionSummary,
    /// Error that halted the session early, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl SummaryDocument {
    /// Bundles outcomes with their summary.
    pub fn new(runs: Vec<BenchmarkOutcome>, summary: SessionSummary) -> Self {
        Self {
            runs,
            summary,
            failure: None,
        }
    }

    /// Records the error that stopped the session.
    pub fn with_failure(mut self, failure: impl Into<String>) -> Self {
        self.failure = Some(failure.into());
        self
    }
}

/// Writes `document` as pretty JSON, creating parent directories.
pub fn save_summary(path: impl AsRef<Path>, document: &SummaryDocument) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| BenchError::io(parent, source))?;
    }
    let mut json =
        serde_json::to_string_pretty(document).map_err(|source| BenchError::parse(path, source))?;
    json.push('\n');
    fs::write(path, json).map_err(|source| BenchError::io(path, source))?;
    info!(path = %path.display(), runs = document.runs.len(), "bench.summary.saved");
    Ok(())
}
