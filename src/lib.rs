//! Comparative benchmark harness for two domain lookup implementations.
//!
//! The harness plans seeded scenarios, runs a baseline and an optimized
//! implementation as child processes, reads back the timing entries they
//! append to a shared results store, diffs their availability snapshots and
//! aggregates the speedup across the session.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod compare;
pub mod config;
pub mod error;
pub mod exec;
pub mod plan;
pub mod results;
pub mod session;
pub mod summary;

pub use compare::{diff, AvailabilityDiff, CategoryMismatch};
pub use config::{ConfigError, HarnessConfig, ImplementationConfig};
pub use error::{BenchError, Result};
pub use exec::{Executor, Implementation, ImplementationCommand, ProcessOutcome};
pub use plan::{parse_pool, sample_categories, Scenario, ScenarioPlanner};
pub use results::{load_snapshot, ResultCursor, ResultsStore, RunEntry, Snapshot, StoredResults};
pub use session::{Session, SessionObserver, SessionReport};
pub use summary::{
    save_summary, speedup_pct, summarize, summarize_at, BenchmarkOutcome, SessionSummary,
    SummaryDocument,
};
