//! Reading back what the implementations persisted.
//!
//! Each implementation appends one entry per invocation to its named
//! collection in the shared results store and rewrites its availability
//! snapshot. The harness never writes either file. It records how many
//! entries existed before the session started and expects the entry for the
//! n-th completed scenario at `initial + n`; an implementation that does not
//! append exactly once per run breaks that contract and halts the session.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{BenchError, Result};
use crate::exec::Implementation;

/// Category label to available item identifiers.
pub type Snapshot = BTreeMap<String, Vec<String>>;

/// One timing record written by an implementation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    /// Wall-clock duration reported by the implementation.
    #[serde(rename = "durationMs", default, deserialize_with = "lenient_ms::deserialize")]
    pub duration_ms: f64,
    /// Free-form summary of what the run found.
    #[serde(default)]
    pub summary: Value,
    /// Any other fields, preserved as written.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunEntry {
    /// Summary rendered for terminal output; strings are printed bare.
    pub fn summary_text(&self) -> String {
        match &self.summary {
            Value::String(text) => text.clone(),
            Value::Null => "-".to_string(),
            other => other.to_string(),
        }
    }
}

/// Durations written as `null`, strings or other non-numbers read as `0`.
mod lenient_ms {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_f64().filter(|ms| ms.is_finite()).unwrap_or(0.0))
    }
}

/// Both result collections as read from the store.
///
/// Entries stay undecoded; only the one a run produced is turned into a
/// [`RunEntry`], so stale history never blocks a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoredResults {
    /// Entries appended by the baseline implementation.
    pub baseline: Vec<Value>,
    /// Entries appended by the optimized implementation.
    pub optimized: Vec<Value>,
}

impl StoredResults {
    /// Entries for one side.
    pub fn entries(&self, implementation: Implementation) -> &[Value] {
        match implementation {
            Implementation::Baseline => &self.baseline,
            Implementation::Optimized => &self.optimized,
        }
    }
}

/// Location and layout of the shared results store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsStore {
    path: PathBuf,
    baseline_key: String,
    optimized_key: String,
}

impl ResultsStore {
    /// Describes a store at `path` with the given collection names.
    pub fn new(
        path: impl Into<PathBuf>,
        baseline_key: impl Into<String>,
        optimized_key: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            baseline_key: baseline_key.into(),
            optimized_key: optimized_key.into(),
        }
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads both collections. A missing file or key reads as empty.
    pub fn load(&self) -> Result<StoredResults> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(StoredResults::default());
        };
        let mut document: Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|source| BenchError::parse(&self.path, source))?;
        let baseline = self.collection(&mut document, &self.baseline_key)?;
        let optimized = self.collection(&mut document, &self.optimized_key)?;
        debug!(
            path = %self.path.display(),
            baseline = baseline.len(),
            optimized = optimized.len(),
            "bench.results.load"
        );
        Ok(StoredResults {
            baseline,
            optimized,
        })
    }

    fn collection(&self, document: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>> {
        match document.remove(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value).map_err(|source| BenchError::parse(&self.path, source))
            }
        }
    }
}

/// Reads an availability snapshot; a missing file reads as empty.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    match read_optional(path)? {
        Some(bytes) => {
            serde_json::from_slice(&bytes).map_err(|source| BenchError::parse(path, source))
        }
        None => Ok(Snapshot::new()),
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(BenchError::io(path, source)),
    }
}

/// Read offsets into the two result collections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResultCursor {
    /// Index of the next baseline entry.
    pub baseline: usize,
    /// Index of the next optimized entry.
    pub optimized: usize,
}

impl ResultCursor {
    /// Starts reading after everything already in `results`.
    pub fn after(results: &StoredResults) -> Self {
        Self {
            baseline: results.baseline.len(),
            optimized: results.optimized.len(),
        }
    }

    /// Offset for one side.
    pub fn offset(&self, implementation: Implementation) -> usize {
        match implementation {
            Implementation::Baseline => self.baseline,
            Implementation::Optimized => self.optimized,
        }
    }

    /// Entry produced by the current run of `implementation`.
    pub fn entry(
        &self,
        store: &ResultsStore,
        results: &StoredResults,
        implementation: Implementation,
    ) -> Result<RunEntry> {
        let offset = self.offset(implementation);
        let raw = results
            .entries(implementation)
            .get(offset)
            .cloned()
            .ok_or_else(|| BenchError::MissingEntry {
                implementation,
                store: store.path().to_path_buf(),
                offset,
            })?;
        serde_json::from_value(raw).map_err(|source| BenchError::parse(store.path(), source))
    }

    /// Moves past the entries of a completed scenario.
    pub fn advance(&mut self) {
        self.baseline += 1;
        self.optimized += 1;
    }
}
