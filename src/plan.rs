//! Seeded scenario planning.
//!
//! All scenarios of a session draw from a single RNG stream, so the full
//! sequence is reproducible for a given pool and seed. Categories are sampled
//! without replacement inside a scenario and may recur across scenarios.

use std::fmt;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{BenchError, Result};

/// One parameter set executed against both implementations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    /// Letters per generated domain label.
    pub letters: u32,
    /// Sorted, distinct categories checked in this scenario.
    pub tlds: Vec<String>,
    /// Maximum domains the implementation should check.
    pub limit: u32,
    /// Concurrency hint forwarded to the optimized implementation.
    pub concurrency: u32,
}

impl Scenario {
    /// Comma-joined category list as passed on the command line.
    pub fn tld_arg(&self) -> String {
        self.tlds.join(",")
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "letters={}, limit={}, tlds={}",
            self.letters,
            self.limit,
            self.tld_arg()
        )
    }
}

/// Splits a comma-separated pool, dropping blanks and repeated labels.
pub fn parse_pool(raw: &str) -> Result<Vec<String>> {
    let mut pool: Vec<String> = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !pool.iter().any(|existing| existing == token) {
            pool.push(token.to_string());
        }
    }
    if pool.is_empty() {
        return Err(BenchError::EmptyPool);
    }
    Ok(pool)
}

/// Draws `sample_size` distinct categories from `pool`, returned sorted.
///
/// `sample_size` is clamped to `[1, pool.len()]`. An empty pool yields an
/// empty sample.
pub fn sample_categories<R: Rng + ?Sized>(
    pool: &[String],
    sample_size: i64,
    rng: &mut R,
) -> Vec<String> {
    if pool.is_empty() {
        return Vec::new();
    }
    let amount = sample_size.clamp(1, pool.len() as i64) as usize;
    let mut chosen: Vec<String> = pool.choose_multiple(rng, amount).cloned().collect();
    chosen.sort();
    chosen
}

/// Fixed scenario knobs shared by every planned run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScenarioPlanner {
    /// Letters per generated domain label.
    pub letters: u32,
    /// Maximum domains per run.
    pub limit: u32,
    /// Concurrency hint for the optimized implementation.
    pub concurrency: u32,
}

impl ScenarioPlanner {
    /// Plans `run_count` scenarios from `pool` using a `seed`ed RNG.
    pub fn plan(
        &self,
        pool: &[String],
        sample_size: i64,
        run_count: usize,
        seed: u64,
    ) -> Result<Vec<Scenario>> {
        if pool.is_empty() {
            return Err(BenchError::EmptyPool);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let scenarios = (0..run_count)
            .map(|_| Scenario {
                letters: self.letters,
                tlds: sample_categories(pool, sample_size, &mut rng),
                limit: self.limit,
                concurrency: self.concurrency,
            })
            .collect();
        Ok(scenarios)
    }
}
