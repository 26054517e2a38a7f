//! Availability parity between two snapshots.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::results::Snapshot;

/// One category whose item sets differ.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryMismatch {
    /// Category label.
    pub category: String,
    /// Items reported only by the baseline, sorted.
    pub only_baseline: Vec<String>,
    /// Items reported only by the optimized implementation, sorted.
    pub only_optimized: Vec<String>,
}

impl CategoryMismatch {
    /// Size of the symmetric difference for this category.
    pub fn item_count(&self) -> usize {
        self.only_baseline.len() + self.only_optimized.len()
    }
}

/// Outcome of comparing two snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityDiff {
    /// Mismatched categories in label order.
    pub categories: Vec<CategoryMismatch>,
}

impl AvailabilityDiff {
    /// Number of categories whose sets differ.
    pub fn mismatched_categories(&self) -> usize {
        self.categories.len()
    }

    /// Items present on exactly one side, summed over categories.
    pub fn mismatched_items(&self) -> usize {
        self.categories.iter().map(CategoryMismatch::item_count).sum()
    }

    /// `(mismatched_categories, mismatched_items)`.
    pub fn counts(&self) -> (usize, usize) {
        (self.mismatched_categories(), self.mismatched_items())
    }

    /// True when both snapshots agree.
    pub fn is_clean(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Compares two snapshots as sets per category.
///
/// A category present on one side only is compared against an empty set.
/// Duplicate items inside one list count once.
pub fn diff(baseline: &Snapshot, optimized: &Snapshot) -> AvailabilityDiff {
    let labels: BTreeSet<&String> = baseline.keys().chain(optimized.keys()).collect();
    let categories = labels
        .into_iter()
        .filter_map(|label| {
            let base = item_set(baseline.get(label));
            let opt = item_set(optimized.get(label));
            if base == opt {
                return None;
            }
            Some(CategoryMismatch {
                category: label.clone(),
                only_baseline: sorted_difference(&base, &opt),
                only_optimized: sorted_difference(&opt, &base),
            })
        })
        .collect();
    AvailabilityDiff { categories }
}

fn item_set(items: Option<&Vec<String>>) -> HashSet<&str> {
    items
        .map(|items| items.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

fn sorted_difference(left: &HashSet<&str>, right: &HashSet<&str>) -> Vec<String> {
    let mut items: Vec<String> = left.difference(right).map(|s| s.to_string()).collect();
    items.sort();
    items
}
