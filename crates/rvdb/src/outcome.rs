//! Whole-test pass/fail outcome.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::{ClassifiedRecord, InstStatus, ResultCode, TestId, TestInfo};

/// How a test's outcome is derived from its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomePolicy {
    /// Fail if any record, on any hart, has category 2, 3 or 4.
    #[default]
    RecordedCategories,
    /// Fail if any record of the replayed hart classifies to an alert status.
    ClassifiedStatus,
}

/// Tests with at least one record whose category fails the test.
#[must_use]
pub fn failing_by_category(codes: &[(TestId, ResultCode)]) -> FxHashSet<TestId> {
    codes
        .iter()
        .filter(|(_, code)| code.category().fails_test())
        .map(|(test, _)| *test)
        .collect()
}

/// Whether any classified record is an alert.
#[must_use]
pub fn failing_by_status(classified: &[ClassifiedRecord]) -> bool {
    classified.iter().any(|c| c.status.is_alert())
}

/// Test names split by outcome, each sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestPartition {
    pub passing: Vec<String>,
    pub failing: Vec<String>,
}

impl TestPartition {
    /// Split `tests` by membership in `failing`.
    #[must_use]
    pub fn from_failing(tests: &[TestInfo], failing: &FxHashSet<TestId>) -> Self {
        let mut partition = Self::default();
        for test in tests {
            if failing.contains(&test.id) {
                partition.failing.push(test.name.clone());
            } else {
                partition.passing.push(test.name.clone());
            }
        }
        partition.passing.sort();
        partition.failing.sort();
        partition
    }
}

/// Per-status instruction counts of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub test: TestInfo,
    pub instructions: usize,
    pub counts: BTreeMap<InstStatus, usize>,
    pub failing: bool,
}

impl TestSummary {
    #[must_use]
    pub fn new(test: TestInfo, classified: &[ClassifiedRecord], failing: bool) -> Self {
        let mut counts = BTreeMap::new();
        for c in classified {
            *counts.entry(c.status).or_insert(0) += 1;
        }
        Self {
            test,
            instructions: classified.len(),
            counts,
            failing,
        }
    }

    #[must_use]
    pub fn count(&self, status: InstStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}
