//! Dead-store detection over a whole program.
//!
//! Definitions are classified first, then uses, each in the order the
//! front-end supplied them. An occurrence present in both lists is judged
//! once per appearance.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::classify::{classify, Classification, FunctionLookup, SkipReason};
use crate::occurrence::{Finding, Occurrence};

/// How many occurrences were skipped, per reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipStats {
    counts: BTreeMap<SkipReason, usize>,
}

impl SkipStats {
    pub fn record(&mut self, reason: SkipReason) {
        *self.counts.entry(reason).or_default() += 1;
    }

    pub fn get(&self, reason: SkipReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Non-zero tallies in reason order.
    pub fn iter(&self) -> impl Iterator<Item = (SkipReason, usize)> + '_ {
        self.counts.iter().map(|(r, n)| (*r, *n))
    }
}

/// Outcome of one detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnusedReport {
    /// Number of unused assignments, always `findings.len()`
    pub count: usize,
    /// Unused findings in encounter order
    pub findings: Vec<Finding>,
    #[serde(skip)]
    pub skipped: SkipStats,
    /// Occurrences classified, definitions and uses together
    #[serde(skip)]
    pub examined: usize,
}

impl UnusedReport {
    fn from_classifications(classifications: impl IntoIterator<Item = Classification>) -> Self {
        let mut report = Self::default();
        for classification in classifications {
            report.examined += 1;
            match classification {
                Classification::Finding(finding) if finding.unused => report.findings.push(finding),
                Classification::Finding(_) => {}
                Classification::Skip(reason) => report.skipped.record(reason),
            }
        }
        report.count = report.findings.len();
        report
    }

    /// True when the run should fail.
    pub fn has_unused(&self) -> bool {
        self.count > 0
    }

    /// Drop findings that do not satisfy `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&Finding) -> bool) {
        self.findings.retain(keep);
        self.count = self.findings.len();
    }
}

/// Classify every definition, then every use, sequentially.
pub fn find_unused_assignments<L: FunctionLookup>(
    definitions: &[Occurrence],
    uses: &[Occurrence],
    lookup: &L,
) -> UnusedReport {
    UnusedReport::from_classifications(
        definitions
            .iter()
            .chain(uses)
            .map(|occurrence| classify(occurrence, lookup)),
    )
}

/// Same result as [`find_unused_assignments`], classified on the Rayon pool.
///
/// Occurrences share nothing mutable, so each one is classified
/// independently; `collect` keeps encounter order.
pub fn find_unused_assignments_parallel<L: FunctionLookup + Sync>(
    definitions: &[Occurrence],
    uses: &[Occurrence],
    lookup: &L,
) -> UnusedReport {
    let classifications: Vec<Classification> = definitions
        .par_iter()
        .chain(uses.par_iter())
        .map(|occurrence| classify(occurrence, lookup))
        .collect();
    UnusedReport::from_classifications(classifications)
}
