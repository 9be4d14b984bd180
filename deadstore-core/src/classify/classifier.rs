//! Dead-store classifier.
//!
//! An occurrence is unused if and only if its normalized value is neither
//! global nor absent and has no real consumer. Every inconclusive step is a
//! skip: false negatives are preferred over false positives.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::graph_trait::{DefUseGraph, FunctionLookup, ValueKind};
use super::normalize::normalize;
use super::real_use::real_uses;
use super::resolve::{resolve, Resolution};
use crate::occurrence::{Finding, Occurrence};

/// Why an occurrence was excluded from judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Bound to a function, type, constant or unknown item
    NotVariable,
    /// Outside every function (item level, generated code)
    NoEnclosingFunction,
    /// The function has no value for this occurrence
    NoValue,
    /// Program-wide storage may be read anywhere
    Global,
    /// The normalized value is absent
    NilValue,
    /// The graph cannot enumerate the value's consumers
    NoReferrerInfo,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotVariable => write!(f, "not a variable"),
            Self::NoEnclosingFunction => write!(f, "no enclosing function"),
            Self::NoValue => write!(f, "no bound value"),
            Self::Global => write!(f, "global storage"),
            Self::NilValue => write!(f, "nil value"),
            Self::NoReferrerInfo => write!(f, "referrers unknown"),
        }
    }
}

/// Result of classifying one occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Finding(Finding),
    Skip(SkipReason),
}

impl Classification {
    /// True only for a finding whose value is never consumed.
    pub fn is_unused(&self) -> bool {
        matches!(self, Self::Finding(f) if f.unused)
    }
}

fn skip(occurrence: &Occurrence, reason: SkipReason) -> Classification {
    debug!(
        name = %occurrence.name,
        position = %occurrence.position,
        decl = %occurrence.decl.kind,
        reason = %reason,
        "skipping occurrence"
    );
    Classification::Skip(reason)
}

/// Classify a single definition or use.
pub fn classify<L: FunctionLookup>(occurrence: &Occurrence, lookup: &L) -> Classification {
    if !occurrence.decl.is_variable() {
        return skip(occurrence, SkipReason::NotVariable);
    }

    let (graph, value) = match resolve(occurrence, lookup) {
        Resolution::Bound { graph, value } => (graph, value),
        Resolution::NoEnclosingFunction => {
            return skip(occurrence, SkipReason::NoEnclosingFunction)
        }
        Resolution::NoValue => return skip(occurrence, SkipReason::NoValue),
    };

    let normalized = normalize(graph, value);
    let kind = normalized.and_then(|v| graph.value_kind(v));

    if kind == Some(ValueKind::Global) {
        return skip(occurrence, SkipReason::Global);
    }
    let Some(value) = normalized.filter(|_| kind.is_some()) else {
        return skip(occurrence, SkipReason::NilValue);
    };

    let Some(uses) = real_uses(graph, value) else {
        return skip(occurrence, SkipReason::NoReferrerInfo);
    };

    debug!(
        name = %occurrence.name,
        position = %occurrence.position,
        debug_refs = uses.debug,
        real_refs = uses.real,
        "classified occurrence"
    );
    Classification::Finding(Finding::new(occurrence, !uses.has_real_use()))
}
