//! Real-use filter: separates debug-only referrers from real consumers.
//!
//! Debug references only keep a source name attached to a value. Counting
//! them would make every assignment look used.

use super::graph_trait::{DefUseGraph, Referrer, ValueId};

/// Referrer tally for one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RealUses {
    pub debug: usize,
    pub real: usize,
}

impl RealUses {
    pub fn has_real_use(&self) -> bool {
        self.real > 0
    }
}

/// Partition a referrer list into debug-only and real consumers.
pub fn partition<R: Referrer>(referrers: &[R]) -> RealUses {
    referrers.iter().fold(RealUses::default(), |mut acc, r| {
        if r.is_debug_only() {
            acc.debug += 1;
        } else {
            acc.real += 1;
        }
        acc
    })
}

/// Tally the referrers of `value`, or `None` when the graph cannot tell.
pub fn real_uses<G: DefUseGraph>(graph: &G, value: ValueId) -> Option<RealUses> {
    graph.referrers(value).map(|refs| partition(&refs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::testing::{FakeGraph, FakeRef};

    #[test]
    fn test_partition_counts_both_kinds() {
        let uses = partition(&[FakeRef::Debug, FakeRef::Real, FakeRef::Debug]);
        assert_eq!(uses, RealUses { debug: 2, real: 1 });
        assert!(uses.has_real_use());
    }

    #[test]
    fn test_debug_only_is_not_a_use() {
        let uses = partition(&[FakeRef::Debug, FakeRef::Debug]);
        assert!(!uses.has_real_use());
    }

    #[test]
    fn test_no_referrers_is_not_a_use() {
        let uses = partition::<FakeRef>(&[]);
        assert!(!uses.has_real_use());
    }

    #[test]
    fn test_unknown_referrers_propagate_as_none() {
        let mut graph = FakeGraph::default();
        let v = graph.opaque();
        assert_eq!(real_uses(&graph, v), None);
    }

    #[test]
    fn test_real_uses_reads_graph() {
        let mut graph = FakeGraph::default();
        let v = graph.ordinary();
        graph.refer(v, FakeRef::Debug);
        graph.refer(v, FakeRef::Real);
        assert_eq!(real_uses(&graph, v), Some(RealUses { debug: 1, real: 1 }));
    }
}
