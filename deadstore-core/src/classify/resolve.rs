//! Value resolution: occurrence -> bound value node.

use super::graph_trait::{DefUseGraph, FunctionLookup, ValueId};
use crate::occurrence::Occurrence;

/// Outcome of resolving an occurrence.
///
/// The two unresolved variants are legitimate skips, not errors: package-level
/// names have no enclosing function, and unreachable or uninitialized code has
/// no bound value.
#[derive(Debug)]
pub enum Resolution<'g, G> {
    Bound { graph: &'g G, value: ValueId },
    NoEnclosingFunction,
    NoValue,
}

/// Find the value node `occurrence` binds to inside its enclosing function.
pub fn resolve<'g, L>(occurrence: &Occurrence, lookup: &'g L) -> Resolution<'g, L::Graph>
where
    L: FunctionLookup,
{
    let Some(graph) = lookup.enclosing_function(&occurrence.position) else {
        return Resolution::NoEnclosingFunction;
    };

    match graph.value_for(occurrence.id) {
        Some(value) => Resolution::Bound { graph, value },
        None => Resolution::NoValue,
    }
}
