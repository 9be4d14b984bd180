//! Reference normalization: peel one wrapper off a bound value.

use super::graph_trait::{DefUseGraph, ValueId, ValueKind};

/// Unwrap exactly one layer of unary wrapping.
///
/// A load of a global or of an allocated variable, or a negation sitting
/// directly on the definition, is replaced by its operand so the classifier
/// looks at the value that actually carries the binding. Nested wrappers are
/// left alone. Returns `None` when the value or the wrapped operand is absent.
pub fn normalize<G: DefUseGraph>(graph: &G, value: ValueId) -> Option<ValueId> {
    match graph.value_kind(value)? {
        ValueKind::Wrapper { operand } => operand,
        ValueKind::Ordinary | ValueKind::Global => Some(value),
    }
}
