//! Capability interfaces the classifier needs from a front-end.
//!
//! Any front-end that can answer three questions plugs in here:
//! which function encloses a source position, which value an occurrence
//! binds to inside that function, and who consumes a value.

use crate::occurrence::{OccurrenceId, Position};

/// Handle to one value node inside a [`DefUseGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

/// Shape of a value node, as far as dead-store classification cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A value computed inside the function.
    Ordinary,
    /// A trivial unary operation over another value. `operand` is `None`
    /// when the front-end lost track of it.
    Wrapper { operand: Option<ValueId> },
    /// Storage with program-wide lifetime.
    Global,
}

/// A consumer of a value.
///
/// Referrers form an open set of instruction kinds; the classifier only asks
/// whether one exists purely to keep a name/position mapping alive.
pub trait Referrer {
    fn is_debug_only(&self) -> bool;
}

/// Per-function def-use graph.
pub trait DefUseGraph {
    type Referrer: Referrer;

    /// The value bound to this exact occurrence, if any.
    fn value_for(&self, occurrence: OccurrenceId) -> Option<ValueId>;

    /// Kind of a value node, or `None` if the id does not name a live node.
    fn value_kind(&self, value: ValueId) -> Option<ValueKind>;

    /// Consumers of a value. `None` means the front-end cannot enumerate
    /// them, which is different from an empty list.
    fn referrers(&self, value: ValueId) -> Option<Vec<Self::Referrer>>;
}

/// Maps a source position to the innermost enclosing function.
pub trait FunctionLookup {
    type Graph: DefUseGraph;

    fn enclosing_function(&self, position: &Position) -> Option<&Self::Graph>;
}
