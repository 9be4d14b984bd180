//! Value node operations of the def-use graph.

use crate::classify::{Referrer, ValueKind};

/// Unary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Deref,
}

/// One operation in a function's def-use graph.
///
/// Operands are encoded as incoming edges; a node's referrers are the nodes
/// its outgoing edges point to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Function or closure parameter (or pattern projection of one)
    Parameter,
    /// Literal value
    Const,
    /// Reference to a `fn` or `const` item, or an unresolved path
    Item,
    /// Storage of a `static` item
    Global,
    /// Stack slot for a variable captured by a closure or async block
    Alloc,
    /// Value produced by an expression the lowering does not model
    Opaque,
    Call,
    BinOp,
    Unary(UnaryOp),
    /// Read through an `Alloc` or `Global`
    Load,
    /// Component `i` of a destructured value
    Extract(usize),
    /// Copy or move out of an existing place
    Move,
    /// Tuple, array, struct literal
    Aggregate,
    Field,
    Index,
    AddrOf,
    Cast,
    Try,
    Await,
    Closure,
    Range,
    /// Arguments of a macro invocation that could not be parsed as expressions
    MacroUse,
    /// Merge of values flowing in from different control-flow paths
    Phi,
    Store,
    Return,
    /// Condition of `if`, `while` or a short-circuit operator
    Branch,
    /// Scrutinee of `match`, `if let` or `while let`
    Match,
    /// Keeps a source name attached to a value
    DebugRef,
}

impl Op {
    /// Trivial unary operations the classifier may look through.
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Op::Unary(_) | Op::Load)
    }

    /// Whether this node's consumers are fully known to the graph.
    ///
    /// Item references and opaque values may be consumed in ways the
    /// lowering never sees.
    pub fn tracks_referrers(&self) -> bool {
        !matches!(self, Op::Item | Op::Opaque)
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, Op::Phi)
    }

    /// Coarse shape for the classifier. Wrapper operands are filled in by the
    /// owning function, which knows the edges.
    pub fn kind(&self) -> ValueKind {
        match self {
            Op::Global => ValueKind::Global,
            op if op.is_wrapper() => ValueKind::Wrapper { operand: None },
            _ => ValueKind::Ordinary,
        }
    }
}

impl Referrer for Op {
    fn is_debug_only(&self) -> bool {
        matches!(self, Op::DebugRef)
    }
}
