//! Def-use graph: the representation the classifier consults.
//!
//! Each [`Function`] owns a graph of [`Op`] nodes where an edge `a -> b`
//! means `b` consumes `a`. The [`Program`] ties functions to the occurrence
//! tables and answers enclosing-function queries.

pub mod function;
pub mod node;
pub mod program;

pub use function::Function;
pub use node::{Op, UnaryOp};
pub use program::Program;
