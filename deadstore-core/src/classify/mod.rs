//! Dead-store classification.
//!
//! # Pipeline
//!
//! ```text
//! occurrence ──► resolve ──► normalize ──► real_use ──► classifier
//!                (value)     (unwrap 1)    (debug/real)  (finding | skip)
//! ```
//!
//! The stages only talk to the front-end through the traits in
//! [`graph_trait`], so any def-use builder that can map occurrences to
//! values and values to referrers can drive them.

pub mod classifier;
pub mod graph_trait;
pub mod normalize;
pub mod real_use;
pub mod resolve;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::{classify, Classification, SkipReason};
pub use graph_trait::{DefUseGraph, FunctionLookup, Referrer, ValueId, ValueKind};
pub use normalize::normalize;
pub use real_use::{partition, real_uses, RealUses};
pub use resolve::{resolve, Resolution};
