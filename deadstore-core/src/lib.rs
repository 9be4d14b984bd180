//! deadstore-core: dead store (unused assignment) detection for Rust sources
//!
//! A dead store is a write to a variable whose value is never read before
//! it is overwritten or goes out of scope. Every definition and use of a
//! variable is mapped onto a per-function def-use graph; an occurrence whose
//! value has no consumer other than the debug marker recorded for it is
//! reported.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use deadstore_core::prelude::*;
//!
//! let result = Deadstore::new(["src"]).analyze()?;
//! print_plain(&result.report.findings);
//! std::process::exit(if result.has_unused() { 1 } else { 0 });
//! ```
//!
//! # Module Organization
//!
//! - [`occurrence`]: identifier occurrences, declarations and findings
//! - [`classify`]: the per-occurrence dead-store classifier
//! - [`ssa`]: def-use graphs built on `petgraph`
//! - [`lower`]: Rust source front-end on `syn`
//! - [`detect`]: whole-program detection driver
//! - [`report`]: plain and JSON output
//! - [`scan`]: parallel file discovery
//! - [`builder`]: fluent builder API for configuration
//! - [`error`]: typed error handling

pub mod builder;
pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod logging;
pub mod lower;
pub mod occurrence;
pub mod prelude;
pub mod report;
pub mod scan;
pub mod ssa;

pub use detect::{find_unused_assignments, UnusedReport};
pub use error::{DeadstoreError, DeadstoreResult};
pub use occurrence::Finding;
