//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use deadstore_core::prelude::*;
//! ```

// Occurrence model
pub use crate::occurrence::{DeclKind, Declaration, Finding, Occurrence, Position, Role};

// Classification core
pub use crate::classify::{classify, Classification, DefUseGraph, FunctionLookup, SkipReason};

// Front-end and graphs
pub use crate::lower::{load_program, lower_source};
pub use crate::ssa::{Function, Program};

// Detection and reporting
pub use crate::detect::{find_unused_assignments, find_unused_assignments_parallel, UnusedReport};
pub use crate::report::{print_json, print_plain, report};

// Errors
pub use crate::error::{DeadstoreError, DeadstoreResult};

// File scanning
pub use crate::scan::{collect_source_files, gather_rs_files};

// Configuration
pub use crate::config::{load_config, DeadstoreConfig};

// Builder API
pub use crate::builder::{AnalysisResult, Deadstore};
