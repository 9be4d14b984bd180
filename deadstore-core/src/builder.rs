//! Builder pattern API for dead-store analysis.
//!
//! ```rust,ignore
//! use deadstore_core::prelude::*;
//!
//! let result = Deadstore::new(["src"])
//!     .exclude_dirs(["generated"])
//!     .ignore_patterns(["tmp*"])
//!     .analyze()?;
//!
//! for finding in &result.report.findings {
//!     eprintln!("{finding}");
//! }
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::detect::{find_unused_assignments, find_unused_assignments_parallel, UnusedReport};
use crate::lower::load_program;
use crate::occurrence::Finding;
use crate::scan::collect_source_files;

/// Builder for configuring a dead-store run.
#[derive(Debug, Clone)]
pub struct Deadstore {
    /// Files and directories to analyse
    paths: Vec<PathBuf>,

    /// Directory names skipped during discovery
    excluded_dirs: Vec<String>,

    /// Variable name patterns whose findings are dropped
    ignored_patterns: Vec<String>,

    /// Report `_`-prefixed names too
    include_underscored: bool,

    /// Classify on the Rayon pool
    parallel: bool,
}

impl Deadstore {
    /// Create a new analysis builder for the given files or directories.
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            excluded_dirs: Vec::new(),
            ignored_patterns: Vec::new(),
            include_underscored: false,
            parallel: true,
        }
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Add patterns for variable names to ignore.
    ///
    /// `prefix*` and `*suffix` match by prefix and suffix; anything else
    /// matches the exact name or a substring of it.
    pub fn ignore_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Report names starting with `_` as well.
    pub fn include_underscored(mut self, enabled: bool) -> Self {
        self.include_underscored = enabled;
        self
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Run the analysis and return results.
    pub fn analyze(&self) -> Result<AnalysisResult> {
        // 1. Gather files
        let excludes: Vec<&str> = self.excluded_dirs.iter().map(String::as_str).collect();
        let files = collect_source_files(&self.paths, &excludes)
            .context("Failed to gather .rs files")?;

        // 2. Parse and lower; any failure aborts the run
        let program = load_program(&files).context("Failed to load program")?;

        // 3. Classify
        let mut report = if self.parallel {
            find_unused_assignments_parallel(&program.definitions, &program.uses, &program)
        } else {
            find_unused_assignments(&program.definitions, &program.uses, &program)
        };

        // 4. Filter
        report.retain(|f| !self.is_ignored(f));

        info!(
            files = files.len(),
            examined = report.examined,
            skipped = report.skipped.total(),
            unused = report.count,
            "analysis complete"
        );

        Ok(AnalysisResult {
            functions: program.functions.len(),
            occurrences: program.occurrence_count(),
            files,
            report,
        })
    }

    fn is_ignored(&self, finding: &Finding) -> bool {
        let name = finding.name.as_str();
        if !self.include_underscored && name.starts_with('_') {
            return true;
        }
        self.ignored_patterns
            .iter()
            .any(|pattern| matches_pattern(name, pattern))
    }
}

fn matches_pattern(name: &str, pattern: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        name.starts_with(prefix)
    } else if let Some(suffix) = pattern.strip_prefix('*') {
        name.ends_with(suffix)
    } else {
        name == pattern || name.contains(pattern)
    }
}

/// Result of running dead-store analysis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Files analysed, in load order
    pub files: Vec<PathBuf>,

    /// Number of function bodies lowered
    pub functions: usize,

    /// Definitions plus uses recorded by the front-end
    pub occurrences: usize,

    pub report: UnusedReport,
}

impl AnalysisResult {
    /// Check if any unused assignment was found.
    pub fn has_unused(&self) -> bool {
        self.report.has_unused()
    }

    pub fn unused_count(&self) -> usize {
        self.report.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern("tmp_value", "tmp*"));
        assert!(!matches_pattern("value_tmp", "tmp*"));
        assert!(matches_pattern("buffer_len", "*_len"));
        assert!(matches_pattern("guard", "guard"));
        assert!(matches_pattern("lock_guard", "guard"));
        assert!(!matches_pattern("lock", "guard"));
    }

    #[test]
    fn test_builder_defaults() {
        let builder = Deadstore::new(["src"]);
        assert_eq!(builder.paths, vec![PathBuf::from("src")]);
        assert!(builder.parallel);
        assert!(!builder.include_underscored);
        assert!(builder.excluded_dirs.is_empty());
        assert!(builder.ignored_patterns.is_empty());
    }

    #[test]
    fn test_underscored_ignored_by_default() {
        let finding = Finding {
            name: "_scratch".to_string(),
            position: crate::occurrence::Position::new("a.rs", 1, 1),
            unused: true,
        };
        assert!(Deadstore::new(["."]).is_ignored(&finding));
        assert!(!Deadstore::new(["."]).include_underscored(true).is_ignored(&finding));
    }
}
