//! Typed error handling for deadstore.
//!
//! A source file that cannot be read or parsed aborts the whole run, as does
//! a malformed deadstore.toml. Inconclusive classifications are not errors
//! and never surface through this type.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for deadstore operations.
#[derive(Error, Debug)]
pub enum DeadstoreError {
    /// I/O error when reading source files or configuration
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Syntax error when parsing Rust source
    #[error("Parse error in {path}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        /// Line number (1-indexed) if available
        line: Option<usize>,
        /// Column number (1-indexed) if available
        column: Option<usize>,
    },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl DeadstoreError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a parse error without location.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a parse error with line/column info.
    pub fn parse_at(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Convert a `syn` parse failure, keeping the location of the offending token.
    pub fn from_syn(path: impl Into<PathBuf>, err: &syn::Error) -> Self {
        let start = err.span().start();
        Self::parse_at(path, err.to_string(), start.line, start.column + 1)
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from the source front-end (read or parse).
    ///
    /// Front-end failures are fatal: the run stops without a partial report.
    pub fn is_front_end_failure(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Parse { .. })
    }
}

/// Convenience type alias for deadstore results.
pub type DeadstoreResult<T> = Result<T, DeadstoreError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DeadstoreResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DeadstoreResult<T> {
        self.map_err(|e| DeadstoreError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = DeadstoreError::io(
            PathBuf::from("/test/file.rs"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, DeadstoreError::Io { .. }));
        assert!(err.to_string().contains("/test/file.rs"));
    }

    #[test]
    fn test_parse_error_with_location() {
        let err = DeadstoreError::parse_at("/src/lib.rs", "unexpected token", 10, 5);
        if let DeadstoreError::Parse { line, column, .. } = &err {
            assert_eq!(*line, Some(10));
            assert_eq!(*column, Some(5));
        } else {
            panic!("Expected Parse error");
        }
    }

    #[test]
    fn test_from_syn_keeps_location() {
        let syn_err = match syn::parse_file("fn main() {\n    let = 1;\n}") {
            Ok(_) => panic!("Expected syntax error"),
            Err(e) => e,
        };
        let err = DeadstoreError::from_syn("broken.rs", &syn_err);
        match err {
            DeadstoreError::Parse { line, column, .. } => {
                assert_eq!(line, Some(2));
                assert!(column.is_some());
            }
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_front_end_failures() {
        assert!(DeadstoreError::parse("/test.rs", "error").is_front_end_failure());
        assert!(!DeadstoreError::config("deadstore.toml", "bad").is_front_end_failure());
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let deadstore_result = result.with_path("/missing/file.rs");
        assert!(deadstore_result.is_err());
    }
}
