//! Identifier occurrences, the declarations they bind to, and findings.
//!
//! These are the read-only records the front-end hands to the classifier.
//! They live for one run and are never persisted.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A source location. Line and column are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Same file and `(line, column)` within `[start, end]`.
    pub fn is_within(&self, start: &Position, end: &Position) -> bool {
        self.file == start.file
            && (start.line, start.column) <= (self.line, self.column)
            && (self.line, self.column) <= (end.line, end.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Identity of one occurrence within a run.
///
/// `file` is the index of the source file in load order and `index` is the
/// encounter index inside that file, so ids stay unique when files are
/// lowered in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceId {
    pub file: u32,
    pub index: u32,
}

/// Whether an occurrence introduces a binding or refers to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Definition,
    Use,
}

/// What kind of entity a name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    /// Function-local binding (`let`, parameter, pattern)
    Local,
    /// `static` item: a variable with program-wide storage
    Static,
    Constant,
    Function,
    Type,
    /// Name the front-end could not attribute (imports, external items)
    Unknown,
}

impl DeclKind {
    /// Only locals and statics are variables; everything else is never a
    /// dead-store candidate.
    pub fn is_variable(self) -> bool {
        matches!(self, Self::Local | Self::Static)
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Static => write!(f, "static"),
            Self::Constant => write!(f, "constant"),
            Self::Function => write!(f, "function"),
            Self::Type => write!(f, "type"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// The entity an occurrence binds to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.kind.is_variable()
    }
}

/// A source-level mention of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub id: OccurrenceId,
    pub name: String,
    pub position: Position,
    pub role: Role,
    pub decl: Declaration,
}

/// Classification output for one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub name: String,
    pub position: Position,
    pub unused: bool,
}

impl Finding {
    pub fn new(occurrence: &Occurrence, unused: bool) -> Self {
        Self {
            name: occurrence.name.clone(),
            position: occurrence.position.clone(),
            unused,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unused assignment for '{}' {}", self.name, self.position)
    }
}
