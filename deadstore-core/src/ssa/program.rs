//! The whole analysed program: functions plus the occurrence tables.

use std::collections::HashMap;
use std::path::PathBuf;

use super::function::Function;
use crate::classify::FunctionLookup;
use crate::occurrence::{Occurrence, Position, Role};

/// Fully materialized front-end output for one run.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Source files in load order; `OccurrenceId::file` indexes this list
    pub files: Vec<PathBuf>,
    pub functions: Vec<Function>,
    /// Occurrences introducing a binding, in source order
    pub definitions: Vec<Occurrence>,
    /// Occurrences referring to an existing binding, in source order
    pub uses: Vec<Occurrence>,
    by_file: HashMap<PathBuf, Vec<usize>>,
}

impl Program {
    pub fn new(files: Vec<PathBuf>, functions: Vec<Function>, occurrences: Vec<Occurrence>) -> Self {
        let (mut definitions, mut uses): (Vec<_>, Vec<_>) = occurrences
            .into_iter()
            .partition(|o| o.role == Role::Definition);
        let order = |o: &Occurrence| (o.id.file, o.position.line, o.position.column, o.id.index);
        definitions.sort_by_key(order);
        uses.sort_by_key(order);

        let mut by_file: HashMap<PathBuf, Vec<usize>> = HashMap::new();
        for (i, function) in functions.iter().enumerate() {
            by_file.entry(function.start.file.clone()).or_default().push(i);
        }

        Self {
            files,
            functions,
            definitions,
            uses,
            by_file,
        }
    }

    pub fn occurrence_count(&self) -> usize {
        self.definitions.len() + self.uses.len()
    }

    /// Every occurrence, definitions first.
    pub fn occurrences(&self) -> impl Iterator<Item = &Occurrence> {
        self.definitions.iter().chain(self.uses.iter())
    }
}

impl FunctionLookup for Program {
    type Graph = Function;

    /// Innermost function whose source range contains `position`.
    fn enclosing_function(&self, position: &Position) -> Option<&Function> {
        self.by_file
            .get(&position.file)?
            .iter()
            .map(|&i| &self.functions[i])
            .filter(|f| f.contains(position))
            .max_by_key(|f| (f.start.line, f.start.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence::{DeclKind, Declaration, OccurrenceId};

    fn function(name: &str, start: (usize, usize), end: (usize, usize)) -> Function {
        Function::new(
            name,
            Position::new("lib.rs", start.0, start.1),
            Position::new("lib.rs", end.0, end.1),
        )
    }

    fn occurrence(index: u32, line: usize, role: Role) -> Occurrence {
        Occurrence {
            id: OccurrenceId { file: 0, index },
            name: "x".to_string(),
            position: Position::new("lib.rs", line, 9),
            role,
            decl: Declaration::new("x", DeclKind::Local),
        }
    }

    #[test]
    fn test_innermost_function_wins() {
        let program = Program::new(
            vec![PathBuf::from("lib.rs")],
            vec![function("outer", (1, 1), (20, 1)), function("inner", (5, 5), (8, 5))],
            Vec::new(),
        );

        let inside = Position::new("lib.rs", 6, 9);
        assert_eq!(program.enclosing_function(&inside).unwrap().name, "inner");

        let outside_inner = Position::new("lib.rs", 12, 9);
        assert_eq!(program.enclosing_function(&outside_inner).unwrap().name, "outer");
    }

    #[test]
    fn test_no_function_outside_ranges() {
        let program = Program::new(
            vec![PathBuf::from("lib.rs")],
            vec![function("f", (3, 1), (5, 1))],
            Vec::new(),
        );
        assert!(program.enclosing_function(&Position::new("lib.rs", 1, 1)).is_none());
        assert!(program.enclosing_function(&Position::new("other.rs", 4, 1)).is_none());
    }

    #[test]
    fn test_occurrences_split_and_sorted() {
        let program = Program::new(
            vec![PathBuf::from("lib.rs")],
            Vec::new(),
            vec![
                occurrence(0, 9, Role::Use),
                occurrence(1, 2, Role::Definition),
                occurrence(2, 4, Role::Use),
            ],
        );
        assert_eq!(program.definitions.len(), 1);
        let lines: Vec<_> = program.uses.iter().map(|o| o.position.line).collect();
        assert_eq!(lines, vec![4, 9]);
        assert_eq!(program.occurrence_count(), 3);
        assert_eq!(program.occurrences().next().unwrap().role, Role::Definition);
    }
}
