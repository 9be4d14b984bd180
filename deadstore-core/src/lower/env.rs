//! Lexical environment and reaching definitions for one function.

use std::collections::{BTreeMap, HashMap};

use petgraph::stable_graph::NodeIndex;

/// A declared local variable. Shadowing declares a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct VarId(u32);

#[derive(Debug, Clone)]
pub(crate) struct Var {
    /// Stack slot when the variable lives in memory instead of in `Defs`
    pub slot: Option<NodeIndex>,
}

/// Current value of every register variable on the active path.
///
/// A `BTreeMap` keeps phi creation order stable across runs.
pub(crate) type Defs = BTreeMap<VarId, NodeIndex>;

#[derive(Debug)]
pub(crate) struct Env {
    scopes: Vec<HashMap<String, VarId>>,
    vars: Vec<Var>,
}

impl Env {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            vars: Vec::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn declare(&mut self, name: &str, slot: Option<NodeIndex>) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(Var { slot });
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
        id
    }

    /// Innermost visible variable with this name.
    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.0 as usize]
    }
}
