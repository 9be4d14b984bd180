//! In-memory front-end used by the classifier unit tests.

use std::collections::HashMap;

use super::graph_trait::{DefUseGraph, FunctionLookup, Referrer, ValueId, ValueKind};
use crate::occurrence::{
    DeclKind, Declaration, Occurrence, OccurrenceId, Position, Role,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeRef {
    Debug,
    Real,
}

impl Referrer for FakeRef {
    fn is_debug_only(&self) -> bool {
        matches!(self, FakeRef::Debug)
    }
}

#[derive(Debug, Clone)]
struct FakeNode {
    kind: ValueKind,
    refs: Option<Vec<FakeRef>>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeGraph {
    nodes: Vec<FakeNode>,
    bindings: HashMap<u32, ValueId>,
}

impl FakeGraph {
    fn push(&mut self, kind: ValueKind, refs: Option<Vec<FakeRef>>) -> ValueId {
        self.nodes.push(FakeNode { kind, refs });
        ValueId(self.nodes.len() as u32 - 1)
    }

    pub fn ordinary(&mut self) -> ValueId {
        self.push(ValueKind::Ordinary, Some(Vec::new()))
    }

    pub fn global(&mut self) -> ValueId {
        self.push(ValueKind::Global, Some(Vec::new()))
    }

    pub fn wrapper(&mut self, operand: Option<ValueId>) -> ValueId {
        self.push(ValueKind::Wrapper { operand }, Some(Vec::new()))
    }

    /// A value whose consumers are unknown.
    pub fn opaque(&mut self) -> ValueId {
        self.push(ValueKind::Ordinary, None)
    }

    pub fn refer(&mut self, value: ValueId, referrer: FakeRef) {
        if let Some(refs) = self.nodes[value.0 as usize].refs.as_mut() {
            refs.push(referrer);
        }
    }

    pub fn bind(&mut self, occurrence: u32, value: ValueId) {
        self.bindings.insert(occurrence, value);
    }
}

impl DefUseGraph for FakeGraph {
    type Referrer = FakeRef;

    fn value_for(&self, occurrence: OccurrenceId) -> Option<ValueId> {
        self.bindings.get(&occurrence.index).copied()
    }

    fn value_kind(&self, value: ValueId) -> Option<ValueKind> {
        self.nodes.get(value.0 as usize).map(|n| n.kind)
    }

    fn referrers(&self, value: ValueId) -> Option<Vec<FakeRef>> {
        self.nodes.get(value.0 as usize)?.refs.clone()
    }
}

/// Lookup that puts every position inside one function, or none at all.
#[derive(Debug, Clone)]
pub struct FakeLookup {
    graph: Option<FakeGraph>,
}

impl FakeLookup {
    pub fn single(graph: FakeGraph) -> Self {
        Self { graph: Some(graph) }
    }

    pub fn empty() -> Self {
        Self { graph: None }
    }

    pub fn graph_mut(&mut self) -> &mut FakeGraph {
        self.graph.get_or_insert_with(FakeGraph::default)
    }
}

impl FunctionLookup for FakeLookup {
    type Graph = FakeGraph;

    fn enclosing_function(&self, _position: &Position) -> Option<&FakeGraph> {
        self.graph.as_ref()
    }
}

pub fn occurrence(index: u32, name: &str) -> Occurrence {
    occurrence_of(index, name, DeclKind::Local, Role::Use)
}

pub fn occurrence_of(index: u32, name: &str, kind: DeclKind, role: Role) -> Occurrence {
    Occurrence {
        id: OccurrenceId { file: 0, index },
        name: name.to_string(),
        position: Position::new("test.rs", index as usize + 1, 5),
        role,
        decl: Declaration::new(name, kind),
    }
}
