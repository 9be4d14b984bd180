//! Per-function def-use graph.
//!
//! Built on a `StableDiGraph` so dead phis can be removed after lowering
//! without invalidating the node indices held by occurrence bindings.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;

use super::node::Op;
use crate::classify::{DefUseGraph, ValueId, ValueKind};
use crate::occurrence::{OccurrenceId, Position};

/// One lowered function: its source range, graph, and occurrence bindings.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// Position of the `fn` keyword
    pub start: Position,
    /// Position of the closing brace
    pub end: Position,
    graph: StableDiGraph<Op, ()>,
    bindings: HashMap<OccurrenceId, NodeIndex>,
}

fn to_value(idx: NodeIndex) -> ValueId {
    ValueId(idx.index() as u32)
}

fn to_node(value: ValueId) -> NodeIndex {
    NodeIndex::new(value.0 as usize)
}

impl Function {
    pub fn new(name: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            graph: StableDiGraph::new(),
            bindings: HashMap::new(),
        }
    }

    /// Add a node with no operands.
    pub fn add(&mut self, op: Op) -> NodeIndex {
        self.graph.add_node(op)
    }

    /// Add a node consuming `operands`, in order.
    pub fn add_with(&mut self, op: Op, operands: &[NodeIndex]) -> NodeIndex {
        let node = self.graph.add_node(op);
        for &operand in operands {
            self.graph.add_edge(operand, node, ());
        }
        node
    }

    /// Record that `consumer` reads `operand`.
    pub fn add_operand(&mut self, consumer: NodeIndex, operand: NodeIndex) {
        self.graph.add_edge(operand, consumer, ());
    }

    /// Bind an occurrence to a value and attach its debug reference.
    pub fn bind(&mut self, occurrence: OccurrenceId, value: NodeIndex) {
        self.add_with(Op::DebugRef, &[value]);
        self.bindings.insert(occurrence, value);
    }

    pub fn binding(&self, occurrence: OccurrenceId) -> Option<NodeIndex> {
        self.bindings.get(&occurrence).copied()
    }

    pub fn op(&self, node: NodeIndex) -> Option<&Op> {
        self.graph.node_weight(node)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Operations consuming `node`.
    pub fn consumers(&self, node: NodeIndex) -> Vec<&Op> {
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter_map(|n| self.graph.node_weight(n))
            .collect()
    }

    /// Whether `position` lies inside this function's source range.
    pub fn contains(&self, position: &Position) -> bool {
        position.is_within(&self.start, &self.end)
    }

    /// Remove phis whose merged value never reaches a real consumer.
    ///
    /// A phi is live when something other than a phi consumes it, or when it
    /// feeds a live phi. Everything else was placed speculatively at a merge
    /// point and must not count as a use of its operands.
    ///
    /// Returns the number of removed phis.
    pub fn eliminate_dead_phis(&mut self) -> usize {
        // 1. Seed with phis that have a non-phi consumer
        let mut live: HashSet<NodeIndex> = HashSet::new();
        let mut queue = VecDeque::new();
        for node in self.graph.node_indices() {
            if !self.graph[node].is_phi() {
                continue;
            }
            let consumed = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .any(|n| !self.graph[n].is_phi());
            if consumed && live.insert(node) {
                queue.push_back(node);
            }
        }

        // 2. Liveness flows backwards into phi operands
        while let Some(node) = queue.pop_front() {
            for operand in self.graph.neighbors_directed(node, Direction::Incoming) {
                if self.graph[operand].is_phi() && live.insert(operand) {
                    queue.push_back(operand);
                }
            }
        }

        // 3. Drop the rest
        let dead: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|n| self.graph[*n].is_phi() && !live.contains(n))
            .collect();
        for node in &dead {
            self.graph.remove_node(*node);
        }
        dead.len()
    }
}

impl DefUseGraph for Function {
    type Referrer = Op;

    fn value_for(&self, occurrence: OccurrenceId) -> Option<ValueId> {
        self.binding(occurrence)
            .filter(|n| self.graph.contains_node(*n))
            .map(to_value)
    }

    fn value_kind(&self, value: ValueId) -> Option<ValueKind> {
        let node = to_node(value);
        let op = self.graph.node_weight(node)?;
        Some(match op.kind() {
            ValueKind::Wrapper { .. } => ValueKind::Wrapper {
                operand: self
                    .graph
                    .neighbors_directed(node, Direction::Incoming)
                    .next()
                    .map(to_value),
            },
            kind => kind,
        })
    }

    fn referrers(&self, value: ValueId) -> Option<Vec<Op>> {
        let node = to_node(value);
        let op = self.graph.node_weight(node)?;
        if !op.tracks_referrers() {
            return None;
        }
        Some(self.consumers(node).into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{real_uses, Referrer};
    use crate::ssa::node::UnaryOp;

    fn function() -> Function {
        Function::new("f", Position::new("a.rs", 1, 1), Position::new("a.rs", 10, 1))
    }

    fn occ(index: u32) -> OccurrenceId {
        OccurrenceId { file: 0, index }
    }

    #[test]
    fn test_bind_attaches_debug_ref() {
        let mut f = function();
        let v = f.add(Op::Const);
        f.bind(occ(0), v);

        let value = f.value_for(occ(0)).unwrap();
        let refs = f.referrers(value).unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].is_debug_only());
        assert!(!real_uses(&f, value).unwrap().has_real_use());
    }

    #[test]
    fn test_consumer_is_real_referrer() {
        let mut f = function();
        let v = f.add(Op::Const);
        f.bind(occ(0), v);
        f.add_with(Op::Call, &[v]);

        let uses = real_uses(&f, f.value_for(occ(0)).unwrap()).unwrap();
        assert_eq!(uses.debug, 1);
        assert_eq!(uses.real, 1);
    }

    #[test]
    fn test_wrapper_exposes_operand() {
        let mut f = function();
        let global = f.add(Op::Global);
        let load = f.add_with(Op::Load, &[global]);
        let neg = f.add_with(Op::Unary(UnaryOp::Neg), &[load]);

        assert_eq!(
            f.value_kind(to_value(load)),
            Some(ValueKind::Wrapper { operand: Some(to_value(global)) })
        );
        assert_eq!(
            f.value_kind(to_value(neg)),
            Some(ValueKind::Wrapper { operand: Some(to_value(load)) })
        );
        assert_eq!(f.value_kind(to_value(global)), Some(ValueKind::Global));
    }

    #[test]
    fn test_item_referrers_unknown() {
        let mut f = function();
        let item = f.add(Op::Item);
        f.add_with(Op::Call, &[item]);
        assert_eq!(f.referrers(to_value(item)), None);
    }

    #[test]
    fn test_dead_phi_removed() {
        let mut f = function();
        let a = f.add(Op::Const);
        let b = f.add(Op::Const);
        f.add_with(Op::Phi, &[a, b]);

        assert_eq!(f.eliminate_dead_phis(), 1);
        assert!(f.consumers(a).is_empty());
        assert!(f.consumers(b).is_empty());
    }

    #[test]
    fn test_phi_feeding_live_phi_survives() {
        let mut f = function();
        let a = f.add(Op::Const);
        let b = f.add(Op::Const);
        let inner = f.add_with(Op::Phi, &[a, b]);
        let c = f.add(Op::Const);
        let outer = f.add_with(Op::Phi, &[inner, c]);
        f.add_with(Op::Return, &[outer]);

        assert_eq!(f.eliminate_dead_phis(), 0);
        assert_eq!(f.consumers(a), vec![&Op::Phi]);
    }

    #[test]
    fn test_phi_cycle_without_consumer_is_dead() {
        let mut f = function();
        let init = f.add(Op::Const);
        let header = f.add_with(Op::Phi, &[init]);
        let next = f.add(Op::Const);
        let merge = f.add_with(Op::Phi, &[header, next]);
        f.add_operand(header, merge);

        assert_eq!(f.eliminate_dead_phis(), 2);
        assert!(f.consumers(init).is_empty());
        assert!(f.consumers(next).is_empty());
    }

    #[test]
    fn test_live_phi_keeps_back_edge_phi() {
        let mut f = function();
        let init = f.add(Op::Const);
        let header = f.add_with(Op::Phi, &[init]);
        let next = f.add_with(Op::BinOp, &[header]);
        let merge = f.add_with(Op::Phi, &[header, next]);
        f.add_operand(header, merge);

        assert_eq!(f.eliminate_dead_phis(), 0);
        assert_eq!(f.consumers(next), vec![&Op::Phi]);
    }

    #[test]
    fn test_phi_with_debug_ref_is_live() {
        let mut f = function();
        let a = f.add(Op::Const);
        let phi = f.add_with(Op::Phi, &[a]);
        f.bind(occ(3), phi);

        assert_eq!(f.eliminate_dead_phis(), 0);
        assert_eq!(f.value_for(occ(3)), Some(to_value(phi)));
    }

    #[test]
    fn test_contains_position() {
        let f = function();
        assert!(f.contains(&Position::new("a.rs", 5, 3)));
        assert!(!f.contains(&Position::new("a.rs", 11, 1)));
        assert!(!f.contains(&Position::new("b.rs", 5, 3)));
    }
}
