//! Control flow: branches, loops, labeled blocks, early exits and closures.
//!
//! Paths join through phis. Loop headers get a phi for every variable the
//! body assigns, and back edges add operands to those phis. Phis that end
//! up with no real consumer are pruned once the function is finished.

use std::collections::{BTreeMap, HashSet};

use petgraph::stable_graph::NodeIndex;

use super::body::FunctionBuilder;
use super::env::{Defs, VarId};
use super::prepass;
use crate::ssa::Op;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    Loop,
    Block,
}

/// A `break` / `continue` target.
#[derive(Debug)]
pub(crate) struct Frame {
    label: Option<String>,
    kind: FrameKind,
    /// Loop header phis, one per variable assigned in the body
    header: Vec<(VarId, NodeIndex)>,
    /// States reaching the exit through `break`
    exits: Vec<Option<Defs>>,
    /// Values carried by `break`
    values: Vec<NodeIndex>,
}

impl Frame {
    fn new(label: Option<&syn::Label>, kind: FrameKind, header: Vec<(VarId, NodeIndex)>) -> Self {
        Self {
            label: label.map(|l| l.name.ident.to_string()),
            kind,
            header,
            exits: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl FunctionBuilder<'_> {
    /// Join the states of several incoming paths. Unreachable paths are
    /// ignored; a variable with differing values gets a phi.
    pub(super) fn merge(&mut self, states: Vec<Option<Defs>>) -> Option<Defs> {
        let mut live: Vec<Defs> = states.into_iter().flatten().collect();
        if live.len() <= 1 {
            return live.pop();
        }

        let mut incoming: BTreeMap<VarId, Vec<NodeIndex>> = BTreeMap::new();
        for defs in &live {
            for (var, value) in defs {
                incoming.entry(*var).or_default().push(*value);
            }
        }

        let mut merged = Defs::new();
        for (var, mut values) in incoming {
            values.sort();
            values.dedup();
            let value = match values.as_slice() {
                [single] => *single,
                many => self.func.add_with(Op::Phi, many),
            };
            merged.insert(var, value);
        }
        Some(merged)
    }

    /// Result value of a branching expression.
    fn join_values(&mut self, values: Vec<(bool, NodeIndex)>) -> NodeIndex {
        let mut live: Vec<NodeIndex> = values
            .into_iter()
            .filter_map(|(reachable, v)| reachable.then_some(v))
            .collect();
        live.sort();
        live.dedup();
        match live.as_slice() {
            [] => self.constant(),
            [single] => *single,
            many => self.func.add_with(Op::Phi, many),
        }
    }

    /// `a && b` and `a || b`: the right operand may not run, so its
    /// assignments merge with the state after the left operand.
    pub(super) fn lower_short_circuit(
        &mut self,
        left: &syn::Expr,
        right: &syn::Expr,
    ) -> NodeIndex {
        let left = self.lower_expr(left);
        let before = self.defs.clone();

        let right = self.lower_expr(right);
        let right_live = self.reachable();
        let after_right = self.defs.take();

        self.defs = self.merge(vec![before, after_right]);
        let right = self.join_values(vec![(right_live, right)]);
        self.func.add_with(Op::BinOp, &[left, right])
    }

    pub(super) fn lower_if(&mut self, expr: &syn::ExprIf) -> NodeIndex {
        // `if let` bindings are visible in the then-branch only
        self.env.push_scope();
        let cond = self.lower_expr(&expr.cond);
        self.func.add_with(Op::Branch, &[cond]);
        let before = self.defs.clone();

        let then_value = self.lower_block(&expr.then_branch);
        let then_live = self.reachable();
        let after_then = self.defs.take();
        self.env.pop_scope();

        self.defs = before;
        let else_value = expr
            .else_branch
            .as_ref()
            .map(|(_, else_expr)| self.lower_value(else_expr));
        let else_live = self.reachable();
        let after_else = self.defs.take();

        self.defs = self.merge(vec![after_then, after_else]);
        match else_value {
            Some(else_value) => {
                self.join_values(vec![(then_live, then_value), (else_live, else_value)])
            }
            None => self.constant(),
        }
    }

    pub(super) fn lower_match(&mut self, expr: &syn::ExprMatch) -> NodeIndex {
        let scrutinee = self.lower_expr(&expr.expr);
        let matched = self.func.add_with(Op::Match, &[scrutinee]);
        let before = self.defs.clone();

        let mut exits = Vec::with_capacity(expr.arms.len());
        let mut values = Vec::with_capacity(expr.arms.len());
        for arm in &expr.arms {
            self.defs = before.clone();
            self.env.push_scope();
            self.bind_pattern(&arm.pat, matched, true);
            if let Some((_, guard)) = &arm.guard {
                let guard = self.lower_expr(guard);
                self.func.add_with(Op::Branch, &[guard]);
            }
            let value = self.lower_value(&arm.body);
            values.push((self.reachable(), value));
            exits.push(self.defs.take());
            self.env.pop_scope();
        }

        self.defs = self.merge(exits);
        self.join_values(values)
    }

    // ---------------------------------------------------------------
    // Loops
    // ---------------------------------------------------------------

    /// Place header phis and push the loop frame.
    fn enter_loop(&mut self, label: Option<&syn::Label>, assigned: HashSet<String>) -> usize {
        let mut vars: Vec<VarId> = assigned
            .iter()
            .filter_map(|name| self.env.lookup(name))
            .collect();
        vars.sort();
        vars.dedup();

        let mut header = Vec::new();
        for var in vars {
            let Some(entry) = self.defs.as_ref().and_then(|d| d.get(&var).copied()) else {
                continue;
            };
            let phi = self.func.add_with(Op::Phi, &[entry]);
            if let Some(defs) = self.defs.as_mut() {
                defs.insert(var, phi);
            }
            header.push((var, phi));
        }

        self.frames.push(Frame::new(label, FrameKind::Loop, header));
        self.frames.len() - 1
    }

    /// Send the current state back to a loop header.
    fn back_edge(&mut self, frame: usize) {
        let Some(defs) = self.defs.take() else {
            return;
        };
        let header = self.frames[frame].header.clone();
        for (var, phi) in header {
            if let Some(&value) = defs.get(&var) {
                if value != phi {
                    self.func.add_operand(phi, value);
                }
            }
        }
    }

    fn exit_loop(&mut self, fallthrough: Option<Option<Defs>>) -> NodeIndex {
        let Some(frame) = self.frames.pop() else {
            return self.constant();
        };
        let mut exits = frame.exits;
        exits.extend(fallthrough);
        self.defs = self.merge(exits);
        self.join_values(frame.values.into_iter().map(|v| (true, v)).collect())
    }

    pub(super) fn lower_loop(&mut self, expr: &syn::ExprLoop) -> NodeIndex {
        let assigned = prepass::assigned_names(&expr.body, None);
        let frame = self.enter_loop(expr.label.as_ref(), assigned);
        self.lower_block(&expr.body);
        self.back_edge(frame);
        self.exit_loop(None)
    }

    pub(super) fn lower_while(&mut self, expr: &syn::ExprWhile) -> NodeIndex {
        let assigned = prepass::assigned_names(&expr.body, Some(&expr.cond));
        let frame = self.enter_loop(expr.label.as_ref(), assigned);

        self.env.push_scope();
        let cond = self.lower_expr(&expr.cond);
        self.func.add_with(Op::Branch, &[cond]);
        let exit = self.defs.clone();
        self.lower_block(&expr.body);
        self.back_edge(frame);
        self.env.pop_scope();

        self.exit_loop(Some(exit));
        self.constant()
    }

    pub(super) fn lower_for(&mut self, expr: &syn::ExprForLoop) -> NodeIndex {
        let iterable = self.lower_expr(&expr.expr);
        let assigned = prepass::assigned_names(&expr.body, None);
        let frame = self.enter_loop(expr.label.as_ref(), assigned);
        let exit = self.defs.clone();

        self.env.push_scope();
        let item = self.func.add_with(Op::Call, &[iterable]);
        self.bind_pattern(&expr.pat, item, true);
        self.lower_block(&expr.body);
        self.back_edge(frame);
        self.env.pop_scope();

        self.exit_loop(Some(exit));
        self.constant()
    }

    // ---------------------------------------------------------------
    // Early exits
    // ---------------------------------------------------------------

    fn find_frame(&self, label: Option<&syn::Lifetime>, is_continue: bool) -> Option<usize> {
        match label {
            Some(label) => {
                let name = label.ident.to_string();
                self.frames.iter().rposition(|f| {
                    f.label.as_deref() == Some(name.as_str())
                        && (!is_continue || f.kind == FrameKind::Loop)
                })
            }
            None => self.frames.iter().rposition(|f| f.kind == FrameKind::Loop),
        }
    }

    pub(super) fn lower_break(&mut self, expr: &syn::ExprBreak) -> NodeIndex {
        let value = expr.expr.as_ref().map(|e| self.lower_value(e));
        let state = self.defs.take();
        if let Some(frame) = self.find_frame(expr.label.as_ref(), false) {
            let frame = &mut self.frames[frame];
            if let (Some(value), true) = (value, state.is_some()) {
                frame.values.push(value);
            }
            frame.exits.push(state);
        }
        self.constant()
    }

    pub(super) fn lower_continue(&mut self, expr: &syn::ExprContinue) -> NodeIndex {
        match self.find_frame(expr.label.as_ref(), true) {
            Some(frame) => self.back_edge(frame),
            None => self.defs = None,
        }
        self.constant()
    }

    pub(super) fn lower_return(&mut self, expr: &syn::ExprReturn) -> NodeIndex {
        let operands: Vec<NodeIndex> = expr.expr.iter().map(|e| self.lower_value(e)).collect();
        if self.reachable() {
            self.func.add_with(Op::Return, &operands);
        }
        self.defs = None;
        self.constant()
    }

    pub(super) fn lower_labeled_block(&mut self, label: &syn::Label, block: &syn::Block) -> NodeIndex {
        self.frames.push(Frame::new(Some(label), FrameKind::Block, Vec::new()));
        let value = self.lower_block(block);
        let live = self.reachable();
        let fallthrough = self.defs.take();

        let Some(frame) = self.frames.pop() else {
            return value;
        };
        let mut exits = frame.exits;
        exits.push(fallthrough);
        self.defs = self.merge(exits);

        let mut values: Vec<(bool, NodeIndex)> = frame.values.into_iter().map(|v| (true, v)).collect();
        values.push((live, value));
        self.join_values(values)
    }

    // ---------------------------------------------------------------
    // Closures and async blocks
    // ---------------------------------------------------------------

    /// Closure bodies are lowered inline: they see the values current at
    /// creation and their own state is discarded afterwards.
    pub(super) fn lower_closure(&mut self, expr: &syn::ExprClosure) -> NodeIndex {
        let saved_defs = self.defs.clone();
        let saved_frames = std::mem::take(&mut self.frames);
        self.env.push_scope();

        for input in &expr.inputs {
            let param = self.func.add(Op::Parameter);
            self.bind_pattern(input, param, false);
        }
        let value = self.lower_value(&expr.body);
        if self.reachable() {
            self.func.add_with(Op::Return, &[value]);
        }

        self.env.pop_scope();
        self.frames = saved_frames;
        self.defs = saved_defs;
        self.func.add(Op::Closure)
    }

    pub(super) fn lower_async(&mut self, expr: &syn::ExprAsync) -> NodeIndex {
        let saved_defs = self.defs.clone();
        let saved_frames = std::mem::take(&mut self.frames);

        let value = self.lower_block(&expr.block);
        if self.reachable() {
            self.func.add_with(Op::Return, &[value]);
        }

        self.frames = saved_frames;
        self.defs = saved_defs;
        self.func.add(Op::Closure)
    }
}
