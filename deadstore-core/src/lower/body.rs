//! Function body lowering: statements, expressions and variable access.
//!
//! Lowering is a single flow-sensitive pass. `defs` holds the value each
//! register variable has on the current path; `None` means the path is
//! unreachable, and occurrences met there are recorded but never bound.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;
use proc_macro2::Ident;
use syn::ext::IdentExt;
use syn::visit::{self, Visit};
use syn::{Expr, Stmt};
use tracing::debug;

use super::control::Frame;
use super::env::{Defs, Env, VarId};
use super::items::ItemTable;
use super::prepass;
use super::OccurrenceSink;
use crate::occurrence::{DeclKind, OccurrenceId, Role};
use crate::ssa::{Function, Op, UnaryOp};

pub(crate) struct FunctionBuilder<'a> {
    pub(super) items: &'a ItemTable,
    pub(super) sink: &'a mut OccurrenceSink,
    pub(super) func: Function,
    pub(super) env: Env,
    pub(super) defs: Option<Defs>,
    pub(super) frames: Vec<Frame>,
    /// Names written from closures or async blocks
    memory: HashSet<String>,
    /// One `Global` node per static read or written in this function
    globals: HashMap<String, NodeIndex>,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(
        items: &'a ItemTable,
        sink: &'a mut OccurrenceSink,
        func: Function,
        body: &syn::Block,
    ) -> Self {
        Self {
            items,
            sink,
            func,
            env: Env::new(),
            defs: Some(Defs::new()),
            frames: Vec::new(),
            memory: prepass::captured_assignments(body),
            globals: HashMap::new(),
        }
    }

    /// Lower parameters and body, then prune speculative phis.
    pub fn lower_fn(mut self, sig: &syn::Signature, body: &syn::Block) -> Function {
        for input in &sig.inputs {
            let param = self.func.add(Op::Parameter);
            match input {
                syn::FnArg::Receiver(_) => {
                    let var = self.env.declare("self", None);
                    self.set(var, param);
                }
                syn::FnArg::Typed(pt) => self.bind_pattern(&pt.pat, param, false),
            }
        }

        let tail = self.lower_block(body);
        if self.reachable() {
            self.func.add_with(Op::Return, &[tail]);
        }

        let removed = self.func.eliminate_dead_phis();
        debug!(
            function = %self.func.name,
            nodes = self.func.node_count(),
            bindings = self.func.binding_count(),
            removed_phis = removed,
            "lowered function"
        );
        self.func
    }

    pub(super) fn reachable(&self) -> bool {
        self.defs.is_some()
    }

    pub(super) fn constant(&mut self) -> NodeIndex {
        self.func.add(Op::Const)
    }

    fn set(&mut self, var: VarId, value: NodeIndex) {
        if let Some(defs) = self.defs.as_mut() {
            defs.insert(var, value);
        }
    }

    fn current(&self, var: VarId) -> Option<NodeIndex> {
        self.defs.as_ref()?.get(&var).copied()
    }

    fn record(&mut self, ident: &Ident, role: Role, kind: DeclKind) -> OccurrenceId {
        self.sink.record(ident, role, kind)
    }

    /// Bind an occurrence, unless the current path is unreachable.
    fn bind(&mut self, id: OccurrenceId, value: NodeIndex) {
        if self.reachable() {
            self.func.bind(id, value);
        }
    }

    fn global(&mut self, name: &str) -> NodeIndex {
        if let Some(&node) = self.globals.get(name) {
            return node;
        }
        let node = self.func.add(Op::Global);
        self.globals.insert(name.to_string(), node);
        node
    }

    // ---------------------------------------------------------------
    // Variable access
    // ---------------------------------------------------------------

    /// Introduce a new local. `bound` is false for parameters, whose
    /// definitions are recorded without a value.
    pub(super) fn declare(&mut self, ident: &Ident, value: Option<NodeIndex>, bound: bool) {
        let name = ident.unraw().to_string();
        if self.memory.contains(&name) {
            let slot = self.func.add(Op::Alloc);
            if let Some(value) = value {
                self.func.add_with(Op::Store, &[value, slot]);
            }
            self.env.declare(&name, Some(slot));
            let id = self.record(ident, Role::Definition, DeclKind::Local);
            if bound {
                self.bind(id, slot);
            }
            return;
        }

        let var = self.env.declare(&name, None);
        let id = self.record(ident, Role::Definition, DeclKind::Local);
        if let Some(value) = value {
            self.set(var, value);
            if bound {
                self.bind(id, value);
            }
        }
    }

    /// Read a name, recording a use occurrence.
    pub(super) fn read_ident(&mut self, ident: &Ident) -> NodeIndex {
        self.access(ident, true)
    }

    /// Current value of a name without recording an occurrence.
    fn peek_ident(&mut self, ident: &Ident) -> NodeIndex {
        self.access(ident, false)
    }

    fn access(&mut self, ident: &Ident, record: bool) -> NodeIndex {
        let name = ident.unraw().to_string();
        let Some(var) = self.env.lookup(&name) else {
            return self.read_item(ident, record);
        };
        // the receiver is implicit and never judged
        let record = record && name != "self";

        if let Some(slot) = self.env.var(var).slot {
            let load = self.func.add_with(Op::Load, &[slot]);
            if record {
                let id = self.record(ident, Role::Use, DeclKind::Local);
                self.bind(id, load);
            }
            return load;
        }

        let value = self.current(var);
        if record {
            let id = self.record(ident, Role::Use, DeclKind::Local);
            if let Some(value) = value {
                self.bind(id, value);
            }
        }
        value.unwrap_or_else(|| self.func.add(Op::Opaque))
    }

    /// Reference to a name that is not a local.
    pub(super) fn read_item(&mut self, ident: &Ident, record: bool) -> NodeIndex {
        let name = ident.unraw().to_string();
        let kind = self.items.kind_of(&name).unwrap_or(DeclKind::Unknown);
        if kind == DeclKind::Static {
            let global = self.global(&name);
            let load = self.func.add_with(Op::Load, &[global]);
            if record {
                let id = self.record(ident, Role::Use, kind);
                self.bind(id, load);
            }
            return load;
        }
        if record {
            self.record(ident, Role::Use, kind);
        }
        self.func.add(Op::Item)
    }

    /// Assign `value` to a name. The target occurrence binds the new value.
    pub(super) fn write_ident(&mut self, ident: &Ident, value: NodeIndex) {
        let name = ident.unraw().to_string();
        match self.env.lookup(&name) {
            Some(var) => {
                let id = self.record(ident, Role::Use, DeclKind::Local);
                if let Some(slot) = self.env.var(var).slot {
                    self.func.add_with(Op::Store, &[value, slot]);
                    self.bind(id, slot);
                } else {
                    self.set(var, value);
                    self.bind(id, value);
                }
            }
            None if self.items.is_static(&name) => {
                let global = self.global(&name);
                self.func.add_with(Op::Store, &[value, global]);
                let id = self.record(ident, Role::Use, DeclKind::Static);
                self.bind(id, global);
            }
            None => {
                let kind = self.items.kind_of(&name).unwrap_or(DeclKind::Unknown);
                self.record(ident, Role::Use, kind);
            }
        }
    }

    // ---------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------

    pub(super) fn lower_block(&mut self, block: &syn::Block) -> NodeIndex {
        self.env.push_scope();
        let mut value = None;
        let last = block.stmts.len().saturating_sub(1);
        for (i, stmt) in block.stmts.iter().enumerate() {
            let is_tail = i == last;
            match stmt {
                Stmt::Local(local) => self.lower_local(local),
                // nested items are lowered on their own
                Stmt::Item(_) => {}
                Stmt::Expr(expr, None) if is_tail => value = Some(self.lower_value(expr)),
                Stmt::Expr(expr, _) => self.lower_discarded(expr),
                Stmt::Macro(m) => {
                    let v = self.lower_macro(&m.mac);
                    if is_tail && m.semi_token.is_none() {
                        value = Some(v);
                    }
                }
            }
        }
        self.env.pop_scope();
        value.unwrap_or_else(|| self.constant())
    }

    fn lower_local(&mut self, local: &syn::Local) {
        let init = local.init.as_ref().map(|init| {
            let value = self.lower_value(&init.expr);
            if let Some((_, diverge)) = &init.diverge {
                // `else` must diverge, so the main path continues unchanged
                let saved = self.defs.clone();
                self.lower_expr(diverge);
                self.defs = saved;
            }
            value
        });
        match init {
            Some(value) => self.bind_pattern(&local.pat, value, true),
            None => self.declare_uninit(&local.pat),
        }
    }

    /// An expression whose value is dropped. Naming a place still moves or
    /// copies out of it, which counts as a read.
    fn lower_discarded(&mut self, expr: &Expr) {
        let value = self.lower_expr(expr);
        if is_place(expr) {
            self.func.add_with(Op::Move, &[value]);
        }
    }

    // ---------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------

    /// Lower an expression whose value flows into a new binding. Reading a
    /// place produces a fresh `Move` so the source and the destination are
    /// judged separately.
    pub(super) fn lower_value(&mut self, expr: &Expr) -> NodeIndex {
        let value = self.lower_expr(expr);
        if is_place(expr) {
            self.func.add_with(Op::Move, &[value])
        } else {
            value
        }
    }

    pub(super) fn lower_expr(&mut self, expr: &Expr) -> NodeIndex {
        match expr {
            Expr::Lit(_) => self.constant(),
            Expr::Path(p) => self.lower_path(p),
            Expr::Paren(p) => self.lower_expr(&p.expr),
            Expr::Group(g) => self.lower_expr(&g.expr),
            Expr::Binary(b) if prepass::is_compound_assign(&b.op) => {
                self.lower_compound_assign(&b.left, &b.right);
                self.constant()
            }
            Expr::Binary(b) if matches!(b.op, syn::BinOp::And(_) | syn::BinOp::Or(_)) => {
                self.lower_short_circuit(&b.left, &b.right)
            }
            Expr::Binary(b) => {
                let left = self.lower_expr(&b.left);
                let right = self.lower_expr(&b.right);
                self.func.add_with(Op::BinOp, &[left, right])
            }
            Expr::Unary(u) => {
                let operand = self.lower_expr(&u.expr);
                let op = match u.op {
                    syn::UnOp::Deref(_) => Op::Unary(UnaryOp::Deref),
                    syn::UnOp::Not(_) => Op::Unary(UnaryOp::Not),
                    syn::UnOp::Neg(_) => Op::Unary(UnaryOp::Neg),
                    _ => Op::Opaque,
                };
                self.func.add_with(op, &[operand])
            }
            Expr::Assign(a) => {
                self.lower_assign(&a.left, &a.right);
                self.constant()
            }
            Expr::Call(c) => {
                let mut operands = vec![self.lower_expr(&c.func)];
                operands.extend(c.args.iter().map(|a| self.lower_expr(a)));
                self.func.add_with(Op::Call, &operands)
            }
            Expr::MethodCall(m) => {
                let mut operands = vec![self.lower_expr(&m.receiver)];
                operands.extend(m.args.iter().map(|a| self.lower_expr(a)));
                self.func.add_with(Op::Call, &operands)
            }
            Expr::Field(f) => {
                let base = self.lower_expr(&f.base);
                self.func.add_with(Op::Field, &[base])
            }
            Expr::Index(i) => {
                let base = self.lower_expr(&i.expr);
                let index = self.lower_expr(&i.index);
                self.func.add_with(Op::Index, &[base, index])
            }
            Expr::Reference(r) => {
                let place = self.lower_expr(&r.expr);
                self.func.add_with(Op::AddrOf, &[place])
            }
            Expr::Tuple(t) => self.aggregate(t.elems.iter()),
            Expr::Array(a) => self.aggregate(a.elems.iter()),
            Expr::Repeat(r) => {
                let elem = self.lower_expr(&r.expr);
                let len = self.lower_expr(&r.len);
                self.func.add_with(Op::Aggregate, &[elem, len])
            }
            Expr::Struct(s) => {
                let mut operands: Vec<NodeIndex> =
                    s.fields.iter().map(|f| self.lower_expr(&f.expr)).collect();
                if let Some(rest) = &s.rest {
                    operands.push(self.lower_expr(rest));
                }
                self.func.add_with(Op::Aggregate, &operands)
            }
            Expr::Cast(c) => {
                let operand = self.lower_expr(&c.expr);
                self.func.add_with(Op::Cast, &[operand])
            }
            Expr::Try(t) => {
                let operand = self.lower_expr(&t.expr);
                self.func.add_with(Op::Try, &[operand])
            }
            Expr::Await(a) => {
                let operand = self.lower_expr(&a.base);
                self.func.add_with(Op::Await, &[operand])
            }
            Expr::Range(r) => {
                let mut operands = Vec::new();
                if let Some(start) = &r.start {
                    operands.push(self.lower_expr(start));
                }
                if let Some(end) = &r.end {
                    operands.push(self.lower_expr(end));
                }
                self.func.add_with(Op::Range, &operands)
            }
            Expr::Block(b) => match &b.label {
                Some(label) => self.lower_labeled_block(label, &b.block),
                None => self.lower_block(&b.block),
            },
            Expr::Unsafe(u) => self.lower_block(&u.block),
            Expr::Const(c) => self.lower_block(&c.block),
            Expr::TryBlock(t) => self.lower_block(&t.block),
            Expr::If(i) => self.lower_if(i),
            Expr::Match(m) => self.lower_match(m),
            Expr::While(w) => self.lower_while(w),
            Expr::Loop(l) => self.lower_loop(l),
            Expr::ForLoop(f) => self.lower_for(f),
            Expr::Break(b) => self.lower_break(b),
            Expr::Continue(c) => self.lower_continue(c),
            Expr::Return(r) => self.lower_return(r),
            Expr::Closure(c) => self.lower_closure(c),
            Expr::Async(a) => self.lower_async(a),
            Expr::Let(l) => {
                let scrutinee = self.lower_expr(&l.expr);
                let matched = self.func.add_with(Op::Match, &[scrutinee]);
                self.bind_pattern(&l.pat, matched, true);
                matched
            }
            Expr::Macro(m) => self.lower_macro(&m.mac),
            _ => self.lower_opaque(expr),
        }
    }

    fn aggregate<'e>(&mut self, elems: impl Iterator<Item = &'e Expr>) -> NodeIndex {
        let operands: Vec<NodeIndex> = elems.map(|e| self.lower_expr(e)).collect();
        self.func.add_with(Op::Aggregate, &operands)
    }

    fn lower_path(&mut self, p: &syn::ExprPath) -> NodeIndex {
        if p.qself.is_none() {
            if let Some(ident) = p.path.get_ident() {
                return self.read_ident(ident);
            }
        }
        match p.path.segments.last() {
            Some(last) if self.items.is_static(&last.ident.unraw().to_string()) => {
                self.read_item(&last.ident, true)
            }
            _ => self.func.add(Op::Item),
        }
    }

    /// Anything without a dedicated rule: every visible local it mentions is
    /// read by one opaque consumer.
    fn lower_opaque(&mut self, expr: &Expr) -> NodeIndex {
        let mut idents = PathIdents::default();
        idents.visit_expr(expr);
        let mut reads = Vec::new();
        for ident in idents.0 {
            if self.env.lookup(&ident.unraw().to_string()).is_some() {
                reads.push(self.read_ident(&ident));
            }
        }
        self.func.add_with(Op::Opaque, &reads)
    }

    // ---------------------------------------------------------------
    // Assignment
    // ---------------------------------------------------------------

    fn lower_assign(&mut self, left: &Expr, right: &Expr) {
        match strip_parens(left) {
            Expr::Path(p) if p.qself.is_none() && p.path.get_ident().is_some() => {
                let value = self.lower_value(right);
                if let Some(ident) = p.path.get_ident() {
                    self.write_ident(ident, value);
                }
            }
            Expr::Infer(_) => {
                self.lower_value(right);
            }
            target @ (Expr::Tuple(_) | Expr::Array(_) | Expr::Call(_) | Expr::Struct(_)) => {
                let value = self.lower_expr(right);
                self.assign_to(target, value);
            }
            target => {
                let value = self.lower_value(right);
                let place = self.lower_expr(target);
                self.func.add_with(Op::Store, &[value, place]);
            }
        }
    }

    /// Destructuring assignment: each target receives a projection.
    fn assign_to(&mut self, target: &Expr, value: NodeIndex) {
        let elems: Vec<&Expr> = match target {
            Expr::Paren(p) => return self.assign_to(&p.expr, value),
            Expr::Infer(_) => return,
            Expr::Path(p) if p.qself.is_none() && p.path.get_ident().is_some() => {
                if let Some(ident) = p.path.get_ident() {
                    self.write_ident(ident, value);
                }
                return;
            }
            Expr::Tuple(t) => t.elems.iter().collect(),
            Expr::Array(a) => a.elems.iter().collect(),
            Expr::Call(c) => c.args.iter().collect(),
            Expr::Struct(s) => s.fields.iter().map(|f| &f.expr).collect(),
            other => {
                let place = self.lower_expr(other);
                self.func.add_with(Op::Store, &[value, place]);
                return;
            }
        };

        for (i, elem) in elems.into_iter().enumerate() {
            // `_` and `..` take nothing
            if matches!(elem, Expr::Infer(_) | Expr::Range(_)) {
                continue;
            }
            let part = self.func.add_with(Op::Extract(i), &[value]);
            self.assign_to(elem, part);
        }
    }

    /// `x op= rhs`: consumes the old value and rebinds the target.
    fn lower_compound_assign(&mut self, left: &Expr, right: &Expr) {
        let rhs = self.lower_expr(right);
        match strip_parens(left) {
            Expr::Path(p) if p.qself.is_none() && p.path.get_ident().is_some() => {
                if let Some(ident) = p.path.get_ident() {
                    let old = self.peek_ident(ident);
                    let new = self.func.add_with(Op::BinOp, &[old, rhs]);
                    self.write_ident(ident, new);
                }
            }
            target => {
                let place = self.lower_expr(target);
                let new = self.func.add_with(Op::BinOp, &[place, rhs]);
                self.func.add_with(Op::Store, &[new, place]);
            }
        }
    }
}

fn strip_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(p) => strip_parens(&p.expr),
        Expr::Group(g) => strip_parens(&g.expr),
        other => other,
    }
}

/// Whether evaluating `expr` names existing storage rather than computing a
/// new value.
pub(super) fn is_place(expr: &Expr) -> bool {
    match expr {
        Expr::Path(_) | Expr::Field(_) | Expr::Index(_) => true,
        Expr::Unary(u) => matches!(u.op, syn::UnOp::Deref(_)),
        Expr::Paren(p) => is_place(&p.expr),
        Expr::Group(g) => is_place(&g.expr),
        _ => false,
    }
}

#[derive(Default)]
struct PathIdents(Vec<Ident>);

impl<'ast> Visit<'ast> for PathIdents {
    fn visit_expr_path(&mut self, node: &'ast syn::ExprPath) {
        if node.qself.is_none() {
            if let Some(ident) = node.path.get_ident() {
                self.0.push(ident.clone());
            }
        }
        visit::visit_expr_path(self, node);
    }

    fn visit_item(&mut self, _: &'ast syn::Item) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(src: &str) -> Expr {
        syn::parse_str(src).unwrap()
    }

    #[test]
    fn test_places() {
        assert!(is_place(&expr("x")));
        assert!(is_place(&expr("self.items")));
        assert!(is_place(&expr("v[0]")));
        assert!(is_place(&expr("*r")));
        assert!(is_place(&expr("(x)")));
        assert!(!is_place(&expr("x + 1")));
        assert!(!is_place(&expr("f(x)")));
        assert!(!is_place(&expr("&x")));
        assert!(!is_place(&expr("-x")));
    }

    #[test]
    fn test_strip_parens() {
        let e = expr("((a, b))");
        assert!(matches!(strip_parens(&e), Expr::Tuple(_)));
    }
}
