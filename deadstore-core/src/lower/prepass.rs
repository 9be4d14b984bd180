//! Syntactic pre-passes over a function body.
//!
//! - `assigned_names`: which variables a loop body writes, so the loop
//!   header can place phis before the body is lowered.
//! - `captured_assignments`: which variables are written from inside a
//!   closure or async block and must therefore live in memory.

use std::collections::HashSet;

use syn::ext::IdentExt;
use syn::visit::{self, Visit};

/// Collect the identifiers an assignment target writes to.
pub(crate) fn target_names(target: &syn::Expr, out: &mut HashSet<String>) {
    match target {
        syn::Expr::Path(p) if p.qself.is_none() => {
            if let Some(ident) = p.path.get_ident() {
                out.insert(ident.unraw().to_string());
            }
        }
        syn::Expr::Paren(p) => target_names(&p.expr, out),
        syn::Expr::Tuple(t) => t.elems.iter().for_each(|e| target_names(e, out)),
        syn::Expr::Array(a) => a.elems.iter().for_each(|e| target_names(e, out)),
        syn::Expr::Struct(s) => s.fields.iter().for_each(|f| target_names(&f.expr, out)),
        syn::Expr::Call(c) => c.args.iter().for_each(|e| target_names(e, out)),
        _ => {}
    }
}

pub(crate) fn is_compound_assign(op: &syn::BinOp) -> bool {
    use syn::BinOp::*;
    matches!(
        op,
        AddAssign(_)
            | SubAssign(_)
            | MulAssign(_)
            | DivAssign(_)
            | RemAssign(_)
            | BitXorAssign(_)
            | BitAndAssign(_)
            | BitOrAssign(_)
            | ShlAssign(_)
            | ShrAssign(_)
    )
}

/// Names bound by a pattern.
pub(crate) fn pattern_names(pat: &syn::Pat, out: &mut HashSet<String>) {
    struct Names<'a>(&'a mut HashSet<String>);
    impl<'ast> Visit<'ast> for Names<'_> {
        fn visit_pat_ident(&mut self, node: &'ast syn::PatIdent) {
            self.0.insert(node.ident.unraw().to_string());
            visit::visit_pat_ident(self, node);
        }
    }
    Names(out).visit_pat(pat);
}

/// Names written in a subtree. Writes inside closures and async blocks go
/// through memory and are skipped unless `into_closures` is set.
#[derive(Default)]
struct Writes {
    names: HashSet<String>,
    into_closures: bool,
}

impl<'ast> Visit<'ast> for Writes {
    fn visit_expr_assign(&mut self, node: &'ast syn::ExprAssign) {
        target_names(&node.left, &mut self.names);
        visit::visit_expr_assign(self, node);
    }

    fn visit_expr_binary(&mut self, node: &'ast syn::ExprBinary) {
        if is_compound_assign(&node.op) {
            target_names(&node.left, &mut self.names);
        }
        visit::visit_expr_binary(self, node);
    }

    fn visit_expr_closure(&mut self, node: &'ast syn::ExprClosure) {
        if self.into_closures {
            visit::visit_expr_closure(self, node);
        }
    }

    fn visit_expr_async(&mut self, node: &'ast syn::ExprAsync) {
        if self.into_closures {
            visit::visit_expr_async(self, node);
        }
    }

    fn visit_item(&mut self, _: &'ast syn::Item) {}
}

/// Variables assigned anywhere in `body` (and `cond`, for `while`).
pub(crate) fn assigned_names(body: &syn::Block, cond: Option<&syn::Expr>) -> HashSet<String> {
    let mut v = Writes::default();
    if let Some(cond) = cond {
        v.visit_expr(cond);
    }
    v.visit_block(body);
    v.names
}

/// Names declared by `let` anywhere in a subtree.
#[derive(Default)]
struct Declared {
    names: HashSet<String>,
}

impl<'ast> Visit<'ast> for Declared {
    fn visit_local(&mut self, node: &'ast syn::Local) {
        pattern_names(&node.pat, &mut self.names);
        visit::visit_local(self, node);
    }

    fn visit_item(&mut self, _: &'ast syn::Item) {}
}

#[derive(Default)]
struct Captures {
    names: HashSet<String>,
}

impl Captures {
    fn capture(&mut self, writes: Writes, declared: Declared) {
        self.names
            .extend(writes.names.difference(&declared.names).cloned());
    }
}

impl<'ast> Visit<'ast> for Captures {
    fn visit_expr_closure(&mut self, node: &'ast syn::ExprClosure) {
        let mut writes = Writes {
            into_closures: true,
            ..Writes::default()
        };
        writes.visit_expr(&node.body);
        let mut declared = Declared::default();
        for input in &node.inputs {
            pattern_names(input, &mut declared.names);
        }
        declared.visit_expr(&node.body);
        self.capture(writes, declared);
        visit::visit_expr_closure(self, node);
    }

    fn visit_expr_async(&mut self, node: &'ast syn::ExprAsync) {
        let mut writes = Writes {
            into_closures: true,
            ..Writes::default()
        };
        writes.visit_block(&node.block);
        let mut declared = Declared::default();
        declared.visit_block(&node.block);
        self.capture(writes, declared);
        visit::visit_expr_async(self, node);
    }

    fn visit_item(&mut self, _: &'ast syn::Item) {}
}

/// Variables written from inside a closure or async block that are not
/// declared there.
pub(crate) fn captured_assignments(body: &syn::Block) -> HashSet<String> {
    let mut v = Captures::default();
    v.visit_block(body);
    v.names
}
