//! Pattern bindings.
//!
//! A lone identifier binds the matched value itself. Destructuring binds
//! one `Extract` projection per component that contains a binding.
//! Or-patterns bind each name to the merge of its alternatives.

use petgraph::stable_graph::NodeIndex;
use proc_macro2::Ident;
use syn::ext::IdentExt;
use syn::visit::{self, Visit};
use syn::Pat;

use super::body::FunctionBuilder;
use crate::occurrence::DeclKind;
use crate::ssa::Op;

struct Binding {
    ident: Ident,
    value: NodeIndex,
}

impl FunctionBuilder<'_> {
    /// Declare every name `pat` binds. Parameters pass `bound = false`.
    pub(super) fn bind_pattern(&mut self, pat: &Pat, value: NodeIndex, bound: bool) {
        let mut bindings = Vec::new();
        self.collect_bindings(pat, value, &mut bindings);
        for binding in bindings {
            self.declare(&binding.ident, Some(binding.value), bound);
        }
    }

    /// `let x;` declares without a value.
    pub(super) fn declare_uninit(&mut self, pat: &Pat) {
        let idents: Vec<Ident> = pat_idents(pat)
            .into_iter()
            .filter(|pi| !self.is_path_like(pi))
            .map(|pi| pi.ident.clone())
            .collect();
        for ident in idents {
            self.declare(&ident, None, true);
        }
    }

    /// Identifiers in pattern position that name a constant, a unit
    /// struct or a variant instead of introducing a binding.
    fn is_path_like(&self, pi: &syn::PatIdent) -> bool {
        if pi.by_ref.is_some() || pi.mutability.is_some() || pi.subpat.is_some() {
            return false;
        }
        let name = pi.ident.unraw().to_string();
        name.starts_with(char::is_uppercase)
            || matches!(
                self.items.kind_of(&name),
                Some(DeclKind::Constant | DeclKind::Static)
            )
    }

    fn binds(&self, pat: &Pat) -> bool {
        pat_idents(pat).into_iter().any(|pi| !self.is_path_like(pi))
    }

    fn collect_bindings(&mut self, pat: &Pat, value: NodeIndex, out: &mut Vec<Binding>) {
        match pat {
            Pat::Ident(pi) => {
                if self.is_path_like(pi) {
                    self.read_item(&pi.ident, true);
                    return;
                }
                if let Some((_, sub)) = &pi.subpat {
                    self.collect_bindings(sub, value, out);
                }
                out.push(Binding {
                    ident: pi.ident.clone(),
                    value,
                });
            }
            Pat::Tuple(t) => self.collect_parts(t.elems.iter(), value, out),
            Pat::TupleStruct(t) => self.collect_parts(t.elems.iter(), value, out),
            Pat::Slice(s) => self.collect_parts(s.elems.iter(), value, out),
            Pat::Struct(s) => self.collect_parts(s.fields.iter().map(|f| &*f.pat), value, out),
            Pat::Reference(r) => self.collect_parts(std::iter::once(&*r.pat), value, out),
            Pat::Paren(p) => self.collect_bindings(&p.pat, value, out),
            Pat::Type(t) => self.collect_bindings(&t.pat, value, out),
            Pat::Or(o) => self.collect_alternatives(o, value, out),
            _ => {}
        }
    }

    fn collect_parts<'p>(
        &mut self,
        parts: impl Iterator<Item = &'p Pat>,
        value: NodeIndex,
        out: &mut Vec<Binding>,
    ) {
        for (i, part) in parts.enumerate() {
            if self.binds(part) {
                let projection = self.func.add_with(Op::Extract(i), &[value]);
                self.collect_bindings(part, projection, out);
            } else {
                // still records constants and variants named in the part
                self.collect_bindings(part, value, out);
            }
        }
    }

    fn collect_alternatives(&mut self, or: &syn::PatOr, value: NodeIndex, out: &mut Vec<Binding>) {
        let mut groups: Vec<(String, Vec<Ident>, Vec<NodeIndex>)> = Vec::new();
        for case in &or.cases {
            let mut case_bindings = Vec::new();
            self.collect_bindings(case, value, &mut case_bindings);
            for binding in case_bindings {
                let name = binding.ident.unraw().to_string();
                match groups.iter_mut().find(|(n, _, _)| *n == name) {
                    Some((_, idents, values)) => {
                        idents.push(binding.ident);
                        values.push(binding.value);
                    }
                    None => groups.push((name, vec![binding.ident], vec![binding.value])),
                }
            }
        }

        for (_, idents, mut values) in groups {
            values.sort();
            values.dedup();
            let merged = match values.as_slice() {
                [single] => *single,
                many => self.func.add_with(Op::Phi, many),
            };
            out.extend(idents.into_iter().map(|ident| Binding { ident, value: merged }));
        }
    }
}

/// Every identifier pattern inside `pat`, in source order.
fn pat_idents(pat: &Pat) -> Vec<&syn::PatIdent> {
    #[derive(Default)]
    struct Idents<'ast>(Vec<&'ast syn::PatIdent>);

    impl<'ast> Visit<'ast> for Idents<'ast> {
        fn visit_pat_ident(&mut self, node: &'ast syn::PatIdent) {
            self.0.push(node);
            visit::visit_pat_ident(self, node);
        }
    }

    let mut idents = Idents::default();
    idents.visit_pat(pat);
    idents.0
}
