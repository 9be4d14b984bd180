//! Macro invocations.
//!
//! Macro bodies are opaque token streams. When they parse as a
//! comma-separated expression list (`println!`, `assert_eq!`, `write!`, ...)
//! each argument is lowered normally, except that `name = expr` only reads
//! `expr`. Otherwise every identifier token that names a visible local counts
//! as a read.

use std::sync::OnceLock;

use petgraph::stable_graph::NodeIndex;
use proc_macro2::{Ident, TokenStream, TokenTree};
use regex::Regex;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{Expr, Token};

use super::body::FunctionBuilder;
use crate::ssa::Op;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("placeholder regex is valid"))
}

fn count_arg_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\$").expect("count argument regex is valid")
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Names a format string captures implicitly: `{name}`, `{name:?}` and
/// width or precision arguments such as `{:>width$.prec$}`.
pub fn implicit_captures(fmt: &str) -> Vec<String> {
    let mut names = Vec::new();
    for caps in placeholder_regex().captures_iter(fmt) {
        let Some(inner) = caps.get(1) else {
            continue;
        };
        let (arg, spec) = match inner.as_str().split_once(':') {
            Some((arg, spec)) => (arg.trim(), spec),
            None => (inner.as_str().trim(), ""),
        };
        if is_identifier(arg) {
            names.push(arg.to_string());
        }
        names.extend(
            count_arg_regex()
                .captures_iter(spec)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().to_string()),
        );
    }
    names
}

/// `name` of a `name = expr` macro argument.
fn named_argument(arg: &Expr) -> Option<String> {
    let Expr::Assign(assign) = arg else {
        return None;
    };
    match assign.left.as_ref() {
        Expr::Path(p) => p.path.get_ident().map(|i| i.unraw().to_string()),
        _ => None,
    }
}

impl FunctionBuilder<'_> {
    pub(super) fn lower_macro(&mut self, mac: &syn::Macro) -> NodeIndex {
        if mac.path.is_ident("macro_rules") {
            return self.constant();
        }

        let mut reads = Vec::new();
        match mac.parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
            Ok(args) => {
                let named: Vec<String> = args.iter().filter_map(named_argument).collect();
                for arg in &args {
                    match arg {
                        // `name = expr` is a format argument or a tracing field, never a store
                        Expr::Assign(assign) => {
                            reads.push(self.lower_expr(&assign.right));
                        }
                        Expr::Lit(syn::ExprLit {
                            lit: syn::Lit::Str(fmt),
                            ..
                        }) => {
                            reads.push(self.lower_expr(arg));
                            self.read_captures(fmt, &named, &mut reads);
                        }
                        _ => reads.push(self.lower_expr(arg)),
                    }
                }
            }
            Err(_) => self.scan_tokens(mac.tokens.clone(), &mut reads),
        }
        self.func.add_with(Op::MacroUse, &reads)
    }

    fn read_captures(&mut self, fmt: &syn::LitStr, named: &[String], reads: &mut Vec<NodeIndex>) {
        for name in implicit_captures(&fmt.value()) {
            if !named.contains(&name) && self.env.lookup(&name).is_some() {
                let ident = Ident::new(&name, fmt.span());
                reads.push(self.read_ident(&ident));
            }
        }
    }

    fn scan_tokens(&mut self, tokens: TokenStream, reads: &mut Vec<NodeIndex>) {
        let mut after_dot = false;
        for token in tokens {
            match &token {
                // `.field` and `.method()` are not variables
                TokenTree::Ident(ident) if !after_dot => {
                    if self.env.lookup(&ident.unraw().to_string()).is_some() {
                        reads.push(self.read_ident(ident));
                    }
                }
                TokenTree::Group(group) => self.scan_tokens(group.stream(), reads),
                TokenTree::Literal(literal) => {
                    if let syn::Lit::Str(fmt) = syn::Lit::new(literal.clone()) {
                        self.read_captures(&fmt, &[], reads);
                    }
                }
                _ => {}
            }
            after_dot = matches!(&token, TokenTree::Punct(p) if p.as_char() == '.');
        }
    }
}
