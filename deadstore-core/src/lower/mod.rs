//! Rust source front-end.
//!
//! Turns source files into a [`Program`]: the occurrence tables plus one
//! def-use graph per function.
//!
//! # Pipeline
//!
//! 1. Read and parse every file in parallel, collecting the item table
//! 2. Merge the per-file item tables
//! 3. Lower every file in parallel: record occurrences, build graphs
//!
//! Syntax trees are not `Send`, so each worker parses its own file in both
//! passes instead of handing trees across threads.
//!
//! Any read or parse failure aborts the load. No partial program is built.

mod body;
mod control;
mod env;
pub mod items;
mod macros;
mod pattern;
mod prepass;

use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::{Ident, Span};
use rayon::prelude::*;
use syn::ext::IdentExt;
use syn::visit::{self, Visit};
use tracing::info;

use crate::error::{DeadstoreError, DeadstoreResult, IoResultExt};
use crate::occurrence::{DeclKind, Declaration, Occurrence, OccurrenceId, Position, Role};
use crate::ssa::{Function, Program};
use body::FunctionBuilder;
pub use items::ItemTable;
pub use macros::implicit_captures;

/// Files larger than this are rejected (10 MB).
const MAX_FILE_SIZE: usize = 10_000_000;

/// Collects occurrences for one file, assigning ids in encounter order.
pub(crate) struct OccurrenceSink {
    file: u32,
    path: PathBuf,
    occurrences: Vec<Occurrence>,
}

impl OccurrenceSink {
    fn new(file: u32, path: PathBuf) -> Self {
        Self {
            file,
            path,
            occurrences: Vec::new(),
        }
    }

    fn position(&self, span: Span) -> Position {
        let start = span.start();
        Position::new(self.path.clone(), start.line, start.column + 1)
    }

    /// Position of the last character covered by `span`.
    fn end_position(&self, span: Span) -> Position {
        let end = span.end();
        Position::new(self.path.clone(), end.line, end.column)
    }

    pub(crate) fn record(&mut self, ident: &Ident, role: Role, kind: DeclKind) -> OccurrenceId {
        let id = OccurrenceId {
            file: self.file,
            index: self.occurrences.len() as u32,
        };
        let name = ident.unraw().to_string();
        self.occurrences.push(Occurrence {
            id,
            position: self.position(ident.span()),
            decl: Declaration::new(name.clone(), kind),
            name,
            role,
        });
        id
    }
}

/// Walks the items of one file and lowers every function body.
struct FileLowerer<'a> {
    items: &'a ItemTable,
    sink: OccurrenceSink,
    functions: Vec<Function>,
}

impl FileLowerer<'_> {
    fn lower_fn(&mut self, sig: &syn::Signature, block: &syn::Block) {
        self.sink
            .record(&sig.ident, Role::Definition, DeclKind::Function);
        let start = self.sink.position(sig.fn_token.span);
        let end = self.sink.end_position(block.brace_token.span.close());
        let func = Function::new(sig.ident.unraw().to_string(), start, end);
        let builder = FunctionBuilder::new(self.items, &mut self.sink, func, block);
        self.functions.push(builder.lower_fn(sig, block));
    }
}

impl<'ast> Visit<'ast> for FileLowerer<'_> {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.lower_fn(&node.sig, &node.block);
        // nested fns inside the body
        visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.lower_fn(&node.sig, &node.block);
        visit::visit_impl_item_fn(self, node);
    }

    fn visit_trait_item_fn(&mut self, node: &'ast syn::TraitItemFn) {
        match &node.default {
            Some(block) => self.lower_fn(&node.sig, block),
            None => {
                self.sink
                    .record(&node.sig.ident, Role::Definition, DeclKind::Function);
            }
        }
        visit::visit_trait_item_fn(self, node);
    }

    fn visit_item_const(&mut self, node: &'ast syn::ItemConst) {
        self.sink
            .record(&node.ident, Role::Definition, DeclKind::Constant);
        visit::visit_item_const(self, node);
    }

    fn visit_impl_item_const(&mut self, node: &'ast syn::ImplItemConst) {
        self.sink
            .record(&node.ident, Role::Definition, DeclKind::Constant);
        visit::visit_impl_item_const(self, node);
    }

    fn visit_item_static(&mut self, node: &'ast syn::ItemStatic) {
        self.sink
            .record(&node.ident, Role::Definition, DeclKind::Static);
        visit::visit_item_static(self, node);
    }
}

/// Occurrences and graphs produced for one file.
struct FileOutput {
    functions: Vec<Function>,
    occurrences: Vec<Occurrence>,
}

fn parse(path: &Path, source: &str) -> DeadstoreResult<syn::File> {
    if source.len() > MAX_FILE_SIZE {
        return Err(DeadstoreError::parse(
            path,
            format!("File too large ({} bytes, max {})", source.len(), MAX_FILE_SIZE),
        ));
    }
    syn::parse_file(source).map_err(|e| DeadstoreError::from_syn(path, &e))
}

fn lower_file(index: u32, path: &Path, source: &str, items: &ItemTable) -> DeadstoreResult<FileOutput> {
    let ast = parse(path, source)?;
    let mut lowerer = FileLowerer {
        items,
        sink: OccurrenceSink::new(index, path.to_path_buf()),
        functions: Vec::new(),
    };
    lowerer.visit_file(&ast);
    Ok(FileOutput {
        functions: lowerer.functions,
        occurrences: lowerer.sink.occurrences,
    })
}

fn assemble(files: Vec<PathBuf>, outputs: Vec<FileOutput>) -> Program {
    let mut functions = Vec::new();
    let mut occurrences = Vec::new();
    for output in outputs {
        functions.extend(output.functions);
        occurrences.extend(output.occurrences);
    }
    let program = Program::new(files, functions, occurrences);
    info!(
        files = program.files.len(),
        functions = program.functions.len(),
        occurrences = program.occurrence_count(),
        "program loaded"
    );
    program
}

/// Read, parse and lower `files`. Fails on the first unreadable or
/// unparsable file.
pub fn load_program(files: &[PathBuf]) -> DeadstoreResult<Program> {
    // 1. Read + parse, collecting items per file
    let loaded: Vec<(String, ItemTable)> = files
        .par_iter()
        .map(|path| -> DeadstoreResult<(String, ItemTable)> {
            let source = fs::read_to_string(path).with_path(path)?;
            let items = ItemTable::from_file(&parse(path, &source)?);
            Ok((source, items))
        })
        .collect::<DeadstoreResult<Vec<_>>>()?;

    // 2. Crate-wide item table
    let (sources, tables): (Vec<String>, Vec<ItemTable>) = loaded.into_iter().unzip();
    let items = tables
        .into_par_iter()
        .reduce(ItemTable::default, ItemTable::merge);

    // 3. Lower
    let outputs = files
        .par_iter()
        .zip(sources.par_iter())
        .enumerate()
        .map(|(i, (path, source))| lower_file(i as u32, path, source, &items))
        .collect::<DeadstoreResult<Vec<_>>>()?;

    Ok(assemble(files.to_vec(), outputs))
}

/// Lower a single in-memory source file.
pub fn lower_source(path: impl Into<PathBuf>, source: &str) -> DeadstoreResult<Program> {
    let path = path.into();
    let items = ItemTable::from_file(&parse(&path, source)?);
    let output = lower_file(0, &path, source, &items)?;
    Ok(assemble(vec![path], vec![output]))
}
