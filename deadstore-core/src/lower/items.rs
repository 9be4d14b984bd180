//! Item table: what a non-local name refers to.
//!
//! Built per file and merged across the crate, so a path to a `static`
//! declared in another module still resolves to global storage.

use std::collections::HashMap;

use syn::visit::{self, Visit};

use crate::occurrence::DeclKind;

#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    items: HashMap<String, DeclKind>,
}

/// When one name is declared as several kinds, the variable wins so
/// writes to it are never judged as locals.
fn rank(kind: DeclKind) -> u8 {
    match kind {
        DeclKind::Static => 4,
        DeclKind::Function => 3,
        DeclKind::Constant => 2,
        DeclKind::Type => 1,
        DeclKind::Local | DeclKind::Unknown => 0,
    }
}

impl ItemTable {
    pub fn from_file(file: &syn::File) -> Self {
        let mut collector = ItemCollector::default();
        collector.visit_file(file);
        collector.table
    }

    pub fn insert(&mut self, name: impl Into<String>, kind: DeclKind) {
        let entry = self.items.entry(name.into()).or_insert(kind);
        if rank(kind) > rank(*entry) {
            *entry = kind;
        }
    }

    pub fn merge(mut self, other: ItemTable) -> Self {
        for (name, kind) in other.items {
            self.insert(name, kind);
        }
        self
    }

    pub fn kind_of(&self, name: &str) -> Option<DeclKind> {
        self.items.get(name).copied()
    }

    pub fn is_static(&self, name: &str) -> bool {
        self.kind_of(name) == Some(DeclKind::Static)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Default)]
struct ItemCollector {
    table: ItemTable,
}

impl<'ast> Visit<'ast> for ItemCollector {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.table.insert(node.sig.ident.to_string(), DeclKind::Function);
        visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.table.insert(node.sig.ident.to_string(), DeclKind::Function);
        visit::visit_impl_item_fn(self, node);
    }

    fn visit_trait_item_fn(&mut self, node: &'ast syn::TraitItemFn) {
        self.table.insert(node.sig.ident.to_string(), DeclKind::Function);
        visit::visit_trait_item_fn(self, node);
    }

    fn visit_item_const(&mut self, node: &'ast syn::ItemConst) {
        self.table.insert(node.ident.to_string(), DeclKind::Constant);
        visit::visit_item_const(self, node);
    }

    fn visit_impl_item_const(&mut self, node: &'ast syn::ImplItemConst) {
        self.table.insert(node.ident.to_string(), DeclKind::Constant);
        visit::visit_impl_item_const(self, node);
    }

    fn visit_item_static(&mut self, node: &'ast syn::ItemStatic) {
        self.table.insert(node.ident.to_string(), DeclKind::Static);
        visit::visit_item_static(self, node);
    }

    fn visit_foreign_item_static(&mut self, node: &'ast syn::ForeignItemStatic) {
        self.table.insert(node.ident.to_string(), DeclKind::Static);
    }

    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        self.table.insert(node.ident.to_string(), DeclKind::Type);
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        self.table.insert(node.ident.to_string(), DeclKind::Type);
        for variant in &node.variants {
            self.table.insert(variant.ident.to_string(), DeclKind::Type);
        }
    }

    fn visit_item_type(&mut self, node: &'ast syn::ItemType) {
        self.table.insert(node.ident.to_string(), DeclKind::Type);
    }

    fn visit_item_trait(&mut self, node: &'ast syn::ItemTrait) {
        self.table.insert(node.ident.to_string(), DeclKind::Type);
        visit::visit_item_trait(self, node);
    }

    fn visit_item_union(&mut self, node: &'ast syn::ItemUnion) {
        self.table.insert(node.ident.to_string(), DeclKind::Type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> ItemTable {
        ItemTable::from_file(&syn::parse_file(src).unwrap())
    }

    #[test]
    fn test_collects_item_kinds() {
        let t = table(
            r#"
            static COUNTER: u32 = 0;
            const LIMIT: u32 = 10;
            fn run() {}
            struct Config;
            enum Mode { Fast, Slow }
            mod inner { pub static mut STATE: i32 = 0; }
            impl Config { fn load() {} const DEFAULT: u8 = 1; }
            "#,
        );
        assert_eq!(t.kind_of("COUNTER"), Some(DeclKind::Static));
        assert_eq!(t.kind_of("STATE"), Some(DeclKind::Static));
        assert_eq!(t.kind_of("LIMIT"), Some(DeclKind::Constant));
        assert_eq!(t.kind_of("DEFAULT"), Some(DeclKind::Constant));
        assert_eq!(t.kind_of("run"), Some(DeclKind::Function));
        assert_eq!(t.kind_of("load"), Some(DeclKind::Function));
        assert_eq!(t.kind_of("Config"), Some(DeclKind::Type));
        assert_eq!(t.kind_of("Fast"), Some(DeclKind::Type));
        assert_eq!(t.kind_of("missing"), None);
    }

    #[test]
    fn test_static_wins_on_merge() {
        let a = table("fn value() {}");
        let b = table("static value: i32 = 1;");
        let merged = a.merge(b);
        assert!(merged.is_static("value"));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_items_nested_in_functions() {
        let t = table("fn outer() { static SEEN: bool = false; fn helper() {} }");
        assert!(t.is_static("SEEN"));
        assert_eq!(t.kind_of("helper"), Some(DeclKind::Function));
    }
}
