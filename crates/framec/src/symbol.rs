/// Symbol table: maps source-level names to qualified target paths.
///
/// Keys are logical names. Free functions, classes, variables and imports use their
/// own identifier; class members use [`member_key`] (`className + memberName`).
/// Scopes nest: the unit scope is at the bottom, and every hoisted script body gets
/// its own scope on top. Registering an existing key in the same scope overwrites
/// it; in an inner scope it shadows until the scope is exited. Lookups that miss
/// fall back to the raw name, so calls to external or runtime functions still
/// resolve to something.

use std::collections::HashMap;
use framec_language::ast::DeclId;

/// Suffix of a class's constructor script (`C_INIT`).
pub const INIT_SUFFIX: &str = "_INIT";
/// Suffix of a class's field-initializer script (`CCLASS`).
pub const CLASS_SUFFIX: &str = "CLASS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Class,
    Method,
    StaticMethod,
    Field,
    Import,
    /// `import * as ns from "..."`: the path is the module context.
    Namespace,
}

/// A single symbol entry in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub path: String,
    pub kind: SymbolKind,
    /// Declaration the symbol was registered from, when it has one in this unit.
    pub decl: Option<DeclId>,
}

#[derive(Debug)]
pub struct SymbolTable {
    /// Stack of scopes; each scope maps key -> Symbol.
    scopes: Vec<HashMap<String, Symbol>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()], // unit scope
        }
    }

    /// Enter a new nested scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Exit the current scope. The unit scope is never popped.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Current scope depth (0 = unit).
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn register(&mut self, name: &str, path: &str, kind: SymbolKind) {
        self.insert(name, path, kind, None);
    }

    pub fn register_decl(&mut self, name: &str, path: &str, kind: SymbolKind, decl: DeclId) {
        self.insert(name, path, kind, Some(decl));
    }

    fn insert(&mut self, name: &str, path: &str, kind: SymbolKind, decl: Option<DeclId>) {
        if let Some(previous) = self.lookup(name) {
            log::trace!("symbol `{}` rebound at depth {}: {} -> {}", name, self.depth(), previous.path, path);
        }
        let symbol = Symbol {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            decl,
        };
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), symbol);
        }
    }

    /// Innermost symbol registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Qualified path for `name`, or `name` itself when it is unknown.
    pub fn resolve(&self, name: &str) -> String {
        match self.lookup(name) {
            Some(symbol) => symbol.path.clone(),
            None => name.to_string(),
        }
    }

    /// True when `name` is registered as a class.
    pub fn is_class(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some(symbol) if symbol.kind == SymbolKind::Class)
    }

    /// Drop every symbol and every nested scope.
    pub fn clear(&mut self) {
        self.scopes.truncate(1);
        self.scopes[0].clear();
    }

    /// Number of entries across all scopes, shadowed ones included.
    pub fn len(&self) -> usize {
        self.scopes.iter().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.iter().all(HashMap::is_empty)
    }
}

/// Lookup key of a class member.
pub fn member_key(class: &str, member: &str) -> String {
    format!("{}{}", class, member)
}

/// `context/name`
pub fn qualify(context: &str, name: &str) -> String {
    format!("{}/{}", context, name)
}

/// Script name of a method (`C_m`).
pub fn method_script(class: &str, method: &str) -> String {
    format!("{}_{}", class, method)
}
