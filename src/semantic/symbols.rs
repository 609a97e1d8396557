use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Number,
    String,
    Boolean,
    Function,
    Any,
    /// Result of an expression that already produced a diagnostic.
    Error,
    Void,
}

impl Type {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Function => "function",
            Self::Any => "any",
            Self::Error => "error",
            Self::Void => "void",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Variable => "variable",
            Self::Function => "function",
            Self::Parameter => "parameter",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind,
    /// name of the scope the symbol was declared in
    pub scope: String,
    pub initialized: bool,
}

/// How declarations and lookups map onto the scope chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scoping {
    /// One namespace for the whole program. Scopes only label where a symbol
    /// was declared, so a name declared in a block collides with the same
    /// name anywhere else.
    #[default]
    Flat,
    /// Declarations go into the innermost scope and lookups walk outwards.
    Lexical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ScopeId(usize);

const GLOBAL: ScopeId = ScopeId(0);

#[derive(Debug, Clone)]
struct Scope {
    name: String,
    parent: Option<ScopeId>,
    names: HashMap<String, SymbolId>,
}

/// Symbols live in one arena in declaration order; scopes only hold indices
/// into it, and each scope knows its parent.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scoping: Scoping,
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
    block_counter: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(Scoping::default())
    }
}

impl SymbolTable {
    pub fn new(scoping: Scoping) -> Self {
        Self {
            scoping,
            symbols: Vec::new(),
            scopes: vec![Scope {
                name: "global".to_string(),
                parent: None,
                names: HashMap::new(),
            }],
            stack: vec![GLOBAL],
            block_counter: 0,
        }
    }

    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(GLOBAL)
    }

    pub fn current_scope(&self) -> &str {
        &self.scopes[self.current().0].name
    }

    /// Depth of the scope stack, `1` at the top level.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn enter_scope(&mut self, name: String) {
        let id = ScopeId(self.scopes.len());
        tracing::trace!(target: "semantic", "entering scope {name}");
        self.scopes.push(Scope {
            name,
            parent: Some(self.current()),
            names: HashMap::new(),
        });
        self.stack.push(id);
    }

    pub fn enter_block(&mut self) {
        self.block_counter += 1;
        self.enter_scope(format!("block_{}", self.block_counter));
    }

    pub fn enter_function(&mut self, name: &str) {
        self.enter_scope(format!("function_{}", name));
    }

    /// Leaves the innermost scope. The global scope is never left.
    pub fn exit_scope(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    // the scope a declaration made now would land in
    fn declaration_scope(&self) -> ScopeId {
        match self.scoping {
            Scoping::Flat => GLOBAL,
            Scoping::Lexical => self.current(),
        }
    }

    /// Declares `name` in the current scope. In [`Scoping::Flat`] a second
    /// declaration of the same name replaces the first one in place.
    pub fn declare(&mut self, name: &str, ty: Type, kind: SymbolKind) -> SymbolId {
        let symbol = Symbol {
            name: name.to_string(),
            ty,
            kind,
            scope: self.current_scope().to_string(),
            initialized: false,
        };
        let target = self.declaration_scope();
        if let Some(&id) = self.scopes[target.0].names.get(name) {
            self.symbols[id.0] = symbol;
            return id;
        }
        let id = SymbolId(self.symbols.len());
        self.symbols.push(symbol);
        self.scopes[target.0].names.insert(name.to_string(), id);
        id
    }

    fn resolve(&self, name: &str) -> Option<SymbolId> {
        let mut scope = Some(self.declaration_scope());
        while let Some(id) = scope {
            let current = &self.scopes[id.0];
            if let Some(&symbol) = current.names.get(name) {
                return Some(symbol);
            }
            scope = current.parent;
        }
        None
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.resolve(name).map(|id| &self.symbols[id.0])
    }

    /// Finds a symbol that a new declaration of `name` would clash with.
    pub fn lookup_conflict(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.declaration_scope().0]
            .names
            .get(name)
            .map(|id| &self.symbols[id.0])
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn mark_initialized(&mut self, name: &str) {
        if let Some(id) = self.resolve(name) {
            self.symbols[id.0].initialized = true;
        }
    }

    pub fn set_initialized(&mut self, id: SymbolId) {
        self.symbols[id.0].initialized = true;
    }

    /// Every symbol in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Symbol Table:")?;
        if self.symbols.is_empty() {
            return writeln!(f, "  (empty)");
        }
        for symbol in &self.symbols {
            let status = if symbol.initialized { '✓' } else { '⚠' };
            writeln!(
                f,
                "  {} {}: {} ({}) in scope '{}'",
                status, symbol.name, symbol.ty, symbol.kind, symbol.scope
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_scoping_shares_one_namespace() {
        let mut table = SymbolTable::new(Scoping::Flat);
        table.enter_block();
        table.declare("x", Type::Number, SymbolKind::Variable);
        table.exit_scope();
        let x = table.lookup("x").expect("x should outlive its block");
        assert_eq!(x.scope, "block_1");
        table.enter_block();
        assert!(table.lookup_conflict("x").is_some());
        assert_eq!(table.current_scope(), "block_2");
    }

    #[test]
    fn lexical_scoping_walks_outwards() {
        let mut table = SymbolTable::new(Scoping::Lexical);
        table.declare("x", Type::Number, SymbolKind::Variable);
        table.enter_function("f");
        table.declare("a", Type::Any, SymbolKind::Parameter);
        assert_eq!(table.lookup("x").map(|s| s.ty), Some(Type::Number));
        assert!(table.lookup_conflict("x").is_none());
        table.declare("x", Type::String, SymbolKind::Variable);
        assert_eq!(table.lookup("x").map(|s| s.ty), Some(Type::String));
        table.exit_scope();
        assert_eq!(table.lookup("x").map(|s| s.ty), Some(Type::Number));
        assert!(table.lookup("a").is_none());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn flat_redeclaration_replaces_in_place() {
        let mut table = SymbolTable::new(Scoping::Flat);
        let first = table.declare("a", Type::Number, SymbolKind::Variable);
        table.enter_function("f");
        let second = table.declare("a", Type::Any, SymbolKind::Parameter);
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(first).kind, SymbolKind::Parameter);
        assert_eq!(table.get(first).scope, "function_f");
    }

    #[test]
    fn global_scope_is_never_left() {
        let mut table = SymbolTable::default();
        table.exit_scope();
        table.exit_scope();
        assert_eq!(table.current_scope(), "global");
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn display() {
        let mut table = SymbolTable::default();
        let x = table.declare("x", Type::Number, SymbolKind::Variable);
        table.set_initialized(x);
        table.declare("y", Type::Any, SymbolKind::Variable);
        assert_eq!(
            table.to_string(),
            "Symbol Table:\n  ✓ x: number (variable) in scope 'global'\n  ⚠ y: any (variable) in scope 'global'\n"
        );
        assert_eq!(SymbolTable::default().to_string(), "Symbol Table:\n  (empty)\n");
    }
}
