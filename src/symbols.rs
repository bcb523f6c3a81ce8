use rustc_hash::FxHashMap;

use crate::{token::Span, types::Type};

/// Index of a scope in its [`SymbolTable`].
pub type ScopeId = usize;

/// Identifies a symbol by its scope and declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId {
    pub scope: ScopeId,
    pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Parameter,
    Imported,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: Box<str>,
    pub kind: SymbolKind,
    /// Union of every type assigned to the symbol.
    pub ty: Type,
    /// Span of the declaring identifier.
    pub span: Span,
    /// For imports, the name the source module exports it under.
    pub import_specifier: Option<Box<str>>,
    /// For imports, the module or path imported from.
    pub import_source: Option<Box<str>>,
    /// Declared by assigning to a name no scope declares.
    pub implicit: bool,
    /// How many times the value is read.
    pub reads: usize,
}

impl Symbol {
    pub fn new(name: impl Into<Box<str>>, kind: SymbolKind, ty: Type, span: Span) -> Symbol {
        Symbol {
            name: name.into(),
            kind,
            ty,
            span,
            import_specifier: None,
            import_source: None,
            implicit: false,
            reads: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// `None` only for the global scope.
    pub parent: Option<ScopeId>,
    pub span: Span,
    symbols: Vec<Symbol>,
    index: FxHashMap<Box<str>, usize>,
}

impl Scope {
    /// Symbols in declaration order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }
}

/// A resolved use of a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reference {
    pub span: Span,
    pub symbol: SymbolId,
}

/// An arena of scopes. Parents are indices into the arena and always precede
/// their children.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    references: Vec<Reference>,
}

impl SymbolTable {
    pub const ROOT: ScopeId = 0;

    /// Creates a table with a global scope spanning `span`.
    pub fn new(span: Span) -> SymbolTable {
        SymbolTable {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                span,
                symbols: Vec::new(),
                index: FxHashMap::default(),
            }],
            references: Vec::new(),
        }
    }

    pub fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId, span: Span) -> ScopeId {
        assert!(parent < self.scopes.len(), "dangling parent scope {parent}");
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            span,
            symbols: Vec::new(),
            index: FxHashMap::default(),
        });
        self.scopes.len() - 1
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter().enumerate()
    }

    /// Declares `symbol` in `scope`. If the name is already declared there,
    /// nothing changes and the existing symbol is returned as the error.
    pub fn declare(&mut self, scope: ScopeId, symbol: Symbol) -> Result<SymbolId, SymbolId> {
        let scope_ref = &mut self.scopes[scope];
        if let Some(&index) = scope_ref.index.get(&symbol.name) {
            return Err(SymbolId { scope, index });
        }
        let index = scope_ref.symbols.len();
        scope_ref.index.insert(symbol.name.clone(), index);
        scope_ref.symbols.push(symbol);
        Ok(SymbolId { scope, index })
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.scopes[id.scope].symbols[id.index]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.scopes[id.scope].symbols[id.index]
    }

    /// Every symbol, scope by scope.
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.scopes().flat_map(|(scope, s)| {
            s.symbols
                .iter()
                .enumerate()
                .map(move |(index, symbol)| (SymbolId { scope, index }, symbol))
        })
    }

    /// Iterates over `from` and its ancestors, innermost first.
    pub fn ancestors(&self, from: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(from), |&id| self.scopes[id].parent)
    }

    /// Finds the nearest declaration of `name` visible from `from`.
    pub fn lookup(&self, name: &str, from: ScopeId) -> Option<SymbolId> {
        self.ancestors(from).find_map(|scope| {
            let index = *self.scopes[scope].index.get(name)?;
            Some(SymbolId { scope, index })
        })
    }

    /// The innermost function (or the global) scope enclosing `from`.
    pub fn function_scope(&self, from: ScopeId) -> ScopeId {
        self.ancestors(from)
            .find(|&id| self.scopes[id].kind != ScopeKind::Block)
            .unwrap_or(Self::ROOT)
    }

    pub fn add_reference(&mut self, span: Span, symbol: SymbolId) {
        self.references.push(Reference { span, symbol });
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// The innermost scope whose span touches `offset`.
    pub fn scope_at(&self, offset: usize) -> ScopeId {
        // Children are pushed after their parents, so the last match is the
        // innermost.
        self.scopes()
            .filter(|(_, scope)| scope.span.touches(offset))
            .map(|(id, _)| id)
            .last()
            .unwrap_or(Self::ROOT)
    }

    /// The symbols visible from `scope`, innermost first. Shadowed
    /// declarations are left out.
    pub fn visible_symbols(&self, scope: ScopeId) -> Vec<&Symbol> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut visible = Vec::new();
        for id in self.ancestors(scope) {
            for symbol in &self.scopes[id].symbols {
                if seen.insert(&*symbol.name) {
                    visible.push(symbol);
                }
            }
        }
        visible
    }

    /// The reference whose span touches `offset`.
    pub fn reference_at(&self, offset: usize) -> Option<&Reference> {
        self.references.iter().find(|r| r.span.touches(offset))
    }

    /// The symbol referenced or declared at `offset`.
    pub fn definition_at(&self, offset: usize) -> Option<&Symbol> {
        if let Some(reference) = self.reference_at(offset) {
            return Some(self.symbol(reference.symbol));
        }
        self.symbols()
            .find(|(_, symbol)| symbol.span.touches(offset))
            .map(|(_, symbol)| symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(lo: usize, hi: usize) -> Span {
        Span::new_of_bounds(lo..hi)
    }

    fn var(name: &str, lo: usize) -> Symbol {
        Symbol::new(name, SymbolKind::Variable, Type::Integer, span(lo, lo + name.len()))
    }

    #[test]
    fn test_lookup_walks_to_root() {
        let mut table = SymbolTable::new(span(0, 100));
        let f = table.push_scope(ScopeKind::Function, SymbolTable::ROOT, span(10, 90));
        let block = table.push_scope(ScopeKind::Block, f, span(20, 80));

        let outer = table.declare(SymbolTable::ROOT, var("x", 0)).unwrap();
        let inner = table.declare(block, var("x", 25)).unwrap();
        table.declare(f, var("y", 12)).unwrap();

        assert_eq!(table.lookup("x", block), Some(inner));
        assert_eq!(table.lookup("x", f), Some(outer));
        assert!(table.lookup("y", block).is_some());
        assert_eq!(table.lookup("y", SymbolTable::ROOT), None);
        assert_eq!(table.function_scope(block), f);
    }

    #[test]
    fn test_redeclaration_keeps_first() {
        let mut table = SymbolTable::new(span(0, 10));
        let first = table.declare(SymbolTable::ROOT, var("a", 0)).unwrap();
        assert_eq!(table.declare(SymbolTable::ROOT, var("a", 5)), Err(first));
        assert_eq!(table.symbol(first).span, span(0, 1));
        assert_eq!(table.scope(SymbolTable::ROOT).symbols().len(), 1);
    }

    #[test]
    fn test_position_queries() {
        let mut table = SymbolTable::new(span(0, 50));
        let f = table.push_scope(ScopeKind::Function, SymbolTable::ROOT, span(10, 40));
        let a = table.declare(SymbolTable::ROOT, var("a", 0)).unwrap();
        table.declare(f, var("b", 12)).unwrap();
        table.add_reference(span(20, 21), a);

        assert_eq!(table.scope_at(5), SymbolTable::ROOT);
        assert_eq!(table.scope_at(15), f);
        assert_eq!(table.definition_at(20).map(|s| &*s.name), Some("a"));
        assert_eq!(table.definition_at(12).map(|s| &*s.name), Some("b"));

        let names: Vec<_> = table.visible_symbols(f).iter().map(|s| &*s.name).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
