//! Checks over a completed scope tree.

use crate::{
    analyzer::Error,
    symbols::{SymbolKind, SymbolTable},
    token::Spanned,
};

/// Flags `let` and `const` bindings which are never read. Names starting
/// with `_` are exempt.
pub fn unused(table: &SymbolTable) -> Vec<Spanned<Error>> {
    table
        .symbols()
        .filter(|(_, symbol)| {
            matches!(symbol.kind, SymbolKind::Variable | SymbolKind::Constant)
                && !symbol.implicit
                && symbol.reads == 0
                && !symbol.name.starts_with('_')
        })
        .map(|(_, symbol)| symbol.span.wrap(Error::Unused(symbol.name.clone())))
        .collect()
}

/// Flags declarations which hide one of an enclosing scope.
pub fn shadowing(table: &SymbolTable) -> Vec<Spanned<Error>> {
    let mut errors = Vec::new();
    for (_, scope) in table.scopes() {
        let Some(parent) = scope.parent else {
            continue;
        };
        for symbol in scope.symbols() {
            let shadows = matches!(
                symbol.kind,
                SymbolKind::Variable
                    | SymbolKind::Constant
                    | SymbolKind::Parameter
                    | SymbolKind::Function
            ) && !symbol.implicit
                && table.lookup(&symbol.name, parent).is_some();
            if shadows {
                errors.push(symbol.span.wrap(Error::Shadowing(symbol.name.clone())));
            }
        }
    }
    errors
}
