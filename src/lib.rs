/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The analyzer takes an AST, building its scopes and inferring the types of
/// its bindings while checking for semantic problems.
pub mod analyzer;

/// Checks run over the scope tree once the analysis completes.
pub mod lints;

/// Runs the lexer, the parser and the analyzer over a whole document.
pub mod pipeline;

pub mod ast;
pub mod cache;
pub mod config;
pub mod diagnostic;
pub mod document;
pub mod modules;
pub mod symbols;
pub mod token;
pub mod types;

pub mod util {
    pub mod fmt {
        pub mod tree;
    }
    #[cfg(test)]
    pub(crate) mod test_utils;
}
