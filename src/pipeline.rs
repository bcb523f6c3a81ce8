use crate::{
    analyzer,
    ast::Program,
    config::AnalyzerConfig,
    diagnostic::{self, Diagnostic},
    document::TextDocument,
    lexer::{self, LexOptions},
    modules::SourceLoader,
    parser::{self, Parsed},
    symbols::SymbolTable,
};

/// Everything known about a document after one run of the pipeline.
#[derive(Debug)]
pub struct AnalysisResult {
    pub program: Program,
    pub symbols: SymbolTable,
    /// Ordered by start offset.
    pub diagnostics: Vec<Diagnostic>,
}

/// Lexes, parses and analyzes `text`.
pub fn analyze_document(
    text: &str,
    config: &AnalyzerConfig,
    loader: &dyn SourceLoader,
) -> AnalysisResult {
    analyze_document_with(text, LexOptions::default(), config, loader)
}

#[tracing::instrument(level = "debug", skip_all, fields(len = text.len()))]
pub fn analyze_document_with(
    text: &str,
    options: LexOptions,
    config: &AnalyzerConfig,
    loader: &dyn SourceLoader,
) -> AnalysisResult {
    let tokens = lexer::tokenize(text, options);
    tracing::debug!(tokens = tokens.len(), "lexed document");
    let Parsed { program, errors } = parser::parse(text, &tokens);
    let analysis = analyzer::analyze(&program, config, loader);

    let mut diagnostics: Vec<_> = errors
        .iter()
        .map(Diagnostic::from_parse_error)
        .chain(analysis.errors.iter().map(Diagnostic::from_analysis_error))
        .collect();
    diagnostics.sort_by_key(|d| d.range.lo);
    let diagnostics = diagnostic::suppress(diagnostics, &TextDocument::new(text), &tokens);
    tracing::debug!(diagnostics = diagnostics.len(), "analyzed document");

    AnalysisResult {
        program,
        symbols: analysis.symbols,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        ast::StmtKind,
        diagnostic::{DiagnosticSource, Severity},
    };

    fn no_files(_: &Path) -> bool {
        false
    }

    fn summary(result: &AnalysisResult) -> Vec<String> {
        result
            .diagnostics
            .iter()
            .map(|d| format!("{:#} [{}]", d, d.source))
            .collect()
    }

    #[test]
    fn test_missing_semicolon_keeps_both_declarations() {
        let result = analyze_document(
            "let x = 5\nlet y = 10;\nprint(x, y);",
            &AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(
            summary(&result),
            ["10..13: error: expected ';', but got 'let' [parser]"]
        );
        let decls = result
            .program
            .body
            .iter()
            .filter(|stmt| matches!(stmt.kind, StmtKind::Decl(_)))
            .count();
        assert_eq!(decls, 2);
    }

    #[test]
    fn test_diagnostics_from_every_stage_are_ordered() {
        let src = indoc! {r#"
            let unused = 1;
            let s = 'open
            print(nope);
        "#};
        let result = analyze_document(src, &AnalyzerConfig::default(), &no_files);
        let sources: Vec<_> = result
            .diagnostics
            .iter()
            .map(|d| (d.source, d.severity))
            .collect();
        assert_eq!(
            sources,
            [
                (DiagnosticSource::Analyzer, Severity::Warning),
                (DiagnosticSource::Analyzer, Severity::Warning),
                (DiagnosticSource::Lexer, Severity::Error),
                (DiagnosticSource::Analyzer, Severity::Warning),
            ]
        );
        assert!(result
            .diagnostics
            .windows(2)
            .all(|pair| pair[0].range.lo <= pair[1].range.lo));
    }

    #[test]
    fn test_suppression_comment() {
        let src = "let a = 1; // ucode-lsp disable\nlet b = 2;\n";
        let result = analyze_document(src, &AnalyzerConfig::default(), &no_files);
        assert_eq!(
            summary(&result),
            ["36..37: warning: `b` is declared but never used [analyzer]"]
        );
    }

    #[test]
    fn test_sample_script_is_clean() {
        let src = include_str!("../samples/wifi-stats.uc");
        let result = analyze_document(src, &AnalyzerConfig::default(), &no_files);
        assert_eq!(summary(&result), Vec::<String>::new());
        assert!(result.symbols.scopes().count() > 1);
    }

    #[test]
    fn test_raw_mode() {
        let raw = analyze_document_with(
            "let = 1;",
            LexOptions { raw_mode: true },
            &AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(summary(&raw), Vec::<String>::new());

        let normal = analyze_document("let = 1;", &AnalyzerConfig::default(), &no_files);
        assert_eq!(
            summary(&normal),
            ["4..5: error: expected identifier, but got '=' [parser]"]
        );
    }
}
