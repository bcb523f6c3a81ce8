use std::fmt;

use crate::{
    analyzer,
    document::Document,
    parser,
    token::{Span, Spanned, Token},
};

/// A line comment carrying this marker suppresses the diagnostics starting
/// on its line.
pub const SUPPRESSION_MARKER: &str = "// ucode-lsp disable";

/// Severities, numbered as the editor protocol expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
            Severity::Hint => "hint",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticSource {
    Lexer,
    Parser,
    Analyzer,
}

impl fmt::Display for DiagnosticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticSource::Lexer => "lexer",
            DiagnosticSource::Parser => "parser",
            DiagnosticSource::Analyzer => "analyzer",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub range: Span,
    pub message: String,
    pub source: DiagnosticSource,
}

impl Diagnostic {
    pub fn from_parse_error(error: &Spanned<parser::Error>) -> Diagnostic {
        let source = match error.inner {
            parser::Error::Lexer(_) => DiagnosticSource::Lexer,
            _ => DiagnosticSource::Parser,
        };
        Diagnostic {
            severity: Severity::Error,
            range: error.span,
            message: error.inner.to_string(),
            source,
        }
    }

    pub fn from_analysis_error(error: &Spanned<analyzer::Error>) -> Diagnostic {
        Diagnostic {
            severity: error.inner.severity(),
            range: error.span,
            message: error.inner.to_string(),
            source: DiagnosticSource::Analyzer,
        }
    }
}

/// `severity: message` with the range first under `{:#}`, like [`Spanned`].
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}: ", self.range)?;
        }
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Drops the diagnostics which start on a line carrying
/// [`SUPPRESSION_MARKER`]. Only the comments between `tokens`, the lexed
/// document, are searched for it.
pub fn suppress(
    diagnostics: Vec<Diagnostic>,
    doc: &impl Document,
    tokens: &[Token],
) -> Vec<Diagnostic> {
    let text = doc.text();
    if !text.contains(SUPPRESSION_MARKER) {
        return diagnostics;
    }
    let mut suppressed = rustc_hash::FxHashSet::default();
    let mut trivia_start = 0;
    for token in tokens {
        let span = token.span();
        let trivia = text.get(trivia_start..span.lo).unwrap_or_default();
        for (at, _) in trivia.match_indices(SUPPRESSION_MARKER) {
            suppressed.insert(doc.position_at(trivia_start + at).line);
        }
        trivia_start = trivia_start.max(span.hi());
    }
    let before = diagnostics.len();
    let kept: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| !suppressed.contains(&doc.position_at(d.range.lo).line))
        .collect();
    tracing::debug!(suppressed = before - kept.len(), "applied suppression comments");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::TextDocument,
        lexer::{self, LexOptions},
    };

    fn suppress_in(text: &str, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        let tokens = lexer::tokenize(text, LexOptions::default());
        suppress(diagnostics, &TextDocument::new(text), &tokens)
    }

    fn diagnostic(lo: usize, hi: usize) -> Diagnostic {
        Diagnostic {
            severity: Severity::Warning,
            range: Span::new_of_bounds(lo..hi),
            message: "unused".into(),
            source: DiagnosticSource::Analyzer,
        }
    }

    #[test]
    fn test_severity_numbers() {
        assert_eq!(Severity::Error as u8, 1);
        assert_eq!(Severity::Warning as u8, 2);
        assert_eq!(Severity::Information as u8, 3);
        assert_eq!(Severity::Hint as u8, 4);
    }

    #[test]
    fn test_suppress_by_line() {
        let text = "let a = 1; // ucode-lsp disable\nlet b = 2;\n";
        let kept = suppress_in(text, vec![diagnostic(4, 5), diagnostic(36, 37)]);
        assert_eq!(kept, [diagnostic(36, 37)]);
    }

    #[test]
    fn test_marker_in_string_does_not_suppress() {
        let text = "let a = 1; // ucode-lsp disable\nlet b = \"// ucode-lsp disable\";\n";
        let kept = suppress_in(text, vec![diagnostic(4, 5), diagnostic(36, 37)]);
        assert_eq!(kept, [diagnostic(36, 37)]);

        let text = "let a = 1; /* ucode-lsp */ let b = `// ucode-lsp disable`;";
        let kept = suppress_in(text, vec![diagnostic(4, 5)]);
        assert_eq!(kept, [diagnostic(4, 5)]);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{:#}", diagnostic(4, 5)), "4..5: warning: unused");
    }
}
