use std::{
    error::Error,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use ucode::{
    config::AnalyzerConfig,
    diagnostic::Severity,
    document::{Document, TextDocument},
    lexer::{self, LexOptions},
    modules::DiskLoader,
    pipeline,
    util::fmt::tree,
};

/// Checks ucode scripts, printing their diagnostics.
#[derive(Parser, Debug)]
#[command(name = "ucode-check", version)]
struct Args {
    /// Scripts to check.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Lex every bare word as an identifier, as in raw mode templates.
    #[arg(long)]
    raw: bool,

    /// Analysis passes, as a comma separated list of changes to the default
    /// (e.g. "no-shadowing" or "none,types").
    #[arg(long, default_value = "all")]
    passes: AnalyzerConfig,

    /// Print the tokens of each script.
    #[arg(long)]
    tokens: bool,

    /// Print the syntax tree of each script.
    #[arg(long)]
    ast: bool,
}

fn main() -> ExitCode {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("failed to run: {error}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, Box<dyn Error>> {
    let options = LexOptions { raw_mode: args.raw };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = false;

    for path in &args.files {
        let text = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;

        if args.tokens {
            for token in lexer::tokenize(&text, options) {
                writeln!(out, "{token:?} {:?}", token.text(&text))?;
            }
        }

        let loader = DiskLoader::for_script(path);
        let result = pipeline::analyze_document_with(&text, options, &args.passes, &loader);
        if args.ast {
            tree::print_program(&mut out, &result.program)?;
        }

        let doc = TextDocument::new(text);
        for diagnostic in &result.diagnostics {
            failed |= diagnostic.severity == Severity::Error;
            print_diagnostic(&mut out, path, &doc, diagnostic)?;
        }
    }

    out.flush()?;
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_diagnostic(
    w: &mut impl Write,
    path: &Path,
    doc: &TextDocument,
    diagnostic: &ucode::diagnostic::Diagnostic,
) -> io::Result<()> {
    let position = doc.position_at(diagnostic.range.lo);
    writeln!(
        w,
        "{}:{}:{}: {} [{}]",
        path.display(),
        position.line + 1,
        position.character + 1,
        diagnostic,
        diagnostic.source,
    )
}
