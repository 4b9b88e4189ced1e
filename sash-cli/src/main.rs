use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sash_compiler::{
    CompileOptions, Compiler, Diagnostic, DiagnosticLevel, Diagnostics, SourceFile, SourceId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Ast,
    Typed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

#[derive(Parser)]
#[command(
    name = "sash-cli",
    version,
    about = "Check a sash script and report its diagnostics."
)]
struct Cli {
    /// Path to a sash source file.
    input: PathBuf,

    /// Dump the token stream produced by the lexer.
    #[arg(long)]
    dump_tokens: bool,

    /// Print a compiler tree (`ast` or `typed`).
    #[arg(long, value_enum)]
    emit: Vec<Emit>,

    /// How diagnostics are printed.
    #[arg(long, value_enum, default_value = "human")]
    format: Format,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    check_program(cli)
}

fn check_program(cli: Cli) -> Result<()> {
    let source = SourceFile::read(SourceId(0), &cli.input)?;
    let mut compiler = Compiler::new(CompileOptions {
        dump_tokens: cli.dump_tokens,
    });

    let result = compiler.compile(&source);
    report(&source, compiler.diagnostics(), cli.format)?;
    let compilation = result.context("Compilation failed")?;

    if cli.emit.contains(&Emit::Ast) {
        println!("{:#?}", compilation.module);
    }
    if cli.emit.contains(&Emit::Typed) {
        println!("{:#?}", compilation.program);
    }

    Ok(())
}

fn report(source: &SourceFile, diagnostics: &Diagnostics, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let json = serde_json::to_string_pretty(diagnostics.entries())
                .context("Failed to serialize diagnostics")?;
            println!("{json}");
        }
        Format::Human => {
            if !diagnostics.is_empty() {
                let line_cache: Vec<&str> = source.contents.lines().collect();
                eprintln!("Diagnostics:");
                for diagnostic in diagnostics.entries() {
                    print_diagnostic(source, &line_cache, diagnostic);
                }
            }
        }
    }
    Ok(())
}

fn print_diagnostic(source: &SourceFile, lines: &[&str], diagnostic: &Diagnostic) {
    let (level_label, level_marker) = match diagnostic.level {
        DiagnosticLevel::Error => ("error", "  -"),
        DiagnosticLevel::Warning => ("warning", "  ~"),
    };
    eprintln!("{} {}: {}", level_marker, level_label, diagnostic.message);

    let span = diagnostic.span;
    if span.line == 0 {
        return;
    }
    eprintln!("     --> {}:{}:{}", source.path.display(), span.line, span.column);

    if let Some(raw_line) = lines.get(span.line.saturating_sub(1)) {
        let display_line = raw_line.replace('\t', "    ");
        eprintln!("      {}", display_line);

        let mut caret_line = String::from("      ");
        for (index, ch) in raw_line.chars().enumerate() {
            if index + 1 >= span.column {
                break;
            }
            match ch {
                '\t' => caret_line.push_str("    "),
                _ => caret_line.push(' '),
            }
        }

        let highlight_len = if span.end_line == span.line {
            span.end_column.saturating_sub(span.column).saturating_add(1)
        } else {
            let width = display_line.chars().count();
            width.saturating_sub(span.column.saturating_sub(1).min(width))
        };

        caret_line.push_str(&"^".repeat(highlight_len.max(1)));
        eprintln!("{}", caret_line);
    }
}
