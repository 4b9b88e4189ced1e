use std::fs;
use std::path::PathBuf;

use sash_compiler::{
    CompileOptions, Compiler, DiagnosticLevel, Keyword, Lexer, SourceFile, SourceId, TokenKind,
};

fn source(contents: &str) -> SourceFile {
    SourceFile::new(SourceId(0), PathBuf::from("test.sash"), contents.to_string())
}

fn kinds(contents: &str) -> Vec<TokenKind> {
    let file = source(contents);
    Lexer::new(&file)
        .tokenize()
        .unwrap_or_else(|err| panic!("lexing failed: {err}"))
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

fn lexer_failure(contents: &str) -> (String, usize, usize) {
    let mut compiler = Compiler::new(CompileOptions::default());
    let err = compiler
        .analyze(&source(contents))
        .err()
        .unwrap_or_else(|| panic!("expected lexing to fail for {contents:?}"));
    assert_eq!(err.to_string(), "Lexing failed");

    let diagnostics = compiler.diagnostics().entries();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    let diagnostic = &diagnostics[0];
    (diagnostic.message.clone(), diagnostic.span.line, diagnostic.span.column)
}

#[test]
fn lexes_definitions() {
    assert_eq!(
        kinds("def mut x: Float = 1.5;"),
        vec![
            TokenKind::Keyword(Keyword::Def),
            TokenKind::Keyword(Keyword::Mut),
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::DecimalLiteral,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexes_compound_operators() {
    assert_eq!(
        kinds("a -> b == c != d <= e >= f && g || !h"),
        vec![
            TokenKind::Identifier,
            TokenKind::Arrow,
            TokenKind::Identifier,
            TokenKind::DoubleEqual,
            TokenKind::Identifier,
            TokenKind::BangEqual,
            TokenKind::Identifier,
            TokenKind::LessEqual,
            TokenKind::Identifier,
            TokenKind::GreaterEqual,
            TokenKind::Identifier,
            TokenKind::AmpersandAmpersand,
            TokenKind::Identifier,
            TokenKind::PipePipe,
            TokenKind::Bang,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn a_dot_without_digits_ends_the_number() {
    assert_eq!(
        kinds("1.x"),
        vec![
            TokenKind::IntegerLiteral,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn decodes_string_escapes() {
    assert_eq!(
        kinds(r#""tab\there \"quoted\" A""#),
        vec![
            TokenKind::StringLiteral("tab\there \"quoted\" A".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn skips_nested_comments() {
    assert_eq!(
        kinds("/* outer /* inner */ still outer */ true // trailing\nfalse"),
        vec![
            TokenKind::BooleanLiteral(true),
            TokenKind::BooleanLiteral(false),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn tracks_token_positions() {
    let file = source("def x = 1;\n  x;");
    let tokens = Lexer::new(&file)
        .tokenize()
        .unwrap_or_else(|err| panic!("lexing failed: {err}"));
    let last_x = &tokens[5];
    assert_eq!(last_x.lexeme, "x");
    assert_eq!((last_x.line, last_x.column), (2, 3));
}

#[test]
fn reports_invalid_characters() {
    assert_eq!(
        lexer_failure("def x = #;"),
        ("Invalid character `#`".to_string(), 1, 9)
    );
}

#[test]
fn reports_unterminated_strings() {
    assert_eq!(
        lexer_failure("def s = \"open;\ndef t = 1;"),
        ("Unterminated string".to_string(), 1, 9)
    );
}

#[test]
fn reports_invalid_escapes() {
    assert_eq!(
        lexer_failure(r#"def s = "a\q";"#),
        ("Invalid escaping \\q".to_string(), 1, 11)
    );
}

#[test]
fn reports_unclosed_comments() {
    assert_eq!(
        lexer_failure("def x = 1;\n/* never closed"),
        ("Unclosed comment".to_string(), 2, 1)
    );
}

#[test]
fn compile_refuses_lexing_failures() {
    let mut compiler = Compiler::new(CompileOptions::default());
    let err = compiler
        .compile(&source("@"))
        .err()
        .unwrap_or_else(|| panic!("expected compilation to fail"));
    assert_eq!(err.to_string(), "Lexing failed");
}

#[test]
fn reports_missing_tokens_and_keeps_going() {
    let mut compiler = Compiler::new(CompileOptions::default());
    let result = compiler.analyze(&source("def x = 1\ndef y = nope;"));
    assert!(result.is_ok());

    let messages = compiler
        .diagnostics()
        .entries()
        .iter()
        .map(|diagnostic| diagnostic.message.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        messages,
        vec![
            "Expected `;` but got `def`".to_string(),
            "`nope` is not defined".to_string(),
        ]
    );
}

#[test]
fn names_the_missing_category() {
    let mut compiler = Compiler::new(CompileOptions::default());
    let result = compiler.analyze(&source("_ = ;\ndef = 1;"));
    assert!(result.is_ok());

    let found = compiler
        .diagnostics()
        .entries()
        .iter()
        .map(|diagnostic| (diagnostic.message.clone(), diagnostic.span.line, diagnostic.span.column))
        .collect::<Vec<_>>();
    assert_eq!(
        found,
        vec![
            ("Expected an expression".to_string(), 1, 5),
            ("Expected an identifier".to_string(), 2, 5),
        ]
    );
}

#[test]
fn compile_fails_on_any_error() {
    let mut compiler = Compiler::new(CompileOptions::default());
    let err = compiler
        .compile(&source("def x: Int = \"a\";"))
        .err()
        .unwrap_or_else(|| panic!("expected compilation to fail"));
    assert_eq!(err.to_string(), "Semantic analysis failed");
    assert!(compiler.diagnostics().has_errors());
}

#[test]
fn redundant_semicolons_are_warnings() {
    let mut compiler = Compiler::new(CompileOptions::default());
    compiler
        .compile(&source("def x = 1;;;"))
        .unwrap_or_else(|err| panic!("compilation failed: {err}"));

    let diagnostics = compiler.diagnostics().entries();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Redundant semicolons");
    assert_eq!(diagnostics[0].level, DiagnosticLevel::Warning);
}

#[test]
fn reads_sources_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("main.sash");
    fs::write(&path, "def x = 1;").expect("write source");

    let file = SourceFile::read(SourceId(3), &path).expect("read source");
    assert_eq!(file.id, SourceId(3));
    assert_eq!(file.path, path);
    assert_eq!(file.contents, "def x = 1;");

    let missing = dir.path().join("missing.sash");
    let err = SourceFile::read(SourceId(4), &missing)
        .err()
        .unwrap_or_else(|| panic!("expected a read failure"));
    assert!(err.to_string().starts_with("Failed to read"), "{err}");
}
