use std::path::PathBuf;

use sash_compiler::{CompileOptions, Compiler, Diagnostic, SourceFile, SourceId};

fn diagnostics(source: &str) -> Vec<Diagnostic> {
    let mut compiler = Compiler::new(CompileOptions::default());
    let source_file = SourceFile::new(SourceId(0), PathBuf::from("test.sash"), source.to_string());
    compiler
        .analyze(&source_file)
        .unwrap_or_else(|err| panic!("analysis aborted: {err}"));
    compiler.diagnostics().entries().to_vec()
}

fn messages(source: &str) -> Vec<String> {
    diagnostics(source)
        .into_iter()
        .map(|diagnostic| diagnostic.message)
        .collect()
}

const MISSING_RETURN: &str = "A `return` statement is required at the end of this function";

#[test]
fn terminating_branches_cover_every_path() {
    let source = "def f: (Boolean) -> Int = { c -> if c { return 1; } else { return 2; }; };";
    assert!(messages(source).is_empty(), "{:?}", messages(source));
}

#[test]
fn a_fallthrough_branch_needs_a_return() {
    let source = "def f: (Boolean) -> Int = { c -> if c { return 1; } else { println(2); }; };";
    assert_eq!(messages(source), vec![MISSING_RETURN.to_string()]);
}

#[test]
fn every_else_if_branch_must_terminate() {
    let source = "def f = { c: Int ->\n  if c == 0 { return 1; } else if c == 1 { println(c); } else { return 2; };\n};";
    assert_eq!(messages(source), vec![MISSING_RETURN.to_string()]);
}

#[test]
fn an_if_without_else_never_terminates() {
    let source = "def f = { c: Boolean -> if c { return 1; } };";
    assert_eq!(messages(source), vec![MISSING_RETURN.to_string()]);
}

#[test]
fn unit_functions_may_fall_through() {
    let source = "def f = { c: Boolean -> if c { return; }; println(c); };";
    assert!(messages(source).is_empty(), "{:?}", messages(source));
}

#[test]
fn reports_code_after_return() {
    let source = "def f = {\n  return 1;\n  println(2);\n};";
    let diagnostics = diagnostics(source);
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].message, "Unreachable code");
    assert_eq!(diagnostics[0].span.line, 3);
    assert_eq!(diagnostics[0].span.column, 3);
}

#[test]
fn unreachable_code_is_still_checked() {
    let source = "def f = { return 1; println(nope); };";
    let messages = messages(source);
    assert_eq!(messages.len(), 2, "{messages:?}");
    assert!(messages.contains(&"`nope` is not defined".to_string()));
    assert!(messages.contains(&"Unreachable code".to_string()));
}

#[test]
fn every_statement_after_a_terminator_is_reported() {
    let source = "def f = { return 1; println(2); println(3); };";
    let messages = messages(source);
    assert_eq!(messages, vec!["Unreachable code".to_string(); 2]);
}

#[test]
fn nothing_typed_calls_terminate() {
    assert_eq!(messages("exit(0);\nprintln(1);"), vec!["Unreachable code".to_string()]);

    let source = "def f: (Int) -> Int = { c -> exit(c); };";
    assert!(messages(source).is_empty(), "{:?}", messages(source));
}

#[test]
fn reports_arguments_after_a_terminating_argument() {
    let source = "def pair = { a: Int, b: Int -> a + b };\ndef f = { _ = pair(exit(1), 2); };";
    assert_eq!(messages(source), vec!["Unreachable code".to_string()]);
}

#[test]
fn loop_bodies_are_checked() {
    let source = "while true {\n  break;\n  println(1);\n}";
    assert_eq!(messages(source), vec!["Unreachable code".to_string()]);
}

#[test]
fn loops_do_not_terminate_a_function() {
    let source = "def f = { while true { return 1; } };";
    assert_eq!(messages(source), vec![MISSING_RETURN.to_string()]);
}

#[test]
fn diverging_if_expressions_have_type_nothing() {
    let source = "def f = { c: Boolean ->\n  def v = if c { return 1; } else { return 2; };\n  println(v);\n};";
    assert_eq!(messages(source), vec!["Unreachable code".to_string()]);
}

#[test]
fn functions_that_never_come_back_return_nothing() {
    let implicit = "def fail = { exit(1) };\ndef n: Int = fail();";
    assert!(messages(implicit).is_empty(), "{:?}", messages(implicit));

    let explicit = "def fail = { return exit(1); };\ndef n: Int = fail();";
    assert!(messages(explicit).is_empty(), "{:?}", messages(explicit));
}

#[test]
fn calls_to_functions_that_never_come_back_terminate() {
    let source = "def fail = { exit(1) };\ndef g = { x: Int -> if x > 0 { return x; } fail() };";
    assert!(messages(source).is_empty(), "{:?}", messages(source));

    let source = "def fail = { exit(1) };\ndef f: (Int) -> Int = { c -> fail(); };";
    assert!(messages(source).is_empty(), "{:?}", messages(source));

    let source = "def fail = { exit(1) };\ndef f = { fail();\n  println(1);\n};";
    assert_eq!(messages(source), vec!["Unreachable code".to_string()]);
}

#[test]
fn a_diverging_branch_leaves_the_if_type_to_its_siblings() {
    let source = "def f = { c: Boolean ->\n  def v = if c { exit(1) } else { \"ok\" };\n  def n: Int = v;\n};";
    assert_eq!(
        messages(source),
        vec!["A value of type `String` cannot be assigned to a binding of type `Int`".to_string()]
    );
}
