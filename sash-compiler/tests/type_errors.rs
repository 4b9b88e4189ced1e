use std::path::PathBuf;

use sash_compiler::{CompileOptions, Compiler, DiagnosticLevel, SourceFile, SourceId};

fn error_messages(source: &str) -> Vec<String> {
    let mut compiler = Compiler::new(CompileOptions::default());
    let source_file = SourceFile::new(SourceId(0), PathBuf::from("test.sash"), source.to_string());
    compiler
        .analyze(&source_file)
        .unwrap_or_else(|err| panic!("analysis aborted: {err}"));
    compiler
        .diagnostics()
        .entries()
        .iter()
        .filter(|diagnostic| diagnostic.level == DiagnosticLevel::Error)
        .map(|diagnostic| diagnostic.message.clone())
        .collect()
}

fn assert_single_error(source: &str, expected: &str) {
    let messages = error_messages(source);
    assert_eq!(messages, vec![expected.to_string()], "source: {source}");
}

#[test]
fn accepts_well_typed_program() {
    let source = r#"
def greeting = "hello";
def mut count = 0;
while count < 3 {
    println(greeting);
    count = count + 1;
}
def total: Float = 1.5 * 2.0;
_ = total;
"#;
    assert!(error_messages(source).is_empty());
}

#[test]
fn compile_fails_when_errors_are_reported() {
    let mut compiler = Compiler::new(CompileOptions::default());
    let source = SourceFile::new(SourceId(0), PathBuf::from("bad.sash"), "_ = nope;".to_string());
    let err = compiler.compile(&source).err().expect("compilation should fail");
    assert_eq!(err.to_string(), "Semantic analysis failed");
}

#[test]
fn reports_undefined_names() {
    assert_single_error("_ = nope;", "`nope` is not defined");
    assert_single_error("def a: Nope = 1;", "`Nope` is not defined");
}

#[test]
fn reports_duplicate_definitions() {
    assert_single_error("def a = 1;\ndef a = 2;", "`a` has already been used");
}

#[test]
fn builtins_can_be_shadowed() {
    assert!(error_messages("def println = 1;\n_ = println;").is_empty());
}

#[test]
fn requires_results_to_be_discarded() {
    assert_single_error(
        "1 + 1;",
        "This expression's result must be discarded explicitly with ` _ = <expression> `",
    );
    assert!(error_messages("_ = 1 + 1;").is_empty());
}

#[test]
fn rejects_discarding_unit() {
    assert_single_error("_ = println(1);", "`Unit` values cannot be discarded");
}

#[test]
fn rejects_readonly_reassignment() {
    assert_single_error(
        "def x = 1;\nx = 2;",
        "You cannot reassign a readonly definition. Consider adding the `mut` keyword",
    );
}

#[test]
fn rejects_mismatched_assignment() {
    assert_single_error(
        "def mut y = 1;\ny = \"s\";",
        "A value of type `String` cannot be assigned to a binding of type `Int`",
    );
    assert_single_error(
        "def flag: Boolean = 1;",
        "A value of type `Int` cannot be assigned to a binding of type `Boolean`",
    );
}

#[test]
fn reports_both_assignment_problems() {
    let messages = error_messages("def x = 1;\nx = \"s\";");
    assert_eq!(messages.len(), 2, "{messages:?}");
}

#[test]
fn rejects_invalid_operators() {
    assert_single_error("_ = 1 + \"a\";", "Cannot apply `+` on `Int` and `String`");
    assert_single_error("_ = 1 + 2.0;", "Cannot apply `+` on `Int` and `Float`");
    assert_single_error("_ = !1;", "Cannot apply `!` on `Int`");
    assert_single_error("_ = 1 && true;", "Cannot apply `&&` on `Int` and `Boolean`");
    assert!(error_messages("_ = \"a\" + \"b\";\n_ = 1 < 2 && 2.0 >= 1.0;").is_empty());
}

#[test]
fn reports_number_overflow() {
    assert_single_error(
        "_ = 99999999999999999999;",
        "Cannot fit `99999999999999999999` inside `Int`",
    );
}

#[test]
fn integers_are_32_bits_wide() {
    assert!(error_messages("def x = 2147483647;\n_ = x;").is_empty());
    assert_single_error(
        "def x = 2147483648;",
        "Cannot fit `2147483648` inside `Int`",
    );
}

#[test]
fn decimals_are_single_precision() {
    let fits = format!("def x = 1{}.0;\n_ = x;", "0".repeat(38));
    assert!(error_messages(&fits).is_empty());

    let text = format!("1{}.0", "0".repeat(39));
    assert_single_error(
        &format!("def x = {text};"),
        &format!("Cannot fit `{text}` inside `Float`"),
    );
}

#[test]
fn rejects_non_boolean_conditions() {
    assert_single_error("if 1 { }", "The condition type must be of type `Boolean`");
    assert_single_error(
        "while \"yes\" { break; }",
        "The condition type must be of type `Boolean`",
    );
}

#[test]
fn rejects_calls_on_values() {
    assert_single_error("def n = 1;\n_ = n(2);", "Cannot call a non function typed value");
}

#[test]
fn still_checks_arguments_of_failed_calls() {
    let messages = error_messages("def n = 1;\n_ = n(nope);");
    assert_eq!(
        messages,
        vec![
            "`nope` is not defined".to_string(),
            "Cannot call a non function typed value".to_string(),
        ]
    );
}

#[test]
fn reports_argument_count() {
    assert_single_error(
        "_ = exit(1, 2);",
        "Unexpected arguments count: expected `1`, but got `2`",
    );
}

#[test]
fn reports_argument_types() {
    assert_single_error(
        "_ = exit(\"now\");",
        "A value of type `String` cannot be passed as an argument to a parameter of type `Int`",
    );
}

#[test]
fn rejects_standalone_generics() {
    assert_single_error(
        "def p = println;",
        "Cannot use generic definition `println` without instantiation",
    );
}

#[test]
fn requires_else_on_if_expressions() {
    let messages = error_messages("def v = if true { 1 };");
    assert!(
        messages.contains(&"`if` must have an `else` branches when used as an expression".to_string()),
        "{messages:?}"
    );
}

#[test]
fn types_if_expressions() {
    assert!(error_messages("def w: String = if false { \"a\" } else if true { \"b\" } else { \"c\" };").is_empty());
    assert_single_error(
        "def v = if true { 1 } else { \"two\" };",
        "`String` cannot be yielded by a block that requires `Int`",
    );
}

#[test]
fn reports_missing_branch_results() {
    assert_single_error(
        "def v: Int = if true { 1 } else { println(2); };",
        "Expected a value of type `Int`",
    );
}

#[test]
fn rejects_control_statements_outside_their_scope() {
    assert_single_error(
        "break;",
        "The `break` statement can only be used inside a loop",
    );
    assert_single_error(
        "continue;",
        "The `continue` statement can only be used inside a loop",
    );
    assert_single_error(
        "return 1;",
        "The `return` statement can only be used within the boundary of a function",
    );
    assert_single_error(
        "while true { def f = { break; }; }",
        "The `break` statement can only be used inside a loop",
    );
}

#[test]
fn loops_do_not_yield_values() {
    assert_single_error(
        "while true { 1 }",
        "`Int` cannot be yielded by a block that requires `Unit`",
    );
    assert!(error_messages("def mut i = 0;\nwhile i < 3 { i = i + 1 }").is_empty());
}

#[test]
fn lambda_parameters_need_a_type() {
    assert_single_error(
        "def f = { x -> x };",
        "Cannot infer the type of `x`. Please specify it explicitly",
    );
}

#[test]
fn lambda_parameters_must_match_the_expected_type() {
    let messages = error_messages("def f: (Int) -> Int = { x: String -> 1 };");
    assert!(
        messages.contains(
            &"A value of type `String` cannot be passed as an argument to a parameter of type `Int`"
                .to_string()
        ),
        "{messages:?}"
    );

    let messages = error_messages("def g: (Int) -> Int = { x: Int, y: Int -> x };");
    assert!(
        messages.contains(&"Unexpected arguments count: expected `1`, but got `2`".to_string()),
        "{messages:?}"
    );
}

#[test]
fn rejects_mismatched_returns() {
    assert_single_error(
        "def f: () -> Int = { return \"s\"; };",
        "Cannot return a value of type `String` by a function that returns `Int`",
    );
    assert_single_error(
        "def f: () -> Int = { return; };",
        "A return value of type `Int` is missing",
    );
}

#[test]
fn first_return_fixes_the_return_type() {
    assert_single_error(
        "def f = { c: Boolean -> if c { return 1; } else { println(2); } };",
        "Cannot return a value of type `Unit` by a function that returns `Int`",
    );
}

#[test]
fn generic_definitions_must_be_functions() {
    assert_single_error(
        "def x[T] = 1;",
        "Only function and type binding can have type parameters",
    );
    assert_single_error(
        "def mut id[T] = { x: T -> x };",
        "Definitions with type parameters cannot be mutable",
    );
}

#[test]
fn reports_duplicate_type_parameters() {
    assert_single_error(
        "def pair[T, T] = { x: T -> x };",
        "`T` has already been used",
    );
}

#[test]
fn enums_are_not_supported() {
    assert_single_error(
        "def Color = enum { Red, Green };",
        "Enum definitions are not supported yet",
    );
}

#[test]
fn warns_about_redundant_semicolons() {
    let mut compiler = Compiler::new(CompileOptions::default());
    let source = SourceFile::new(SourceId(0), PathBuf::from("semi.sash"), ";;\n".to_string());
    compiler.compile(&source).expect("warnings do not fail compilation");

    let entries = compiler.diagnostics().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, DiagnosticLevel::Warning);
    assert_eq!(entries[0].message, "Redundant semicolons");
}
