use std::path::PathBuf;

use sash_compiler::typed::{ExpressionKind, Program, Statement};
use sash_compiler::{CompileOptions, Compiler, SourceFile, SourceId, Type};

fn analyze(source: &str) -> (Program, Vec<String>) {
    let mut compiler = Compiler::new(CompileOptions::default());
    let source_file = SourceFile::new(SourceId(0), PathBuf::from("test.sash"), source.to_string());
    let compilation = compiler
        .analyze(&source_file)
        .unwrap_or_else(|err| panic!("analysis aborted: {err}"));
    let messages = compiler
        .diagnostics()
        .entries()
        .iter()
        .map(|diagnostic| diagnostic.message.clone())
        .collect();
    (compilation.program, messages)
}

fn definition_type(program: &Program, name: &str) -> Type {
    program
        .statements
        .iter()
        .find_map(|statement| match statement {
            Statement::Definition(definition) if definition.definition.name == name => {
                Some(definition.definition.ty.clone())
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("no definition named {name}"))
}

const IDENTITY: &str = "def id[T] = { x: T -> x };\n";

#[test]
fn infers_from_arguments() {
    let (program, messages) = analyze(&format!("{IDENTITY}def y = id(1);"));
    assert!(messages.is_empty(), "{messages:?}");
    assert_eq!(definition_type(&program, "y"), Type::int());

    let Some(Statement::Definition(definition)) = program.statements.last() else {
        panic!("expected a definition");
    };
    let ExpressionKind::Invoke(invoke) = &definition.value.kind else {
        panic!("expected a call");
    };
    assert!(invoke.signature.type_params.is_empty());
    assert_eq!(invoke.signature.params, vec![Type::int()]);
    assert_eq!(*invoke.signature.return_type, Type::int());
}

#[test]
fn generic_definitions_keep_their_parameters() {
    let (program, messages) = analyze(IDENTITY);
    assert!(messages.is_empty(), "{messages:?}");
    let Type::Function(function) = definition_type(&program, "id") else {
        panic!("expected a function type");
    };
    assert_eq!(function.type_params.len(), 1);
    assert_eq!(function.to_string(), "(T) -> T");
}

#[test]
fn explicit_type_arguments_take_precedence() {
    let (program, messages) = analyze(&format!("{IDENTITY}def s = id[String](\"a\");"));
    assert!(messages.is_empty(), "{messages:?}");
    assert_eq!(definition_type(&program, "s"), Type::string());

    let (_, messages) = analyze(&format!("{IDENTITY}_ = id[String](1);"));
    assert_eq!(
        messages,
        vec![
            "A value of type `Int` cannot be passed as an argument to a parameter of type `String`"
                .to_string()
        ]
    );
}

#[test]
fn reports_type_argument_count() {
    let (_, messages) = analyze(&format!("{IDENTITY}_ = id[Int, String](1);"));
    assert_eq!(
        messages,
        vec!["Unexpected type arguments count: expected `1`, but got `2`".to_string()]
    );
}

#[test]
fn infers_from_the_expected_type() {
    let source = "def default[T]: (Int) -> T = { x -> exit(x) };\ndef n: String = default(1);";
    let (program, messages) = analyze(source);
    assert!(messages.is_empty(), "{messages:?}");
    assert_eq!(definition_type(&program, "n"), Type::string());
}

#[test]
fn reports_uninferred_parameters() {
    let source = "def default[T]: (Int) -> T = { x -> exit(x) };\n_ = default(1);";
    let (_, messages) = analyze(source);
    assert_eq!(messages, vec!["Cannot infer the type parameter `T`".to_string()]);

    let source = "def pair[A, B]: (Int) -> A = { x -> exit(x) };\n_ = pair(1);";
    let (_, messages) = analyze(source);
    assert_eq!(messages, vec!["Cannot infer these type parameters [ A, B ]".to_string()]);
}

#[test]
fn explicit_type_arguments_silence_inference_errors() {
    let source = "def default[T]: (Int) -> T = { x -> exit(x) };\ndef b = default[Boolean](1);";
    let (program, messages) = analyze(source);
    assert!(messages.is_empty(), "{messages:?}");
    assert_eq!(definition_type(&program, "b"), Type::boolean());
}

const MAP: &str = "def map[T, U] = { x: T, f: (T) -> U -> f(x) };\n";

#[test]
fn trailing_lambdas_learn_their_parameter_types() {
    let (program, messages) = analyze(&format!("{MAP}def r = map(1) {{ n -> n + 1 }};"));
    assert!(messages.is_empty(), "{messages:?}");
    assert_eq!(definition_type(&program, "r"), Type::int());
}

#[test]
fn callbacks_bind_their_return_type() {
    let source = format!("{MAP}def r = map(\"a\", {{ s: String -> s == \"a\" }});");
    let (program, messages) = analyze(&source);
    assert!(messages.is_empty(), "{messages:?}");
    assert_eq!(definition_type(&program, "r"), Type::boolean());
}

#[test]
fn nested_generic_calls() {
    let source = format!("{IDENTITY}{MAP}def r: String = map(id(1)) {{ n -> type_name(n) }};");
    let (program, messages) = analyze(&source);
    assert!(messages.is_empty(), "{messages:?}");
    assert_eq!(definition_type(&program, "r"), Type::string());
}

#[test]
fn builtins_are_generic() {
    let (program, messages) = analyze("def t = type_name(1.5);\nprintln(t);");
    assert!(messages.is_empty(), "{messages:?}");
    assert_eq!(definition_type(&program, "t"), Type::string());
}
