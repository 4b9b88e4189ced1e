mod ast;
mod compiler;
mod diagnostics;
mod lexer;
mod parser;
mod refiner;
mod source;
pub mod typed;

pub use crate::ast::{
    AssignmentExpression, BinaryExpression, BinaryOperator, Block, CallExpression,
    DefinitionStatement, ElseIfClause, EnumInitializer, EnumVariant, Expression, ExpressionKind,
    ExpressionStatement, FieldDeclaration, FunctionParameter, FunctionTypeExpression, Identifier,
    IfExpression, Initializer, LambdaExpression, Literal, MemberExpression, Module, NamedType,
    RecordInitializer, ReturnStatement, SourceSpan, Statement, TypeArguments, TypeExpression,
    TypeParameters, UnaryExpression, UnaryOperator, WhileStatement,
};
pub use crate::compiler::{Compilation, CompileOptions, Compiler};
pub use crate::diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics, DraftError};
pub use crate::lexer::{Keyword, Lexer, LexerError, Token, TokenKind};
pub use crate::parser::Parser;
pub use crate::refiner::types::{
    Definition, Field, FunctionType, RecordDeclaration, RecordId, RecordType, Type, TypeParam,
};
pub use crate::refiner::{Refiner, SemanticError};
pub use crate::source::{SourceFile, SourceId};
