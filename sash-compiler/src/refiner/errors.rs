use thiserror::Error;

use super::types::{Type, TypeParam};

/// Problems the refiner reports against user programs. Each message is what
/// ends up in the diagnostic.
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("`{0}` is not defined")]
    Undefined(String),
    #[error("`{0}` has already been used")]
    Duplicate(String),
    #[error("Cannot use generic definition `{0}` without instantiation")]
    StandaloneGeneric(String),
    #[error("Cannot call a non function typed value")]
    NotCallable,
    #[error("A value of type `{actual}` cannot be assigned to a binding of type `{target}`")]
    AssignmentMismatch { actual: Type, target: Type },
    #[error(
        "A value of type `{actual}` cannot be passed as an argument to a parameter of type `{target}`"
    )]
    ArgumentMismatch { actual: Type, target: Type },
    #[error("Unexpected arguments count: expected `{expected}`, but got `{actual}`")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("Unexpected type arguments count: expected `{expected}`, but got `{actual}`")]
    TypeArgumentCount { expected: usize, actual: usize },
    #[error("Cannot infer the type parameter `{0}`")]
    UninferredParameter(TypeParam),
    #[error("Cannot infer these type parameters [ {} ]", join_params(.0))]
    UninferredParameters(Vec<TypeParam>),
    #[error("Cannot infer the type of `{0}`. Please specify it explicitly")]
    CannotInfer(String),
    #[error("Cannot assign values to this symbol")]
    InvalidAssignmentTarget,
    #[error("You cannot reassign a readonly definition. Consider adding the `mut` keyword")]
    ReadonlyAssignment,
    #[error("The `return` statement can only be used within the boundary of a function")]
    ReturnOutsideFunction,
    #[error("A return value of type `{0}` is missing")]
    MissingReturnValue(Type),
    #[error("Cannot return a value of type `{actual}` by a function that returns `{expected}`")]
    ReturnMismatch { actual: Type, expected: Type },
    #[error("A `return` statement is required at the end of this function")]
    MissingReturn,
    #[error("Unreachable code")]
    UnreachableCode,
    #[error("The `continue` statement can only be used inside a loop")]
    ContinueOutsideLoop,
    #[error("The `break` statement can only be used inside a loop")]
    BreakOutsideLoop,
    #[error("Only function and type binding can have type parameters")]
    ParametrizedValue,
    #[error("Definitions with type parameters cannot be mutable")]
    MutableParametrizedDefinition,
    #[error("Record definitions cannot be mutable. Consider removing the 'mut' keyword")]
    MutableRecord,
    #[error("Unit records cannot have type parameters")]
    ParametrizedUnitRecord,
    #[error("Enum definitions are not supported yet")]
    UnsupportedEnum,
    #[error("The condition type must be of type `Boolean`")]
    InvalidCondition,
    #[error("Implicit results are allowed only directly within `functions` and `if` expressions")]
    MisplacedImplicitResult,
    #[error("`if` must have an `else` branches when used as an expression")]
    MissingElse,
    #[error("`{actual}` cannot be yielded by a block that requires `{expected}`")]
    YieldMismatch { actual: Type, expected: Type },
    #[error("Expected a value of type `{0}`")]
    MissingResultValue(Type),
    #[error("`Unit` values cannot be discarded")]
    UnitDiscard,
    #[error("This expression's result must be discarded explicitly with ` _ = <expression> `")]
    UnusedExpression,
    #[error("Cannot apply `{operator}` on `{left}` and `{right}`")]
    InvalidBinaryOperation {
        operator: &'static str,
        left: Type,
        right: Type,
    },
    #[error("Cannot apply `{operator}` on `{operand}`")]
    InvalidUnaryOperation { operator: &'static str, operand: Type },
    #[error("Cannot fit `{text}` inside `{target}`")]
    NumberOverflow { text: String, target: Type },
    #[error("`{record}` has no field named `{field}`")]
    UnknownField { record: Type, field: String },
    #[error("Cannot access fields on a value of type `{0}`")]
    NotARecord(Type),
}

fn join_params(params: &[TypeParam]) -> String {
    params
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
