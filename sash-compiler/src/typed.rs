//! The refined program handed to later stages. Every expression carries its
//! resolved type and every identifier its binding.

use std::collections::HashMap;
use std::rc::Rc;

pub use crate::ast::{SourceSpan, UnaryOperator};
use crate::refiner::types::{Definition, FunctionType, RecordDeclaration, RecordType, Type, TypeParam};

#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
    /// Every record known to the program, builtins first, indexed by `RecordId`.
    pub records: Vec<RecordDeclaration>,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Definition(DefinitionStatement),
    Record(RecordStatement),
    Expression(ExpressionStatement),
    /// The implicit result of an `if` branch.
    Yield(ExpressionStatement),
    Return(ReturnStatement),
    While(WhileStatement),
    Break(SourceSpan),
    Continue(SourceSpan),
    Empty(SourceSpan),
    Error(SourceSpan),
}

impl Statement {
    pub fn span(&self) -> SourceSpan {
        match self {
            Statement::Definition(statement) => statement.span,
            Statement::Record(statement) => statement.span,
            Statement::Expression(statement) | Statement::Yield(statement) => statement.span,
            Statement::Return(statement) => statement.span,
            Statement::While(statement) => statement.span,
            Statement::Break(span)
            | Statement::Continue(span)
            | Statement::Empty(span)
            | Statement::Error(span) => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DefinitionStatement {
    pub definition: Rc<Definition>,
    pub value: Expression,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct RecordStatement {
    pub definition: Rc<Definition>,
    pub record: RecordType,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub ty: Type,
    pub span: SourceSpan,
}

impl Expression {
    pub fn new(kind: ExpressionKind, ty: Type, span: SourceSpan) -> Self {
        Self { kind, ty, span }
    }

    pub fn error(span: SourceSpan) -> Self {
        Self::new(ExpressionKind::Error, Type::Error, span)
    }
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    Integer(i32),
    Decimal(f32),
    String(String),
    Boolean(bool),
    Identifier(Rc<Definition>),
    Grouping(Box<Expression>),
    Assignment(AssignmentExpression),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    If(IfExpression),
    Function(FunctionExpression),
    Invoke(InvokeExpression),
    Member(MemberExpression),
    Error,
}

#[derive(Debug, Clone)]
pub struct AssignmentExpression {
    pub target: Rc<Definition>,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    Conjunction,
    Disjunction,
}

#[derive(Debug, Clone)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct IfExpression {
    pub condition: Box<Expression>,
    pub then_branch: Vec<Statement>,
    pub else_ifs: Vec<ElseIfClause>,
    pub else_branch: Option<Vec<Statement>>,
}

#[derive(Debug, Clone)]
pub struct ElseIfClause {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct FunctionExpression {
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub definition: Rc<Definition>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct InvokeExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    /// The callee's signature with every type parameter substituted.
    pub signature: FunctionType,
}

#[derive(Debug, Clone)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub field: String,
}

/// Final bindings of one generic call, applied to the subtrees that were
/// refined while the call's type parameters were still placeholders.
pub(crate) struct Settlement<'a> {
    bindings: &'a HashMap<TypeParam, Type>,
    params: &'a [TypeParam],
}

impl<'a> Settlement<'a> {
    pub(crate) fn new(bindings: &'a HashMap<TypeParam, Type>, params: &'a [TypeParam]) -> Self {
        Self { bindings, params }
    }

    pub(crate) fn apply(&self, ty: &Type) -> Type {
        ty.substitute(self.bindings).erase_placeholders_of(self.params)
    }

    fn apply_signature(&self, signature: &FunctionType) -> FunctionType {
        FunctionType {
            type_params: signature.type_params.clone(),
            params: signature.params.iter().map(|param| self.apply(param)).collect(),
            return_type: Box::new(self.apply(&signature.return_type)),
        }
    }

    fn apply_definition(&self, definition: &mut Rc<Definition>) {
        if definition.ty.has_placeholders() {
            let ty = self.apply(&definition.ty);
            Rc::make_mut(definition).ty = ty;
        }
    }

    pub(crate) fn settle_expression(&self, expression: &mut Expression) {
        if expression.ty.has_placeholders() {
            expression.ty = self.apply(&expression.ty);
        }

        match &mut expression.kind {
            ExpressionKind::Integer(_)
            | ExpressionKind::Decimal(_)
            | ExpressionKind::String(_)
            | ExpressionKind::Boolean(_)
            | ExpressionKind::Error => {}
            ExpressionKind::Identifier(definition) => self.apply_definition(definition),
            ExpressionKind::Grouping(inner) => self.settle_expression(inner),
            ExpressionKind::Assignment(assignment) => {
                self.apply_definition(&mut assignment.target);
                self.settle_expression(&mut assignment.value);
            }
            ExpressionKind::Unary(unary) => self.settle_expression(&mut unary.operand),
            ExpressionKind::Binary(binary) => {
                self.settle_expression(&mut binary.left);
                self.settle_expression(&mut binary.right);
            }
            ExpressionKind::Logical(logical) => {
                self.settle_expression(&mut logical.left);
                self.settle_expression(&mut logical.right);
            }
            ExpressionKind::If(if_expression) => {
                self.settle_expression(&mut if_expression.condition);
                self.settle_statements(&mut if_expression.then_branch);
                for clause in &mut if_expression.else_ifs {
                    self.settle_expression(&mut clause.condition);
                    self.settle_statements(&mut clause.body);
                }
                if let Some(body) = &mut if_expression.else_branch {
                    self.settle_statements(body);
                }
            }
            ExpressionKind::Function(function) => {
                for parameter in &mut function.parameters {
                    self.apply_definition(&mut parameter.definition);
                }
                self.settle_statements(&mut function.body);
            }
            ExpressionKind::Invoke(invoke) => {
                self.settle_expression(&mut invoke.callee);
                for argument in &mut invoke.arguments {
                    self.settle_expression(argument);
                }
                if invoke.signature.has_placeholders() {
                    invoke.signature = self.apply_signature(&invoke.signature);
                }
            }
            ExpressionKind::Member(member) => self.settle_expression(&mut member.object),
        }
    }

    fn settle_statements(&self, statements: &mut [Statement]) {
        for statement in statements {
            match statement {
                Statement::Definition(definition) => {
                    self.apply_definition(&mut definition.definition);
                    self.settle_expression(&mut definition.value);
                }
                Statement::Expression(statement) | Statement::Yield(statement) => {
                    self.settle_expression(&mut statement.expression);
                }
                Statement::Return(statement) => {
                    if let Some(value) = &mut statement.value {
                        self.settle_expression(value);
                    }
                }
                Statement::While(statement) => {
                    self.settle_expression(&mut statement.condition);
                    self.settle_statements(&mut statement.body);
                }
                Statement::Record(_)
                | Statement::Break(_)
                | Statement::Continue(_)
                | Statement::Empty(_)
                | Statement::Error(_) => {}
            }
        }
    }
}
