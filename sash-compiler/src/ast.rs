pub use crate::source::SourceSpan;

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub statements: Vec<Statement>,
    pub span: SourceSpan,
}

impl Module {
    pub fn new(statements: Vec<Statement>, span: SourceSpan) -> Self {
        Self { statements, span }
    }
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: String,
    pub span: SourceSpan,
    /// True when the parser fabricated this name to stand in for missing input.
    pub injected: bool,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Definition(DefinitionStatement),
    Expression(ExpressionStatement),
    ImplicitResult(ExpressionStatement),
    Drop(ExpressionStatement),
    Return(ReturnStatement),
    While(WhileStatement),
    Break(SourceSpan),
    Continue(SourceSpan),
    Empty(SourceSpan),
}

impl Statement {
    pub fn span(&self) -> SourceSpan {
        match self {
            Statement::Definition(definition) => definition.span,
            Statement::Expression(statement)
            | Statement::ImplicitResult(statement)
            | Statement::Drop(statement) => statement.span,
            Statement::Return(statement) => statement.span,
            Statement::While(statement) => statement.span,
            Statement::Break(span) | Statement::Continue(span) | Statement::Empty(span) => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DefinitionStatement {
    pub mut_span: Option<SourceSpan>,
    pub name: Identifier,
    pub type_parameters: Option<TypeParameters>,
    pub type_annotation: Option<TypeExpression>,
    pub initializer: Initializer,
    pub span: SourceSpan,
}

impl DefinitionStatement {
    pub fn is_mutable(&self) -> bool {
        self.mut_span.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct TypeParameters {
    pub parameters: Vec<Identifier>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum Initializer {
    Expression(Expression),
    Record(RecordInitializer),
    Enum(EnumInitializer),
}

#[derive(Debug, Clone)]
pub struct RecordInitializer {
    pub keyword_span: SourceSpan,
    pub fields: Option<Vec<FieldDeclaration>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    pub name: Identifier,
    pub type_annotation: TypeExpression,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct EnumInitializer {
    pub keyword_span: SourceSpan,
    pub variants: Vec<EnumVariant>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct EnumVariant {
    pub name: Identifier,
    pub fields: Option<Vec<FieldDeclaration>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub keyword_span: SourceSpan,
    pub expression: Option<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Block,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub open_span: SourceSpan,
    pub close_span: SourceSpan,
}

impl Block {
    pub fn span(&self) -> SourceSpan {
        SourceSpan::union(&self.open_span, &self.close_span)
    }
}

#[derive(Debug, Clone)]
pub enum TypeExpression {
    Named(NamedType),
    Function(FunctionTypeExpression),
}

impl TypeExpression {
    pub fn span(&self) -> SourceSpan {
        match self {
            TypeExpression::Named(named) => named.span,
            TypeExpression::Function(function) => function.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NamedType {
    pub name: Identifier,
    pub type_arguments: Option<TypeArguments>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct FunctionTypeExpression {
    pub parameters: Vec<TypeExpression>,
    pub return_type: Box<TypeExpression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct TypeArguments {
    pub arguments: Vec<TypeExpression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct Expression {
    pub span: SourceSpan,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    Identifier(Identifier),
    Literal(Literal),
    Grouping(Box<Expression>),
    Assignment(AssignmentExpression),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    If(IfExpression),
    Lambda(LambdaExpression),
    Call(CallExpression),
    Member(MemberExpression),
}

#[derive(Debug, Clone)]
pub enum Literal {
    /// Digits as written; range checking happens during refinement.
    Integer(String),
    Decimal(String),
    String(String),
    Boolean(bool),
}

#[derive(Debug, Clone)]
pub struct AssignmentExpression {
    pub operator_span: SourceSpan,
    pub target: Box<Expression>,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Positive,
    Negative,
    Not,
}

#[derive(Debug, Clone)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operator_span: SourceSpan,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Positive => "+",
            UnaryOperator::Negative => "-",
            UnaryOperator::Not => "!",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub operator_span: SourceSpan,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct IfExpression {
    pub keyword_span: SourceSpan,
    pub condition: Box<Expression>,
    pub then_branch: Block,
    pub else_ifs: Vec<ElseIfClause>,
    pub else_branch: Option<Block>,
}

#[derive(Debug, Clone)]
pub struct ElseIfClause {
    pub condition: Expression,
    pub body: Block,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct LambdaExpression {
    pub parameters: Vec<FunctionParameter>,
    pub body: Block,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct FunctionParameter {
    pub name: Identifier,
    pub type_annotation: Option<TypeExpression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub type_arguments: Option<TypeArguments>,
    pub arguments: Vec<Expression>,
    pub trailing_lambda: Option<Box<Expression>>,
    /// From the opening to the closing parenthesis.
    pub arguments_span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: Identifier,
}
