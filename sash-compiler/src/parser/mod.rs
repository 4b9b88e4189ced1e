use anyhow::{bail, Result};

use crate::ast::*;
use crate::diagnostics::Diagnostics;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::source::SourceFile;

#[derive(Copy, Clone, PartialEq, PartialOrd)]
enum Precedence {
    Lowest = 0,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
}

impl Precedence {
    fn of(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Equal => Some(Precedence::Assignment),
            TokenKind::PipePipe => Some(Precedence::Or),
            TokenKind::AmpersandAmpersand => Some(Precedence::And),
            TokenKind::DoubleEqual | TokenKind::BangEqual => Some(Precedence::Equality),
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => Some(Precedence::Comparison),
            TokenKind::Plus | TokenKind::Minus => Some(Precedence::Term),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(Precedence::Factor),
            _ => None,
        }
    }
}

/// Recursive-descent parser for sash.
///
/// The parser never gives up on a malformed program. A missing token is
/// reported once and replaced by an injected stand-in, and further reports are
/// muted until a token is matched again, so a single mistake yields a single
/// diagnostic. The `Err` side of its results is reserved for internal faults.
pub struct Parser<'a> {
    _source: &'a SourceFile,
    tokens: Vec<Token>,
    current: usize,
    diagnostics: Diagnostics,
    can_report_errors: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a SourceFile, tokens: Vec<Token>) -> Self {
        Self {
            _source: source,
            tokens,
            current: 0,
            diagnostics: Diagnostics::new(),
            can_report_errors: true,
        }
    }

    fn make_expression(span: SourceSpan, kind: ExpressionKind) -> Expression {
        Expression { span, kind }
    }

    fn union_spans(a: &SourceSpan, b: &SourceSpan) -> SourceSpan {
        SourceSpan::union(a, b)
    }

    pub fn parse(&mut self) -> Result<Module> {
        let start = self.peek().span();
        let mut statements = Vec::new();

        while !self.is_at_end() {
            let before = self.current;
            statements.push(self.parse_statement()?);
            self.ensure_progress(before);
        }

        let span = Self::union_spans(&start, &self.peek().span());
        Ok(Module::new(statements, span))
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Continue) => {
                let span = self.parse_jump();
                Ok(Statement::Continue(span))
            }
            TokenKind::Keyword(Keyword::Break) => {
                let span = self.parse_jump();
                Ok(Statement::Break(span))
            }
            TokenKind::Keyword(Keyword::Def) => self.parse_definition(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Semicolon => Ok(self.parse_empty_statement()),
            TokenKind::Underscore => self.parse_drop(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_jump(&mut self) -> SourceSpan {
        let keyword_span = self.advance().span();
        self.expect(TokenKind::Semicolon, ";");
        Self::union_spans(&keyword_span, &self.previous_span())
    }

    fn parse_empty_statement(&mut self) -> Statement {
        let start = self.peek().span();
        let mut count = 0usize;
        while matches!(self.peek_kind(), TokenKind::Semicolon) {
            self.advance();
            count += 1;
        }
        let span = Self::union_spans(&start, &self.previous_span());
        let noun = if count == 1 { "semicolon" } else { "semicolons" };
        self.diagnostics
            .push_warning_with_span(format!("Redundant {noun}"), span);
        Statement::Empty(span)
    }

    fn parse_drop(&mut self) -> Result<Statement> {
        let start = self.advance().span();
        self.expect(TokenKind::Equal, "=");
        let expression = self.parse_expression(false)?;
        self.expect(TokenKind::Semicolon, ";");
        let span = Self::union_spans(&start, &self.previous_span());
        Ok(Statement::Drop(ExpressionStatement { expression, span }))
    }

    fn parse_return(&mut self) -> Result<Statement> {
        let keyword_span = self.advance().span();
        let expression = if matches!(self.peek_kind(), TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect(TokenKind::Semicolon, ";");
        let span = Self::union_spans(&keyword_span, &self.previous_span());
        Ok(Statement::Return(ReturnStatement {
            keyword_span,
            expression,
            span,
        }))
    }

    fn parse_while(&mut self) -> Result<Statement> {
        let start = self.advance().span();
        let condition = self.parse_expression(true)?;
        let body = self.parse_control_body()?;
        let span = Self::union_spans(&start, &body.close_span);
        Ok(Statement::While(WhileStatement {
            condition,
            body,
            span,
        }))
    }

    fn parse_definition(&mut self) -> Result<Statement> {
        let start = self.advance().span();
        let mut_span = self.consume_if(TokenKind::Keyword(Keyword::Mut)).map(|t| t.span());
        let name = self.expect_identifier("an identifier");
        let type_parameters = self.parse_type_parameters();
        let type_annotation = self.parse_type_annotation()?;
        self.expect(TokenKind::Equal, "=");

        let initializer = match self.peek_kind() {
            TokenKind::Keyword(Keyword::Record) => Initializer::Record(self.parse_record()?),
            TokenKind::Keyword(Keyword::Enum) => Initializer::Enum(self.parse_enum()?),
            _ => Initializer::Expression(self.parse_expression(false)?),
        };

        self.expect(TokenKind::Semicolon, ";");
        let span = Self::union_spans(&start, &self.previous_span());
        Ok(Statement::Definition(DefinitionStatement {
            mut_span,
            name,
            type_parameters,
            type_annotation,
            initializer,
            span,
        }))
    }

    fn parse_type_parameters(&mut self) -> Option<TypeParameters> {
        let open = self.consume_if(TokenKind::LBracket)?;
        let mut parameters = Vec::new();

        if matches!(self.peek_kind(), TokenKind::RBracket) {
            self.report_expected("an identifier");
        }
        while !self.is_at_end() && !matches!(self.peek_kind(), TokenKind::RBracket) {
            let before = self.current;
            parameters.push(self.expect_identifier("a type parameter"));
            if !matches!(self.peek_kind(), TokenKind::RBracket) {
                self.expect(TokenKind::Comma, ",");
            }
            self.ensure_progress(before);
        }

        self.expect(TokenKind::RBracket, "]");
        let span = Self::union_spans(&open.span(), &self.previous_span());
        Some(TypeParameters { parameters, span })
    }

    fn parse_record(&mut self) -> Result<RecordInitializer> {
        let keyword_span = self.advance().span();
        let fields = self.parse_fields()?;
        let span = Self::union_spans(&keyword_span, &self.previous_span());
        Ok(RecordInitializer {
            keyword_span,
            fields,
            span,
        })
    }

    fn parse_enum(&mut self) -> Result<EnumInitializer> {
        let keyword_span = self.advance().span();
        self.expect(TokenKind::LBrace, "{");

        let mut variants = Vec::new();
        if matches!(self.peek_kind(), TokenKind::LBrace) {
            self.report_expected("an enum entry");
        } else {
            while !self.is_at_end() && !matches!(self.peek_kind(), TokenKind::RBrace) {
                let before = self.current;
                let name = self.expect_identifier("an identifier");
                let fields = self.parse_fields()?;
                let span = Self::union_spans(&name.span, &self.previous_span());
                variants.push(EnumVariant { name, fields, span });
                if !matches!(self.peek_kind(), TokenKind::RBrace) {
                    self.expect(TokenKind::Comma, ",");
                }
                self.ensure_progress(before);
            }
        }

        self.expect(TokenKind::RBrace, "}");
        let span = Self::union_spans(&keyword_span, &self.previous_span());
        Ok(EnumInitializer {
            keyword_span,
            variants,
            span,
        })
    }

    fn parse_fields(&mut self) -> Result<Option<Vec<FieldDeclaration>>> {
        if self.consume_if(TokenKind::LBrace).is_none() {
            return Ok(None);
        }

        let mut fields = Vec::new();
        if matches!(self.peek_kind(), TokenKind::LBrace) {
            self.report_expected("a field");
        } else {
            while !self.is_at_end() && !matches!(self.peek_kind(), TokenKind::RBrace) {
                let before = self.current;
                let name = self.expect_identifier("an identifier");
                self.expect(TokenKind::Colon, ":");
                let type_annotation = self.parse_type()?;
                let span = Self::union_spans(&name.span, &type_annotation.span());
                fields.push(FieldDeclaration {
                    name,
                    type_annotation,
                    span,
                });
                if !matches!(self.peek_kind(), TokenKind::RBrace) {
                    self.expect(TokenKind::Comma, ",");
                }
                self.ensure_progress(before);
            }
        }

        self.expect(TokenKind::RBrace, "}");
        Ok(Some(fields))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement> {
        let expression = self.parse_expression(false)?;

        if matches!(self.peek_kind(), TokenKind::RBrace) {
            let span = expression.span;
            return Ok(Statement::ImplicitResult(ExpressionStatement { expression, span }));
        }

        if matches!(expression.kind, ExpressionKind::If(_)) {
            self.consume_if(TokenKind::Semicolon);
        } else {
            self.expect(TokenKind::Semicolon, ";");
        }

        let span = Self::union_spans(&expression.span, &self.previous_span());
        Ok(Statement::Expression(ExpressionStatement { expression, span }))
    }

    fn parse_control_body(&mut self) -> Result<Block> {
        let open_span = self.expect(TokenKind::LBrace, "{").span();
        let statements = self.parse_statements_until_brace()?;
        let close_span = self.expect(TokenKind::RBrace, "}").span();
        Ok(Block {
            statements,
            open_span,
            close_span,
        })
    }

    fn parse_statements_until_brace(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        while !self.is_at_end() && !matches!(self.peek_kind(), TokenKind::RBrace) {
            let before = self.current;
            statements.push(self.parse_statement()?);
            self.ensure_progress(before);
        }
        Ok(statements)
    }

    /// Parses an expression. In `basic` mode (conditions of `if` and `while`)
    /// a trailing closure is only taken when another block follows it.
    fn parse_expression(&mut self, basic: bool) -> Result<Expression> {
        self.parse_expression_prec(Precedence::Lowest, basic)
    }

    fn parse_expression_prec(&mut self, precedence: Precedence, basic: bool) -> Result<Expression> {
        let mut expr = self.parse_prefix_expression(basic)?;

        loop {
            let next_precedence = match Precedence::of(self.peek_kind()) {
                Some(p) => p,
                None => break,
            };

            if precedence >= next_precedence {
                break;
            }

            expr = self.parse_infix_expression(expr, next_precedence, basic)?;
        }

        Ok(expr)
    }

    fn parse_prefix_expression(&mut self, basic: bool) -> Result<Expression> {
        let operator = match self.peek_kind() {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Plus => UnaryOperator::Positive,
            TokenKind::Minus => UnaryOperator::Negative,
            _ => return self.parse_postfix_expression(basic),
        };

        let operator_span = self.advance().span();
        let operand = self.parse_prefix_expression(basic)?;
        let span = Self::union_spans(&operator_span, &operand.span);
        Ok(Self::make_expression(
            span,
            ExpressionKind::Unary(UnaryExpression {
                operator,
                operator_span,
                operand: Box::new(operand),
            }),
        ))
    }

    fn parse_infix_expression(
        &mut self,
        left: Expression,
        precedence: Precedence,
        basic: bool,
    ) -> Result<Expression> {
        let operator_token = self.advance();
        let operator_span = operator_token.span();

        if operator_token.kind == TokenKind::Equal {
            let value = self.parse_expression_prec(Precedence::Lowest, basic)?;
            let span = Self::union_spans(&left.span, &value.span);
            return Ok(Self::make_expression(
                span,
                ExpressionKind::Assignment(AssignmentExpression {
                    operator_span,
                    target: Box::new(left),
                    value: Box::new(value),
                }),
            ));
        }

        let operator = binary_operator_from_token(&operator_token.kind)?;
        let right = self.parse_expression_prec(precedence, basic)?;
        let span = Self::union_spans(&left.span, &right.span);
        Ok(Self::make_expression(
            span,
            ExpressionKind::Binary(BinaryExpression {
                operator,
                operator_span,
                left: Box::new(left),
                right: Box::new(right),
            }),
        ))
    }

    fn parse_postfix_expression(&mut self, basic: bool) -> Result<Expression> {
        let mut expr = self.parse_primary_expression()?;

        while !self.is_at_end() {
            if matches!(self.peek_kind(), TokenKind::Dot) {
                self.advance();
                let property = self.expect_identifier("a field name");
                let span = Self::union_spans(&expr.span, &self.previous_span());
                expr = Self::make_expression(
                    span,
                    ExpressionKind::Member(MemberExpression {
                        object: Box::new(expr),
                        property,
                    }),
                );
                continue;
            }

            let can_have_lambda = !basic || self.can_have_trailing_lambda();
            let callable = match self.peek_kind() {
                TokenKind::LBracket | TokenKind::LParen => true,
                TokenKind::LBrace => can_have_lambda,
                _ => false,
            };
            if !callable {
                break;
            }

            let type_arguments = self.parse_type_arguments()?;
            let arguments = if matches!(self.peek_kind(), TokenKind::LParen) {
                Some(self.parse_arguments()?)
            } else {
                None
            };

            if can_have_lambda && matches!(self.peek_kind(), TokenKind::LBrace) {
                let lambda = self.parse_lambda()?;
                let (arguments, arguments_span) =
                    arguments.unwrap_or_else(|| (Vec::new(), lambda.span.start()));
                let span = Self::union_spans(&expr.span, &lambda.span);
                return Ok(Self::make_expression(
                    span,
                    ExpressionKind::Call(CallExpression {
                        callee: Box::new(expr),
                        type_arguments,
                        arguments,
                        trailing_lambda: Some(Box::new(lambda)),
                        arguments_span,
                    }),
                ));
            }

            let (arguments, arguments_span) = match arguments {
                Some(arguments) => arguments,
                None => self.parse_arguments()?,
            };
            let span = Self::union_spans(&expr.span, &self.previous_span());
            expr = Self::make_expression(
                span,
                ExpressionKind::Call(CallExpression {
                    callee: Box::new(expr),
                    type_arguments,
                    arguments,
                    trailing_lambda: None,
                    arguments_span,
                }),
            );
        }

        Ok(expr)
    }

    /// Looks past the next `{ ... }` group and reports whether another `{`
    /// follows it, as in `while check(x) { it > 0 } { ... }`.
    fn can_have_trailing_lambda(&self) -> bool {
        let mut offset = 0usize;
        loop {
            match self.peek_kind_at(offset) {
                TokenKind::Eof | TokenKind::Semicolon => return false,
                TokenKind::LBrace => break,
                _ => offset += 1,
            }
        }
        offset += 1;

        let mut depth = 1usize;
        while depth > 0 {
            match self.peek_kind_at(offset) {
                TokenKind::Eof => return false,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            offset += 1;
        }

        matches!(self.peek_kind_at(offset), TokenKind::LBrace)
    }

    fn parse_arguments(&mut self) -> Result<(Vec<Expression>, SourceSpan)> {
        let open_span = self.expect(TokenKind::LParen, "(").span();
        let mut arguments = Vec::new();

        while !self.is_at_end() && !matches!(self.peek_kind(), TokenKind::RParen) {
            let before = self.current;
            arguments.push(self.parse_expression(false)?);
            if !matches!(self.peek_kind(), TokenKind::RParen) {
                self.expect(TokenKind::Comma, ",");
            }
            self.ensure_progress(before);
        }

        self.expect(TokenKind::RParen, ")");
        let span = Self::union_spans(&open_span, &self.previous_span());
        Ok((arguments, span))
    }

    fn parse_primary_expression(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        let token_span = token.span();
        let literal = match token.kind {
            TokenKind::BooleanLiteral(value) => Literal::Boolean(value),
            TokenKind::IntegerLiteral => Literal::Integer(token.lexeme),
            TokenKind::DecimalLiteral => Literal::Decimal(token.lexeme),
            TokenKind::StringLiteral(value) => Literal::String(value),
            TokenKind::LParen => return self.parse_grouping(),
            TokenKind::Keyword(Keyword::If) => return self.parse_if(),
            TokenKind::LBrace => return self.parse_lambda(),
            _ => {
                let identifier = self.expect_identifier("an expression");
                return Ok(Self::make_expression(
                    identifier.span,
                    ExpressionKind::Identifier(identifier),
                ));
            }
        };

        self.advance();
        Ok(Self::make_expression(
            token_span,
            ExpressionKind::Literal(literal),
        ))
    }

    fn parse_grouping(&mut self) -> Result<Expression> {
        let open_span = self.advance().span();
        let inner = self.parse_expression(false)?;
        self.expect(TokenKind::RParen, ")");
        let span = Self::union_spans(&open_span, &self.previous_span());
        Ok(Self::make_expression(
            span,
            ExpressionKind::Grouping(Box::new(inner)),
        ))
    }

    fn parse_if(&mut self) -> Result<Expression> {
        let keyword_span = self.advance().span();
        let condition = self.parse_expression(true)?;
        let then_branch = self.parse_control_body()?;

        let mut else_ifs = Vec::new();
        while matches!(self.peek_kind(), TokenKind::Keyword(Keyword::Else))
            && matches!(self.peek_kind_at(1), TokenKind::Keyword(Keyword::If))
        {
            let start = self.advance().span();
            self.advance();
            let condition = self.parse_expression(true)?;
            let body = self.parse_control_body()?;
            let span = Self::union_spans(&start, &body.close_span);
            else_ifs.push(ElseIfClause {
                condition,
                body,
                span,
            });
        }

        let else_branch = match self.consume_if(TokenKind::Keyword(Keyword::Else)) {
            Some(_) => Some(self.parse_control_body()?),
            None => None,
        };

        let span = Self::union_spans(&keyword_span, &self.previous_span());
        Ok(Self::make_expression(
            span,
            ExpressionKind::If(IfExpression {
                keyword_span,
                condition: Box::new(condition),
                then_branch,
                else_ifs,
                else_branch,
            }),
        ))
    }

    fn parse_lambda(&mut self) -> Result<Expression> {
        let open_span = self.advance().span();
        let parameters = self.parse_lambda_parameters()?;
        let statements = self.parse_statements_until_brace()?;
        let close_span = self.expect(TokenKind::RBrace, "}").span();
        let span = Self::union_spans(&open_span, &close_span);

        Ok(Self::make_expression(
            span,
            ExpressionKind::Lambda(LambdaExpression {
                parameters,
                body: Block {
                    statements,
                    open_span,
                    close_span,
                },
                span,
            }),
        ))
    }

    /// Speculatively parses `params ->`. Without the arrow the cursor is
    /// rewound and every diagnostic produced on the way is dropped.
    fn parse_lambda_parameters(&mut self) -> Result<Vec<FunctionParameter>> {
        let checkpoint = self.current;
        self.can_report_errors = true;
        self.diagnostics.draft();

        let mut parameters = Vec::new();
        if matches!(self.peek_kind(), TokenKind::Arrow) {
            self.report_expected("a function parameter");
        }
        while !self.is_at_end() && self.has_more_lambda_parameters() {
            let before = self.current;
            let name = self.expect_identifier("an identifier");
            let type_annotation = self.parse_type_annotation()?;
            let span = match &type_annotation {
                Some(annotation) => Self::union_spans(&name.span, &annotation.span()),
                None => name.span,
            };
            parameters.push(FunctionParameter {
                name,
                type_annotation,
                span,
            });
            if self.has_more_lambda_parameters() {
                self.expect(TokenKind::Comma, ",");
            }
            self.ensure_progress(before);
        }

        if self.consume_if(TokenKind::Arrow).is_none() {
            self.current = checkpoint;
            self.can_report_errors = true;
            self.diagnostics.discard()?;
            return Ok(Vec::new());
        }

        self.diagnostics.retain()?;
        Ok(parameters)
    }

    fn has_more_lambda_parameters(&self) -> bool {
        !matches!(
            self.peek_kind(),
            TokenKind::Arrow | TokenKind::LBrace | TokenKind::RBrace
        )
    }

    fn parse_type_annotation(&mut self) -> Result<Option<TypeExpression>> {
        if self.consume_if(TokenKind::Colon).is_none() {
            return Ok(None);
        }
        self.parse_type().map(Some)
    }

    fn parse_type(&mut self) -> Result<TypeExpression> {
        if !matches!(self.peek_kind(), TokenKind::LParen) {
            let name = self.expect_identifier("a type");
            let type_arguments = self.parse_type_arguments()?;
            let span = Self::union_spans(&name.span, &self.previous_span());
            return Ok(TypeExpression::Named(NamedType {
                name,
                type_arguments,
                span,
            }));
        }

        let open_span = self.advance().span();
        let mut parameters = Vec::new();
        while !self.is_at_end() && !matches!(self.peek_kind(), TokenKind::RParen) {
            let before = self.current;
            parameters.push(self.parse_type()?);
            if !matches!(self.peek_kind(), TokenKind::RParen) {
                self.expect(TokenKind::Comma, ",");
            }
            self.ensure_progress(before);
        }
        self.expect(TokenKind::RParen, ")");
        self.expect(TokenKind::Arrow, "->");
        let return_type = self.parse_type()?;
        let span = Self::union_spans(&open_span, &return_type.span());

        Ok(TypeExpression::Function(FunctionTypeExpression {
            parameters,
            return_type: Box::new(return_type),
            span,
        }))
    }

    fn parse_type_arguments(&mut self) -> Result<Option<TypeArguments>> {
        let open = match self.consume_if(TokenKind::LBracket) {
            Some(token) => token,
            None => return Ok(None),
        };

        let mut arguments = Vec::new();
        if matches!(self.peek_kind(), TokenKind::RBracket) {
            self.report_expected("a type");
        }
        while !self.is_at_end() && !matches!(self.peek_kind(), TokenKind::RBracket) {
            let before = self.current;
            arguments.push(self.parse_type()?);
            if !matches!(self.peek_kind(), TokenKind::RBracket) {
                self.expect(TokenKind::Comma, ",");
            }
            self.ensure_progress(before);
        }

        self.expect(TokenKind::RBracket, "]");
        let span = Self::union_spans(&open.span(), &self.previous_span());
        Ok(Some(TypeArguments { arguments, span }))
    }

    /// Consumes a token of `kind`, or reports it missing and returns an
    /// injected stand-in positioned at the current token.
    fn expect(&mut self, kind: TokenKind, expected: &str) -> Token {
        self.expect_or_report(kind, |actual| {
            format!("Expected `{expected}` but got `{actual}`")
        })
    }

    fn expect_or_report(&mut self, kind: TokenKind, message: impl FnOnce(&str) -> String) -> Token {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(&kind) {
            self.can_report_errors = true;
            return self.advance();
        }

        let token = self.peek().clone();
        if self.can_report_errors {
            let actual = if token.lexeme.is_empty() {
                token.kind.describe()
            } else {
                token.lexeme.as_str()
            };
            self.diagnostics
                .push_error_with_span(message(actual), token.span());
            self.can_report_errors = false;
        }

        Token::injected(kind, token.line, token.column)
    }

    /// Like `expect`, but names a category such as `an expression` rather
    /// than a single token.
    fn expect_identifier(&mut self, expected: &str) -> Identifier {
        let token = self.expect_or_report(TokenKind::Identifier, |_| format!("Expected {expected}"));
        Identifier {
            span: token.span(),
            name: token.lexeme,
            injected: token.injected,
        }
    }

    fn report_expected(&mut self, expected: &str) {
        let span = self.peek().span();
        self.diagnostics
            .push_error_with_span(format!("Expected {expected}"), span);
    }

    fn consume_if(&mut self, kind: TokenKind) -> Option<Token> {
        if *self.peek_kind() == kind {
            self.can_report_errors = true;
            Some(self.advance())
        } else {
            None
        }
    }

    /// Skips the current token when a list element consumed nothing, which
    /// only happens after a muted error.
    fn ensure_progress(&mut self, before: usize) {
        if self.current == before && !self.is_at_end() {
            self.advance();
        }
    }

    fn previous_span(&self) -> SourceSpan {
        match self.current.checked_sub(1) {
            Some(index) => self.tokens[index].span(),
            None => self.peek().span(),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.current].kind
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        let index = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }
}

fn binary_operator_from_token(kind: &TokenKind) -> Result<BinaryOperator> {
    let operator = match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Modulo,
        TokenKind::DoubleEqual => BinaryOperator::Equal,
        TokenKind::BangEqual => BinaryOperator::NotEqual,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::LessEqual => BinaryOperator::LessEqual,
        TokenKind::Greater => BinaryOperator::Greater,
        TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
        TokenKind::AmpersandAmpersand => BinaryOperator::And,
        TokenKind::PipePipe => BinaryOperator::Or,
        other => bail!("unexpected binary operator {:?}", other),
    };
    Ok(operator)
}
