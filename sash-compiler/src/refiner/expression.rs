use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{self, ExpressionKind as Syntax, Literal, SourceSpan};
use crate::typed::{
    AssignmentExpression, BinaryExpression, ElseIfClause, Expression, ExpressionKind,
    FunctionExpression, IfExpression, LogicalExpression, MemberExpression, Parameter, Statement,
    UnaryExpression,
};

use super::context::ControlScope;
use super::errors::SemanticError;
use super::operators::{self, ResolvedOperator};
use super::types::{Definition, FunctionType, Type};
use super::Refiner;

/// How the expression being refined is used by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ExpressionMode {
    /// The expression is a statement of its own and its value is dropped.
    pub statement: bool,
    /// The expression is used as a value rather than as a call target.
    pub standalone: bool,
}

impl ExpressionMode {
    pub const CALL_TARGET: ExpressionMode = ExpressionMode {
        statement: false,
        standalone: false,
    };
    pub const STANDALONE: ExpressionMode = ExpressionMode {
        statement: false,
        standalone: true,
    };
    pub const STATEMENT: ExpressionMode = ExpressionMode {
        statement: true,
        standalone: true,
    };
}

impl Refiner {
    pub(super) fn refine_expression(
        &mut self,
        expression: &ast::Expression,
        mode: ExpressionMode,
    ) -> Expression {
        let span = expression.span;
        match &expression.kind {
            Syntax::Identifier(identifier) => self.refine_identifier(identifier, span, mode),
            Syntax::Literal(literal) => self.refine_literal(literal, span),
            Syntax::Grouping(inner) => {
                let inner = self.refine_expression(inner, ExpressionMode::STANDALONE);
                let ty = inner.ty.clone();
                Expression::new(ExpressionKind::Grouping(Box::new(inner)), ty, span)
            }
            Syntax::Assignment(assignment) => self.refine_assignment(assignment, span),
            Syntax::Unary(unary) => self.refine_unary(unary, span),
            Syntax::Binary(binary) => self.refine_binary(binary, span),
            Syntax::If(if_expression) => self.refine_if(if_expression, span, mode),
            Syntax::Lambda(lambda) => self.refine_lambda(lambda, span),
            Syntax::Call(call) => self.refine_call(call, span),
            Syntax::Member(member) => self.refine_member(member, span),
        }
    }

    fn refine_identifier(
        &mut self,
        identifier: &ast::Identifier,
        span: SourceSpan,
        mode: ExpressionMode,
    ) -> Expression {
        if identifier.injected {
            return Expression::error(span);
        }

        let definition = match self.context.get_definition(&identifier.name) {
            Some(definition) => definition,
            None => {
                self.report(SemanticError::Undefined(identifier.name.clone()), span);
                return Expression::error(span);
            }
        };

        if mode.standalone && definition.ty.is_generic_function() {
            self.report(
                SemanticError::StandaloneGeneric(identifier.name.clone()),
                span,
            );
            return Expression::error(span);
        }

        let ty = definition.ty.clone();
        Expression::new(ExpressionKind::Identifier(definition), ty, span)
    }

    fn refine_literal(&mut self, literal: &Literal, span: SourceSpan) -> Expression {
        match literal {
            Literal::Integer(text) => match text.parse::<i32>() {
                Ok(value) => Expression::new(ExpressionKind::Integer(value), Type::int(), span),
                Err(_) => self.number_overflow(text, Type::int(), span),
            },
            Literal::Decimal(text) => match text.parse::<f32>() {
                Ok(value) if value.is_finite() => {
                    Expression::new(ExpressionKind::Decimal(value), Type::float(), span)
                }
                _ => self.number_overflow(text, Type::float(), span),
            },
            Literal::String(value) => Expression::new(
                ExpressionKind::String(value.clone()),
                Type::string(),
                span,
            ),
            Literal::Boolean(value) => {
                Expression::new(ExpressionKind::Boolean(*value), Type::boolean(), span)
            }
        }
    }

    fn number_overflow(&mut self, text: &str, target: Type, span: SourceSpan) -> Expression {
        self.report(
            SemanticError::NumberOverflow {
                text: text.to_string(),
                target,
            },
            span,
        );
        Expression::error(span)
    }

    fn refine_assignment(
        &mut self,
        assignment: &ast::AssignmentExpression,
        span: SourceSpan,
    ) -> Expression {
        let target = self.with_contextual_type(None, |refiner| {
            refiner.refine_expression(&assignment.target, ExpressionMode::STANDALONE)
        });
        let value = self.with_contextual_type(Some(target.ty.clone()), |refiner| {
            refiner.refine_expression(&assignment.value, ExpressionMode::STANDALONE)
        });

        if target.ty.is_error() {
            return Expression::error(span);
        }

        let definition = match &target.kind {
            ExpressionKind::Identifier(definition) => definition.clone(),
            _ => {
                self.report(SemanticError::InvalidAssignmentTarget, target.span);
                return Expression::error(span);
            }
        };

        if !value.ty.is_assignable_to(&target.ty) {
            self.report(
                SemanticError::AssignmentMismatch {
                    actual: value.ty.clone(),
                    target: target.ty.clone(),
                },
                value.span,
            );
        }
        if definition.readonly {
            self.report(SemanticError::ReadonlyAssignment, assignment.operator_span);
        }

        Expression::new(
            ExpressionKind::Assignment(AssignmentExpression {
                target: definition,
                value: Box::new(value),
            }),
            target.ty,
            span,
        )
    }

    fn refine_unary(&mut self, unary: &ast::UnaryExpression, span: SourceSpan) -> Expression {
        let operand = self.with_contextual_type(None, |refiner| {
            refiner.refine_expression(&unary.operand, ExpressionMode::STANDALONE)
        });
        if operand.ty.is_error() {
            return Expression::error(span);
        }

        match operators::unary_operation_type(unary.operator, &operand.ty) {
            Some(ty) => Expression::new(
                ExpressionKind::Unary(UnaryExpression {
                    operator: unary.operator,
                    operand: Box::new(operand),
                }),
                ty,
                span,
            ),
            None => {
                self.report(
                    SemanticError::InvalidUnaryOperation {
                        operator: unary.operator.symbol(),
                        operand: operand.ty,
                    },
                    unary.operator_span,
                );
                Expression::error(span)
            }
        }
    }

    fn refine_binary(&mut self, binary: &ast::BinaryExpression, span: SourceSpan) -> Expression {
        let left = self.with_contextual_type(None, |refiner| {
            refiner.refine_expression(&binary.left, ExpressionMode::STANDALONE)
        });
        let right = self.with_contextual_type(None, |refiner| {
            refiner.refine_expression(&binary.right, ExpressionMode::STANDALONE)
        });
        if left.ty.is_error() || right.ty.is_error() {
            return Expression::error(span);
        }

        let resolved = operators::resolve_operator(binary.operator);
        let ty = match resolved {
            ResolvedOperator::Binary(operator) => {
                operators::binary_operation_type(&left.ty, operator, &right.ty)
            }
            ResolvedOperator::Logical(_) => operators::logical_operation_type(&left.ty, &right.ty),
        };

        let ty = match ty {
            Some(ty) => ty,
            None => {
                self.report(
                    SemanticError::InvalidBinaryOperation {
                        operator: binary.operator.symbol(),
                        left: left.ty,
                        right: right.ty,
                    },
                    binary.operator_span,
                );
                return Expression::error(span);
            }
        };

        let (left, right) = (Box::new(left), Box::new(right));
        let kind = match resolved {
            ResolvedOperator::Binary(operator) => ExpressionKind::Binary(BinaryExpression {
                operator,
                left,
                right,
            }),
            ResolvedOperator::Logical(operator) => ExpressionKind::Logical(LogicalExpression {
                operator,
                left,
                right,
            }),
        };
        Expression::new(kind, ty, span)
    }

    pub(super) fn refine_condition(&mut self, condition: &ast::Expression) -> Expression {
        let condition = self.with_contextual_type(Some(Type::boolean()), |refiner| {
            refiner.refine_expression(condition, ExpressionMode::STANDALONE)
        });
        if !condition.ty.is_assignable_to(&Type::boolean()) {
            self.report(SemanticError::InvalidCondition, condition.span);
        }
        condition
    }

    /// Refines the statements of a `{ ... }` body in a fresh lexical scope.
    pub(super) fn refine_block(&mut self, statements: &[ast::Statement]) -> Vec<Statement> {
        self.scoped(|refiner| {
            statements
                .iter()
                .map(|statement| refiner.refine_statement(statement))
                .collect()
        })
    }

    fn refine_if(
        &mut self,
        if_expression: &ast::IfExpression,
        span: SourceSpan,
        mode: ExpressionMode,
    ) -> Expression {
        if !mode.statement && if_expression.else_branch.is_none() {
            self.report(SemanticError::MissingElse, if_expression.keyword_span);
        }

        let condition = self.refine_condition(&if_expression.condition);
        let is_expression = !mode.statement && if_expression.else_branch.is_some();
        let expected = if is_expression {
            self.context.contextual_type().cloned()
        } else {
            Some(Type::unit())
        };

        let ((then_branch, else_ifs, else_branch, diverges), yielded) =
            self.with_control_scope(ControlScope::branches(expected), |refiner| {
                let (then_branch, mut diverges) = refiner.refine_branch(&if_expression.then_branch);

                let mut else_ifs = Vec::with_capacity(if_expression.else_ifs.len());
                for clause in &if_expression.else_ifs {
                    let condition = refiner.refine_condition(&clause.condition);
                    let (body, clause_diverges) = refiner.refine_branch(&clause.body);
                    diverges &= clause_diverges;
                    else_ifs.push(ElseIfClause { condition, body });
                }

                let else_branch = match &if_expression.else_branch {
                    Some(block) => {
                        let (body, else_diverges) = refiner.refine_branch(block);
                        diverges &= else_diverges;
                        Some(body)
                    }
                    None => None,
                };

                (then_branch, else_ifs, else_branch, diverges)
            });

        let ty = match yielded {
            Some(ty) => ty,
            None if is_expression && diverges => Type::nothing(),
            None => Type::unit(),
        };

        Expression::new(
            ExpressionKind::If(IfExpression {
                condition: Box::new(condition),
                then_branch,
                else_ifs,
                else_branch,
            }),
            ty,
            span,
        )
    }

    /// Refines one branch of an `if` and reports a missing result when the
    /// branch neither yields nor leaves the enclosing code. Returns whether the
    /// branch always leaves.
    fn refine_branch(&mut self, block: &ast::Block) -> (Vec<Statement>, bool) {
        let body = self.refine_block(&block.statements);
        let diverges = self.sequence_terminates(&body, false);
        let yields = matches!(body.last(), Some(Statement::Yield(_)));

        let required = match self.context.nearest_control_scope_mut() {
            Some(ControlScope::If { yielded_type }) => yielded_type.clone(),
            _ => None,
        };
        if let Some(required) = required {
            if !required.is_assignable_to(&Type::unit()) && !yields && !diverges {
                self.report(SemanticError::MissingResultValue(required), block.close_span);
            }
        }

        (body, diverges)
    }

    fn refine_lambda(&mut self, lambda: &ast::LambdaExpression, span: SourceSpan) -> Expression {
        let expected = match self.context.contextual_type() {
            Some(Type::Function(function)) => Some(function.clone()),
            _ => None,
        };

        let parameters = self.refine_lambda_parameters(lambda, expected.as_ref());
        let expected_return = expected.map(|function| *function.return_type);

        let (body, collected) = self.scoped(|refiner| {
            refiner.with_control_scope(ControlScope::function(expected_return), |refiner| {
                for parameter in &parameters {
                    refiner.context.put_definition(parameter.definition.clone());
                }
                refiner.with_contextual_type(None, |refiner| {
                    lambda
                        .body
                        .statements
                        .iter()
                        .map(|statement| refiner.refine_statement(statement))
                        .collect::<Vec<_>>()
                })
            })
        });

        let return_type = collected.unwrap_or_else(Type::unit);
        if !self.check_return_paths(&body, &return_type) {
            self.report(SemanticError::MissingReturn, lambda.body.close_span);
        }

        let ty = Type::Function(FunctionType {
            type_params: Vec::new(),
            params: parameters
                .iter()
                .map(|parameter| parameter.definition.ty.clone())
                .collect(),
            return_type: Box::new(return_type),
        });
        Expression::new(
            ExpressionKind::Function(FunctionExpression { parameters, body }),
            ty,
            span,
        )
    }

    fn refine_lambda_parameters(
        &mut self,
        lambda: &ast::LambdaExpression,
        expected: Option<&FunctionType>,
    ) -> Vec<Parameter> {
        if let Some(expected) = expected {
            if expected.params.len() != lambda.parameters.len() {
                self.report(
                    SemanticError::ArgumentCount {
                        expected: expected.params.len(),
                        actual: lambda.parameters.len(),
                    },
                    lambda.body.open_span,
                );
            }
        }

        let mut seen = HashSet::new();
        let mut parameters = Vec::with_capacity(lambda.parameters.len());

        for (index, parameter) in lambda.parameters.iter().enumerate() {
            let name = &parameter.name;
            if name.injected {
                continue;
            }
            if !seen.insert(name.name.as_str()) {
                self.report(SemanticError::Duplicate(name.name.clone()), name.span);
            }

            let contextual = expected.and_then(|function| function.params.get(index)).cloned();
            let annotated = parameter
                .type_annotation
                .as_ref()
                .map(|annotation| (self.refine_type(annotation), annotation.span()));

            if let (Some((annotated, annotation_span)), Some(contextual)) = (&annotated, &contextual) {
                if !contextual.is_assignable_to(annotated) {
                    self.report(
                        SemanticError::ArgumentMismatch {
                            actual: annotated.clone(),
                            target: contextual.clone(),
                        },
                        *annotation_span,
                    );
                }
            }

            let ty = match annotated.map(|(ty, _)| ty).or(contextual) {
                Some(ty) => ty,
                None => {
                    self.report(SemanticError::CannotInfer(name.name.clone()), name.span);
                    Type::Error
                }
            };

            parameters.push(Parameter {
                definition: Rc::new(Definition::new(name.name.clone(), ty, true)),
                span: parameter.span,
            });
        }

        parameters
    }

    fn refine_member(&mut self, member: &ast::MemberExpression, span: SourceSpan) -> Expression {
        let object = self.with_contextual_type(None, |refiner| {
            refiner.refine_expression(&member.object, ExpressionMode::STANDALONE)
        });
        if object.ty.is_error() || member.property.injected {
            return Expression::error(span);
        }

        let field_name = &member.property.name;
        let field_type = match &object.ty {
            Type::Record(record) => self.context.record(record.id).and_then(|declaration| {
                declaration
                    .field(field_name)
                    .map(|field| field.ty.instantiate(&declaration.type_params, &record.arguments))
            }),
            other => {
                self.report(SemanticError::NotARecord(other.clone()), object.span);
                return Expression::error(span);
            }
        };

        match field_type {
            Some(ty) => Expression::new(
                ExpressionKind::Member(MemberExpression {
                    object: Box::new(object),
                    field: field_name.clone(),
                }),
                ty,
                span,
            ),
            None => {
                self.report(
                    SemanticError::UnknownField {
                        record: object.ty,
                        field: field_name.clone(),
                    },
                    member.property.span,
                );
                Expression::error(span)
            }
        }
    }

    pub(super) fn refine_type(&mut self, ty: &ast::TypeExpression) -> Type {
        match ty {
            ast::TypeExpression::Named(named) => {
                if named.name.injected {
                    return Type::Error;
                }
                if let Some(arguments) = &named.type_arguments {
                    for argument in &arguments.arguments {
                        self.refine_type(argument);
                    }
                }
                match self.context.get_type(&named.name.name) {
                    Some(ty) => ty,
                    None => {
                        self.report(SemanticError::Undefined(named.name.name.clone()), named.span);
                        Type::Error
                    }
                }
            }
            ast::TypeExpression::Function(function) => {
                let params = function
                    .parameters
                    .iter()
                    .map(|parameter| self.refine_type(parameter))
                    .collect();
                let return_type = self.refine_type(&function.return_type);
                Type::function(params, return_type)
            }
        }
    }
}
