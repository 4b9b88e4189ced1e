use crate::typed::{Expression, ExpressionKind, IfExpression, SourceSpan, Statement};

use super::errors::SemanticError;
use super::types::Type;
use super::Refiner;

impl Refiner {
    /// Whether a body with the given return type is allowed to end where
    /// `statements` ends. Reports unreachable code along the way.
    pub(super) fn check_return_paths(&mut self, statements: &[Statement], return_type: &Type) -> bool {
        self.sequence_terminates(statements, true)
            || return_type.is_assignable_to(&Type::unit())
            || return_type.is_error()
    }

    /// Whether control always leaves `statements` before reaching its end.
    /// With `report` set, every statement after the first terminating one is
    /// flagged as unreachable.
    pub(super) fn sequence_terminates(&mut self, statements: &[Statement], report: bool) -> bool {
        let mut terminated = false;
        for statement in statements {
            if terminated {
                if report {
                    self.report(SemanticError::UnreachableCode, statement.span());
                }
            } else {
                terminated = self.statement_terminates(statement, report);
            }
        }
        terminated
    }

    fn statement_terminates(&mut self, statement: &Statement, report: bool) -> bool {
        match statement {
            Statement::Return(_) | Statement::Break(_) | Statement::Continue(_) => true,
            Statement::Definition(definition) => self.expression_terminates(&definition.value, report),
            Statement::Expression(statement) | Statement::Yield(statement) => {
                self.expression_terminates(&statement.expression, report)
            }
            Statement::While(statement) => {
                self.sequence_terminates(&statement.body, report);
                false
            }
            Statement::Record(_) | Statement::Empty(_) | Statement::Error(_) => false,
        }
    }

    fn expression_terminates(&mut self, expression: &Expression, report: bool) -> bool {
        match &expression.kind {
            ExpressionKind::Integer(_)
            | ExpressionKind::Decimal(_)
            | ExpressionKind::String(_)
            | ExpressionKind::Boolean(_)
            | ExpressionKind::Identifier(_)
            | ExpressionKind::Function(_)
            | ExpressionKind::Error => false,
            ExpressionKind::Grouping(inner) => self.expression_terminates(inner, report),
            ExpressionKind::Assignment(assignment) => self.expression_terminates(&assignment.value, report),
            ExpressionKind::Unary(unary) => self.expression_terminates(&unary.operand, report),
            ExpressionKind::Binary(binary) => {
                let left = self.expression_terminates(&binary.left, report);
                let right = self.expression_terminates(&binary.right, report);
                left || right
            }
            ExpressionKind::Logical(logical) => {
                let left = self.expression_terminates(&logical.left, report);
                let right = self.expression_terminates(&logical.right, report);
                left || right
            }
            ExpressionKind::Member(member) => self.expression_terminates(&member.object, report),
            ExpressionKind::If(if_expression) => self.if_terminates(if_expression, report),
            ExpressionKind::Invoke(invoke) => {
                for (index, argument) in invoke.arguments.iter().enumerate() {
                    if self.expression_terminates(argument, report) {
                        if let (true, Some(next)) = (report, invoke.arguments.get(index + 1)) {
                            let span = SourceSpan::new(
                                next.span.line,
                                next.span.column,
                                expression.span.end_line,
                                expression.span.end_column,
                            );
                            self.report(SemanticError::UnreachableCode, span);
                        }
                        return true;
                    }
                }
                expression.ty.is_nothing()
            }
        }
    }

    /// Every branch is visited so each reports its own unreachable code.
    fn if_terminates(&mut self, if_expression: &IfExpression, report: bool) -> bool {
        let mut terminates = self.sequence_terminates(&if_expression.then_branch, report);
        for clause in &if_expression.else_ifs {
            terminates &= self.sequence_terminates(&clause.body, report);
        }
        match &if_expression.else_branch {
            Some(body) => self.sequence_terminates(body, report) && terminates,
            None => false,
        }
    }
}
