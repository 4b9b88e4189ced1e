use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{self, ExpressionKind as Syntax, Initializer, SourceSpan};
use crate::typed::{
    DefinitionStatement, ExpressionKind, ExpressionStatement, RecordStatement,
    ReturnStatement, Statement, WhileStatement,
};

use super::context::{refine_sink, ControlScope};
use super::errors::SemanticError;
use super::expression::ExpressionMode;
use super::types::{Definition, Field, FunctionType, RecordId, Type, TypeParam};
use super::Refiner;

/// What a trailing expression without a semicolon stands for.
enum ImplicitTarget {
    Return,
    Yield,
    Discard,
    Misplaced,
}

impl Refiner {
    pub(super) fn refine_statement(&mut self, statement: &ast::Statement) -> Statement {
        match statement {
            ast::Statement::Definition(definition) => self.refine_definition(definition),
            ast::Statement::Expression(statement) => self.refine_expression_statement(statement),
            ast::Statement::ImplicitResult(statement) => self.refine_implicit_result(statement),
            ast::Statement::Drop(statement) => self.refine_drop(statement),
            ast::Statement::Return(statement) => self.refine_return(statement),
            ast::Statement::While(statement) => self.refine_while(statement),
            ast::Statement::Break(span) => {
                if !self.context.is_inside_loop() {
                    self.report(SemanticError::BreakOutsideLoop, *span);
                }
                Statement::Break(*span)
            }
            ast::Statement::Continue(span) => {
                if !self.context.is_inside_loop() {
                    self.report(SemanticError::ContinueOutsideLoop, *span);
                }
                Statement::Continue(*span)
            }
            ast::Statement::Empty(span) => Statement::Empty(*span),
        }
    }

    fn refine_expression_statement(&mut self, statement: &ast::ExpressionStatement) -> Statement {
        let expression = self.with_contextual_type(None, |refiner| {
            refiner.refine_expression(&statement.expression, ExpressionMode::STATEMENT)
        });

        let is_assignment = matches!(expression.kind, ExpressionKind::Assignment(_));
        if !is_assignment && !expression.ty.is_assignable_to(&Type::unit()) {
            self.report(SemanticError::UnusedExpression, expression.span);
        }

        Statement::Expression(ExpressionStatement {
            expression,
            span: statement.span,
        })
    }

    fn refine_drop(&mut self, statement: &ast::ExpressionStatement) -> Statement {
        let expression = self.with_contextual_type(None, |refiner| {
            refiner.refine_expression(&statement.expression, ExpressionMode::STANDALONE)
        });

        if expression.ty.is_record(RecordId::UNIT) {
            self.report(SemanticError::UnitDiscard, expression.span);
        }

        Statement::Expression(ExpressionStatement {
            expression,
            span: statement.span,
        })
    }

    fn refine_while(&mut self, statement: &ast::WhileStatement) -> Statement {
        let condition = self.refine_condition(&statement.condition);
        let (body, _) = self.with_control_scope(ControlScope::Loop, |refiner| {
            refiner.refine_block(&statement.body.statements)
        });
        Statement::While(WhileStatement {
            condition,
            body,
            span: statement.span,
        })
    }

    fn refine_return(&mut self, statement: &ast::ReturnStatement) -> Statement {
        let expected = self.context.enclosing_function_mut().and_then(|sink| sink.clone());
        let value = statement.expression.as_ref().map(|expression| {
            self.with_contextual_type(expected, |refiner| {
                refiner.refine_expression(expression, ExpressionMode::STANDALONE)
            })
        });

        let keyword = statement.keyword_span;
        let value_type = value.as_ref().map(|value| value.ty.clone());

        match self.context.enclosing_function_mut() {
            None => self.report(SemanticError::ReturnOutsideFunction, keyword),
            Some(sink) => {
                let returned = value_type.unwrap_or_else(Type::unit);
                let problem = match sink.as_ref() {
                    Some(expected) if value.is_none() && !expected.is_assignable_to(&Type::unit()) => {
                        Some(SemanticError::MissingReturnValue(expected.clone()))
                    }
                    Some(expected) if !returned.is_assignable_to(expected) => {
                        Some(SemanticError::ReturnMismatch {
                            actual: returned,
                            expected: expected.clone(),
                        })
                    }
                    _ => {
                        refine_sink(sink, returned);
                        None
                    }
                };
                if let Some(problem) = problem {
                    self.report(problem, keyword);
                }
            }
        }

        Statement::Return(ReturnStatement {
            value,
            span: statement.span,
        })
    }

    fn implicit_target(&mut self, expression: &ast::Expression) -> ImplicitTarget {
        let is_assignment = matches!(expression.kind, Syntax::Assignment(_));
        match self.context.nearest_control_scope_mut() {
            Some(ControlScope::Function { .. }) => ImplicitTarget::Return,
            Some(ControlScope::Loop) => ImplicitTarget::Discard,
            Some(ControlScope::If { yielded_type }) => {
                let requires_unit = yielded_type
                    .as_ref()
                    .is_some_and(|ty| ty.is_record(RecordId::UNIT));
                if is_assignment && requires_unit {
                    ImplicitTarget::Discard
                } else {
                    ImplicitTarget::Yield
                }
            }
            None => ImplicitTarget::Misplaced,
        }
    }

    fn refine_implicit_result(&mut self, statement: &ast::ExpressionStatement) -> Statement {
        if let Syntax::If(if_expression) = &statement.expression.kind {
            if if_expression.else_branch.is_none() {
                return self.refine_expression_statement(statement);
            }
        }

        match self.implicit_target(&statement.expression) {
            ImplicitTarget::Return => self.refine_implicit_return(statement),
            ImplicitTarget::Yield => self.refine_implicit_yield(statement),
            ImplicitTarget::Discard => self.refine_implicit_discard(statement),
            ImplicitTarget::Misplaced => {
                self.with_contextual_type(None, |refiner| {
                    refiner.refine_expression(&statement.expression, ExpressionMode::STANDALONE)
                });
                self.report(SemanticError::MisplacedImplicitResult, statement.span);
                Statement::Error(statement.span)
            }
        }
    }

    fn refine_implicit_return(&mut self, statement: &ast::ExpressionStatement) -> Statement {
        let expected = self.context.enclosing_function_mut().and_then(|sink| sink.clone());
        let value = self.with_contextual_type(expected, |refiner| {
            refiner.refine_expression(&statement.expression, ExpressionMode::STANDALONE)
        });

        let ty = value.ty.clone();
        self.write_nearest_sink(ty, value.span, |actual, expected| SemanticError::ReturnMismatch {
            actual,
            expected,
        });

        Statement::Return(ReturnStatement {
            value: Some(value),
            span: statement.span,
        })
    }

    fn refine_implicit_yield(&mut self, statement: &ast::ExpressionStatement) -> Statement {
        let expected = match self.context.nearest_control_scope_mut() {
            Some(ControlScope::If { yielded_type }) => yielded_type.clone(),
            _ => None,
        };
        let value = self.with_contextual_type(expected, |refiner| {
            refiner.refine_expression(&statement.expression, ExpressionMode::STANDALONE)
        });

        let ty = value.ty.clone();
        self.write_nearest_sink(ty, value.span, |actual, expected| SemanticError::YieldMismatch {
            actual,
            expected,
        });

        Statement::Yield(ExpressionStatement {
            expression: value,
            span: statement.span,
        })
    }

    /// Loop bodies and `Unit` branches never produce a value, so their
    /// trailing expression must not carry one either.
    fn refine_implicit_discard(&mut self, statement: &ast::ExpressionStatement) -> Statement {
        let value = self.with_contextual_type(None, |refiner| {
            refiner.refine_expression(&statement.expression, ExpressionMode::STANDALONE)
        });

        let is_assignment = matches!(value.kind, ExpressionKind::Assignment(_));
        if !is_assignment && !value.ty.is_assignable_to(&Type::unit()) {
            self.report(
                SemanticError::YieldMismatch {
                    actual: value.ty.clone(),
                    expected: Type::unit(),
                },
                value.span,
            );
        }

        Statement::Expression(ExpressionStatement {
            expression: value,
            span: statement.span,
        })
    }

    /// Checks `ty` against the type collected so far by the nearest function
    /// or `if` scope, or records it there when nothing settled is known yet.
    /// A branch yielding `Nothing` leaves the `if` type to its siblings.
    fn write_nearest_sink(
        &mut self,
        ty: Type,
        span: SourceSpan,
        mismatch: impl FnOnce(Type, Type) -> SemanticError,
    ) {
        let (sink, records_nothing) = match self.context.nearest_control_scope_mut() {
            Some(ControlScope::Function { return_type }) => (return_type, true),
            Some(ControlScope::If { yielded_type }) => (yielded_type, false),
            Some(ControlScope::Loop) | None => return,
        };

        match sink.as_ref() {
            Some(expected) if !ty.is_assignable_to(expected) => {
                let error = mismatch(ty, expected.clone());
                self.report(error, span);
            }
            _ if ty.is_nothing() && !records_nothing => {}
            _ => refine_sink(sink, ty),
        }
    }

    fn refine_definition(&mut self, statement: &ast::DefinitionStatement) -> Statement {
        match &statement.initializer {
            Initializer::Expression(initializer) => self.refine_value_definition(statement, initializer),
            Initializer::Record(record) => self.refine_record_definition(statement, record),
            Initializer::Enum(enumeration) => {
                self.report(SemanticError::UnsupportedEnum, enumeration.keyword_span);
                Statement::Error(statement.span)
            }
        }
    }

    fn refine_type_params(&mut self, statement: &ast::DefinitionStatement) -> Vec<TypeParam> {
        let Some(type_parameters) = &statement.type_parameters else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut params = Vec::with_capacity(type_parameters.parameters.len());
        for name in &type_parameters.parameters {
            if name.injected {
                continue;
            }
            if !seen.insert(name.name.as_str()) {
                self.report(SemanticError::Duplicate(name.name.clone()), name.span);
                continue;
            }
            params.push(self.context.fresh_type_param(&name.name));
        }
        params
    }

    fn declare_type_params(&mut self, params: &[TypeParam]) {
        for param in params {
            self.context.put_type(&param.name, Type::Param(param.clone()));
        }
    }

    fn refine_value_definition(
        &mut self,
        statement: &ast::DefinitionStatement,
        initializer: &ast::Expression,
    ) -> Statement {
        let type_params = self.refine_type_params(statement);

        let (annotated, value) = self.scoped(|refiner| {
            refiner.declare_type_params(&type_params);
            let annotated = statement
                .type_annotation
                .as_ref()
                .map(|annotation| with_type_params(refiner.refine_type(annotation), &type_params));
            let value = refiner.with_contextual_type(annotated.clone(), |refiner| {
                refiner.refine_expression(initializer, ExpressionMode::STANDALONE)
            });
            (annotated, value)
        });

        if statement.type_parameters.is_some() {
            if let Some(mut_span) = statement.mut_span {
                self.report(SemanticError::MutableParametrizedDefinition, mut_span);
            }
            if !matches!(value.ty, Type::Function(_) | Type::Error) {
                self.report(SemanticError::ParametrizedValue, initializer.span);
            }
        }

        let ty = annotated.unwrap_or_else(|| with_type_params(value.ty.clone(), &type_params));
        let definition = Rc::new(Definition::new(
            statement.name.name.clone(),
            ty,
            !statement.is_mutable(),
        ));
        self.declare(&statement.name, definition.clone());

        if let Some(annotation) = &statement.type_annotation {
            if !value.ty.is_assignable_to(&definition.ty) {
                self.report(
                    SemanticError::AssignmentMismatch {
                        actual: value.ty.clone(),
                        target: definition.ty.clone(),
                    },
                    annotation.span(),
                );
            }
        }

        Statement::Definition(DefinitionStatement {
            definition,
            value,
            span: statement.span,
        })
    }

    /// Puts `definition` in the innermost scope unless the name is taken there.
    fn declare(&mut self, name: &ast::Identifier, definition: Rc<Definition>) {
        if name.injected {
            return;
        }
        if self.context.has_definition(&name.name) {
            self.report(SemanticError::Duplicate(name.name.clone()), name.span);
        } else {
            self.context.put_definition(definition);
        }
    }

    fn refine_record_definition(
        &mut self,
        statement: &ast::DefinitionStatement,
        record: &ast::RecordInitializer,
    ) -> Statement {
        let name = &statement.name;
        let type_params = self.refine_type_params(statement);
        let record_type = self.context.declare_record(&name.name, type_params.clone());

        if let Some(mut_span) = statement.mut_span {
            self.report(SemanticError::MutableRecord, mut_span);
        }

        // Declared before the fields so they can refer to the record itself.
        let taken = self.context.has_definition(&name.name);
        if !name.injected && !taken {
            self.context.put_type(&name.name, Type::Record(record_type.clone()));
        }

        let (annotated, fields) = self.scoped(|refiner| {
            refiner.declare_type_params(&type_params);
            let annotated = statement
                .type_annotation
                .as_ref()
                .map(|annotation| with_type_params(refiner.refine_type(annotation), &type_params));
            let fields = record
                .fields
                .as_ref()
                .map(|fields| refiner.refine_fields(fields));
            (annotated, fields)
        });
        self.context.set_record_fields(record_type.id, fields.clone());

        if fields.is_none() {
            if let Some(type_parameters) = &statement.type_parameters {
                self.report(SemanticError::ParametrizedUnitRecord, type_parameters.span);
            }
        }

        let actual = match fields {
            Some(fields) => Type::Function(FunctionType {
                type_params,
                params: fields.into_iter().map(|field| field.ty).collect(),
                return_type: Box::new(Type::Record(record_type.clone())),
            }),
            None => Type::Record(record_type.clone()),
        };
        let ty = annotated.unwrap_or_else(|| actual.clone());

        let definition = Rc::new(Definition::new(name.name.clone(), ty, !statement.is_mutable()));
        self.declare(name, definition.clone());

        if let Some(annotation) = &statement.type_annotation {
            if !actual.is_assignable_to(&definition.ty) {
                self.report(
                    SemanticError::AssignmentMismatch {
                        actual,
                        target: definition.ty.clone(),
                    },
                    annotation.span(),
                );
            }
        }

        Statement::Record(RecordStatement {
            definition,
            record: record_type,
            span: statement.span,
        })
    }

    fn refine_fields(&mut self, fields: &[ast::FieldDeclaration]) -> Vec<Field> {
        let mut seen = HashSet::new();
        let mut refined = Vec::with_capacity(fields.len());
        for field in fields {
            let name = &field.name;
            if name.injected {
                continue;
            }
            if !seen.insert(name.name.as_str()) {
                self.report(SemanticError::Duplicate(name.name.clone()), name.span);
            }
            refined.push(Field {
                name: name.name.clone(),
                ty: self.refine_type(&field.type_annotation),
            });
        }
        refined
    }
}

/// Attaches the definition's type parameters to a function type.
fn with_type_params(ty: Type, type_params: &[TypeParam]) -> Type {
    match ty {
        Type::Function(function) if !type_params.is_empty() => Type::Function(FunctionType {
            type_params: type_params.to_vec(),
            ..function
        }),
        other => other,
    }
}

