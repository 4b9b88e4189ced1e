use std::collections::HashMap;

use crate::ast::{self, SourceSpan};
use crate::typed::{Expression, ExpressionKind, InvokeExpression, Settlement};

use super::errors::SemanticError;
use super::expression::ExpressionMode;
use super::types::{FunctionType, Type, TypeParam};
use super::Refiner;

impl Refiner {
    /// Refines a call, inferring the callee's type arguments from explicit
    /// type arguments, then the arguments from left to right, then the type
    /// the call is expected to produce.
    pub(super) fn refine_call(&mut self, call: &ast::CallExpression, span: SourceSpan) -> Expression {
        let callee = self.with_contextual_type(None, |refiner| {
            refiner.refine_expression(&call.callee, ExpressionMode::CALL_TARGET)
        });
        let type_arguments = call.type_arguments.as_ref().map(|arguments| {
            arguments
                .arguments
                .iter()
                .map(|argument| self.refine_type(argument))
                .collect::<Vec<_>>()
        });

        let function = match &callee.ty {
            Type::Function(function) => function.with_placeholders(),
            Type::Error => {
                self.refine_unguided_arguments(call);
                return Expression::error(span);
            }
            _ => {
                self.refine_unguided_arguments(call);
                self.report(SemanticError::NotCallable, call.callee.span);
                return Expression::error(span);
            }
        };

        let mut bindings = HashMap::new();
        if let (Some(arguments), Some(syntax)) = (&type_arguments, &call.type_arguments) {
            if arguments.len() != function.type_params.len() {
                self.report(
                    SemanticError::TypeArgumentCount {
                        expected: function.type_params.len(),
                        actual: arguments.len(),
                    },
                    syntax.span,
                );
            }
            for (param, argument) in function.type_params.iter().zip(arguments) {
                bindings.insert(param.clone(), argument.clone());
            }
        }

        let (mut arguments, signature) = self.refine_guided_arguments(call, &function, &mut bindings);

        if signature.params.len() != arguments.len() {
            self.report(
                SemanticError::ArgumentCount {
                    expected: signature.params.len(),
                    actual: arguments.len(),
                },
                call.arguments_span,
            );
        }
        for (argument, expected) in arguments.iter().zip(&signature.params) {
            if !argument.ty.is_assignable_to(expected) {
                self.report(
                    SemanticError::ArgumentMismatch {
                        actual: argument.ty.clone(),
                        target: expected.clone(),
                    },
                    argument.span,
                );
            }
        }

        if type_arguments.is_none() {
            let mut unresolved = function
                .type_params
                .iter()
                .filter(|param| !bindings.contains_key(*param))
                .cloned()
                .collect::<Vec<_>>();
            match unresolved.len() {
                0 => {}
                1 => {
                    let param = unresolved.remove(0);
                    self.report(SemanticError::UninferredParameter(param), call.callee.span);
                }
                _ => self.report(SemanticError::UninferredParameters(unresolved), call.callee.span),
            }
        }

        settle_bindings(&mut bindings, &function.type_params);
        let settlement = Settlement::new(&bindings, &function.type_params);
        for argument in &mut arguments {
            settlement.settle_expression(argument);
        }
        let signature = FunctionType {
            type_params: Vec::new(),
            params: signature.params.iter().map(|param| settlement.apply(param)).collect(),
            return_type: Box::new(settlement.apply(&signature.return_type)),
        };

        let ty = (*signature.return_type).clone();
        Expression::new(
            ExpressionKind::Invoke(InvokeExpression {
                callee: Box::new(callee),
                arguments,
                signature,
            }),
            ty,
            span,
        )
    }

    /// Refines each argument against the parameter type known so far, and
    /// feeds what it learns back into the signature before the next one.
    fn refine_guided_arguments(
        &mut self,
        call: &ast::CallExpression,
        function: &FunctionType,
        bindings: &mut HashMap<TypeParam, Type>,
    ) -> (Vec<Expression>, FunctionType) {
        let expected_return = self.context.contextual_type().cloned();
        let mut signature = function.substitute(bindings);
        let mut arguments: Vec<Expression> = Vec::new();

        for syntax in call.arguments.iter().chain(call.trailing_lambda.as_deref()) {
            let expected = signature.params.get(arguments.len()).cloned();
            let argument = self.with_contextual_type(expected, |refiner| {
                refiner.refine_expression(syntax, ExpressionMode::STANDALONE)
            });
            arguments.push(argument);

            let argument_types = arguments.iter().map(|a| a.ty.clone()).collect::<Vec<_>>();
            extract_bindings(bindings, expected_return.as_ref(), &signature, &argument_types);
            signature = signature.substitute(bindings);
        }

        if arguments.is_empty() {
            extract_bindings(bindings, expected_return.as_ref(), &signature, &[]);
            signature = signature.substitute(bindings);
        }

        (arguments, signature)
    }

    fn refine_unguided_arguments(&mut self, call: &ast::CallExpression) {
        self.with_contextual_type(None, |refiner| {
            for argument in call.arguments.iter().chain(call.trailing_lambda.as_deref()) {
                refiner.refine_expression(argument, ExpressionMode::STANDALONE);
            }
        });
    }
}

/// Learns bindings for the placeholders of `signature` by matching its
/// parameters against the argument types and its return type against the
/// expected result. Earlier bindings always win.
fn extract_bindings(
    bindings: &mut HashMap<TypeParam, Type>,
    expected_return: Option<&Type>,
    signature: &FunctionType,
    arguments: &[Type],
) {
    for (param, argument) in signature.params.iter().zip(arguments) {
        bind(bindings, param, argument);
    }
    if let Some(expected) = expected_return {
        bind(bindings, &signature.return_type, expected);
    }
}

fn bind(bindings: &mut HashMap<TypeParam, Type>, param: &Type, argument: &Type) {
    match (param, argument) {
        (Type::Function(param), Type::Function(argument)) => {
            extract_bindings(bindings, Some(&argument.return_type), param, &argument.params);
        }
        (Type::Placeholder(param), Type::Placeholder(other)) if param == other => {}
        (Type::Placeholder(param), _) => {
            bindings
                .entry(param.clone())
                .or_insert_with(|| argument.clone());
        }
        _ => {}
    }
}

/// Resolves bindings that refer to other parameters of the same call, and
/// binds whatever is left to `Error`.
fn settle_bindings(bindings: &mut HashMap<TypeParam, Type>, own: &[TypeParam]) {
    for param in own {
        bindings.entry(param.clone()).or_insert(Type::Error);
    }
    for _ in 0..bindings.len() {
        let snapshot = bindings.clone();
        let mut changed = false;
        for value in bindings.values_mut() {
            let next = value.substitute(&snapshot);
            if next != *value {
                *value = next;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}
