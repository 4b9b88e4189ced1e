//! Semantic analysis: turns the raw syntax tree into a typed [`Program`].
//!
//! The refiner resolves names through nested lexical scopes, propagates
//! expected types into sub-expressions, infers the type arguments of generic
//! calls, and checks that every path through a function returns. Problems are
//! reported as diagnostics and the offending node is typed as `Error`, so a
//! single pass surfaces every problem in the program.

mod builtins;
mod context;
mod errors;
mod expression;
mod invoke;
mod operators;
mod return_paths;
mod statement;
pub mod types;

use crate::ast::{Module, SourceSpan};
use crate::diagnostics::Diagnostics;
use crate::typed::Program;

use context::{ControlScope, RefinerContext};
pub use errors::SemanticError;
use types::Type;

pub struct Refiner {
    context: RefinerContext,
    diagnostics: Diagnostics,
}

impl Default for Refiner {
    fn default() -> Self {
        Self::new()
    }
}

impl Refiner {
    pub fn new() -> Self {
        Self {
            context: RefinerContext::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn refine_module(&mut self, module: &Module) -> Program {
        builtins::install(&mut self.context);

        // Builtins live one scope out, so programs may shadow them.
        let statements = self.scoped(|refiner| {
            module
                .statements
                .iter()
                .map(|statement| refiner.refine_statement(statement))
                .collect::<Vec<_>>()
        });
        self.check_return_paths(&statements, &Type::unit());

        Program {
            statements,
            records: self.context.records().to_vec(),
        }
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn report(&mut self, error: SemanticError, span: SourceSpan) {
        self.diagnostics.push_error_with_span(error.to_string(), span);
    }

    fn scoped<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> T {
        self.context.push_scope();
        let result = body(self);
        self.context.pop_scope();
        result
    }

    fn with_contextual_type<T>(&mut self, ty: Option<Type>, body: impl FnOnce(&mut Self) -> T) -> T {
        self.context.push_contextual_type(ty);
        let result = body(self);
        self.context.pop_contextual_type();
        result
    }

    /// Runs `body` inside `scope` and hands back the type it collected.
    fn with_control_scope<T>(
        &mut self,
        scope: ControlScope,
        body: impl FnOnce(&mut Self) -> T,
    ) -> (T, Option<Type>) {
        self.context.push_control_scope(scope);
        let result = body(self);
        let collected = match self.context.pop_control_scope() {
            Some(ControlScope::Function { return_type }) => return_type,
            Some(ControlScope::If { yielded_type }) => yielded_type,
            Some(ControlScope::Loop) | None => None,
        };
        (result, collected)
    }
}
