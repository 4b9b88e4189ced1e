use std::rc::Rc;

use super::context::RefinerContext;
use super::types::{Definition, FunctionType, RecordId, Type};

/// Declares the builtin types and functions in the current scope.
pub(crate) fn install(context: &mut RefinerContext) {
    for (id, name) in RecordId::BUILTINS {
        context.put_type(name, Type::builtin(id));
    }

    let println = generic_function(context, |param| (vec![param], Type::unit()));
    context.put_definition(Rc::new(Definition::new("println", println, true)));

    let exit = Type::function(vec![Type::int()], Type::nothing());
    context.put_definition(Rc::new(Definition::new("exit", exit, true)));

    let type_name = generic_function(context, |param| (vec![param], Type::string()));
    context.put_definition(Rc::new(Definition::new("type_name", type_name, true)));
}

/// A function generic over a single fresh parameter `T`.
fn generic_function(
    context: &mut RefinerContext,
    signature: impl FnOnce(Type) -> (Vec<Type>, Type),
) -> Type {
    let param = context.fresh_type_param("T");
    let (params, return_type) = signature(Type::Param(param.clone()));
    Type::Function(FunctionType {
        type_params: vec![param],
        params,
        return_type: Box::new(return_type),
    })
}
