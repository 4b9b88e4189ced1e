use std::collections::HashMap;
use std::rc::Rc;

use super::types::{Definition, Field, RecordDeclaration, RecordId, RecordType, Type, TypeParam};

/// Where the refiner currently stands with respect to functions, loops and
/// `if` branches.
#[derive(Debug, Clone)]
pub(crate) enum ControlScope {
    /// Inside a function literal; collects the inferred return type.
    Function { return_type: Option<Type> },
    Loop,
    /// Inside the branches of an `if`; collects the yielded type.
    If { yielded_type: Option<Type> },
}

impl ControlScope {
    pub(crate) fn function(return_type: Option<Type>) -> Self {
        ControlScope::Function { return_type }
    }

    pub(crate) fn branches(yielded_type: Option<Type>) -> Self {
        ControlScope::If { yielded_type }
    }

    /// `break` and `continue` never see past a function boundary.
    fn is_terminal(&self) -> bool {
        matches!(self, ControlScope::Function { .. })
    }
}

/// Records an inferred type. A settled type is never replaced; one that still
/// holds placeholders gives way to the next write.
pub(crate) fn refine_sink(sink: &mut Option<Type>, ty: Type) {
    let replaceable = match sink {
        None => true,
        Some(current) => current.has_placeholders(),
    };
    if replaceable {
        *sink = Some(ty);
    }
}

/// Lexical scopes, contextual types and control scopes for one refinement.
#[derive(Debug)]
pub(crate) struct RefinerContext {
    definitions: Vec<HashMap<String, Rc<Definition>>>,
    types: Vec<HashMap<String, Type>>,
    contextual_types: Vec<Option<Type>>,
    control_scopes: Vec<ControlScope>,
    records: Vec<RecordDeclaration>,
    next_type_param: usize,
}

impl RefinerContext {
    pub(crate) fn new() -> Self {
        let records = RecordId::BUILTINS
            .iter()
            .map(|(id, name)| RecordDeclaration {
                id: *id,
                name: Rc::from(*name),
                type_params: Vec::new(),
                fields: None,
            })
            .collect();

        Self {
            definitions: vec![HashMap::new()],
            types: vec![HashMap::new()],
            contextual_types: Vec::new(),
            control_scopes: Vec::new(),
            records,
            next_type_param: 0,
        }
    }

    pub(crate) fn push_scope(&mut self) {
        self.definitions.push(HashMap::new());
        self.types.push(HashMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.definitions.pop();
        self.types.pop();
    }

    pub(crate) fn put_definition(&mut self, definition: Rc<Definition>) {
        if let Some(scope) = self.definitions.last_mut() {
            scope.insert(definition.name.clone(), definition);
        }
    }

    pub(crate) fn put_type(&mut self, name: &str, ty: Type) {
        if let Some(scope) = self.types.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    /// Only looks at the innermost scope.
    pub(crate) fn has_definition(&self, name: &str) -> bool {
        self.definitions
            .last()
            .is_some_and(|scope| scope.contains_key(name))
    }

    pub(crate) fn get_definition(&self, name: &str) -> Option<Rc<Definition>> {
        self.definitions
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    pub(crate) fn get_type(&self, name: &str) -> Option<Type> {
        self.types
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    pub(crate) fn push_contextual_type(&mut self, ty: Option<Type>) {
        self.contextual_types.push(ty);
    }

    pub(crate) fn pop_contextual_type(&mut self) {
        self.contextual_types.pop();
    }

    pub(crate) fn contextual_type(&self) -> Option<&Type> {
        self.contextual_types.last()?.as_ref()
    }

    pub(crate) fn push_control_scope(&mut self, scope: ControlScope) {
        self.control_scopes.push(scope);
    }

    pub(crate) fn pop_control_scope(&mut self) -> Option<ControlScope> {
        self.control_scopes.pop()
    }

    pub(crate) fn nearest_control_scope_mut(&mut self) -> Option<&mut ControlScope> {
        self.control_scopes.last_mut()
    }

    pub(crate) fn enclosing_function_mut(&mut self) -> Option<&mut Option<Type>> {
        self.control_scopes
            .iter_mut()
            .rev()
            .find_map(|scope| match scope {
                ControlScope::Function { return_type } => Some(return_type),
                _ => None,
            })
    }

    pub(crate) fn is_inside_loop(&self) -> bool {
        for scope in self.control_scopes.iter().rev() {
            if matches!(scope, ControlScope::Loop) {
                return true;
            }
            if scope.is_terminal() {
                return false;
            }
        }
        false
    }

    pub(crate) fn fresh_type_param(&mut self, name: &str) -> TypeParam {
        let id = self.next_type_param;
        self.next_type_param += 1;
        TypeParam {
            id,
            name: Rc::from(name),
        }
    }

    pub(crate) fn declare_record(&mut self, name: &str, type_params: Vec<TypeParam>) -> RecordType {
        let declaration = RecordDeclaration {
            id: RecordId(self.records.len()),
            name: Rc::from(name),
            type_params,
            fields: None,
        };
        let declared = declaration.declared_type();
        self.records.push(declaration);
        declared
    }

    pub(crate) fn set_record_fields(&mut self, id: RecordId, fields: Option<Vec<Field>>) {
        if let Some(record) = self.records.get_mut(id.0) {
            record.fields = fields;
        }
    }

    pub(crate) fn record(&self, id: RecordId) -> Option<&RecordDeclaration> {
        self.records.get(id.0)
    }

    pub(crate) fn records(&self) -> &[RecordDeclaration] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scopes_shadow_and_restore() {
        let mut context = RefinerContext::new();
        context.put_definition(Rc::new(Definition::new("x", Type::int(), true)));
        context.push_scope();
        assert!(!context.has_definition("x"));
        context.put_definition(Rc::new(Definition::new("x", Type::string(), true)));
        assert_eq!(context.get_definition("x").map(|d| d.ty.clone()), Some(Type::string()));
        context.pop_scope();
        assert_eq!(context.get_definition("x").map(|d| d.ty.clone()), Some(Type::int()));
    }

    #[test]
    fn loops_are_not_visible_across_functions() {
        let mut context = RefinerContext::new();
        context.push_control_scope(ControlScope::Loop);
        context.push_control_scope(ControlScope::branches(None));
        assert!(context.is_inside_loop());
        context.push_control_scope(ControlScope::function(None));
        assert!(!context.is_inside_loop());
    }

    #[test]
    fn settled_sinks_keep_their_first_type() {
        let mut sink = None;
        refine_sink(&mut sink, Type::int());
        refine_sink(&mut sink, Type::string());
        assert_eq!(sink, Some(Type::int()));

        let param = RefinerContext::new().fresh_type_param("T");
        let mut pending = Some(Type::Placeholder(param));
        refine_sink(&mut pending, Type::boolean());
        assert_eq!(pending, Some(Type::boolean()));
    }

    #[test]
    fn sinks_record_nothing_like_any_other_type() {
        let mut sink = None;
        refine_sink(&mut sink, Type::nothing());
        refine_sink(&mut sink, Type::int());
        assert_eq!(sink, Some(Type::nothing()));
    }
}
