use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A generic parameter introduced by a definition. Two parameters are the
/// same only when they come from the same declaration, whatever their names.
#[derive(Debug, Clone)]
pub struct TypeParam {
    pub id: usize,
    pub name: Rc<str>,
}

impl PartialEq for TypeParam {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeParam {}

impl Hash for TypeParam {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Index of a record declaration in the program's record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(pub usize);

impl RecordId {
    pub const UNIT: RecordId = RecordId(0);
    pub const NOTHING: RecordId = RecordId(1);
    pub const BOOLEAN: RecordId = RecordId(2);
    pub const STRING: RecordId = RecordId(3);
    pub const FLOAT: RecordId = RecordId(4);
    pub const INT: RecordId = RecordId(5);

    pub(crate) const BUILTINS: [(RecordId, &'static str); 6] = [
        (RecordId::UNIT, "Unit"),
        (RecordId::NOTHING, "Nothing"),
        (RecordId::BOOLEAN, "Boolean"),
        (RecordId::STRING, "String"),
        (RecordId::FLOAT, "Float"),
        (RecordId::INT, "Int"),
    ];
}

/// A nominal record type. `arguments` holds one entry per declared type
/// parameter; an unapplied generic record carries its own parameters there.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub id: RecordId,
    pub name: Rc<str>,
    pub arguments: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Type>,
    pub return_type: Box<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Record(RecordType),
    Function(FunctionType),
    Param(TypeParam),
    /// Call-site stand-in for a type parameter that is still being inferred.
    Placeholder(TypeParam),
    Error,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// Everything known about a declared record. Fields are `None` for unit-like
/// records, whose declaration is also their only value.
#[derive(Debug, Clone)]
pub struct RecordDeclaration {
    pub id: RecordId,
    pub name: Rc<str>,
    pub type_params: Vec<TypeParam>,
    pub fields: Option<Vec<Field>>,
}

impl RecordDeclaration {
    /// The declared type, applied to its own parameters.
    pub fn declared_type(&self) -> RecordType {
        RecordType {
            id: self.id,
            name: self.name.clone(),
            arguments: self.type_params.iter().cloned().map(Type::Param).collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.as_ref()?.iter().find(|field| field.name == name)
    }
}

/// A named value binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub ty: Type,
    pub readonly: bool,
}

impl Definition {
    pub fn new(name: impl Into<String>, ty: Type, readonly: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            readonly,
        }
    }
}

impl Type {
    pub(crate) fn builtin(id: RecordId) -> Type {
        let name = RecordId::BUILTINS[id.0].1;
        Type::Record(RecordType {
            id,
            name: Rc::from(name),
            arguments: Vec::new(),
        })
    }

    pub fn unit() -> Type {
        Type::builtin(RecordId::UNIT)
    }

    pub fn nothing() -> Type {
        Type::builtin(RecordId::NOTHING)
    }

    pub fn boolean() -> Type {
        Type::builtin(RecordId::BOOLEAN)
    }

    pub fn string() -> Type {
        Type::builtin(RecordId::STRING)
    }

    pub fn float() -> Type {
        Type::builtin(RecordId::FLOAT)
    }

    pub fn int() -> Type {
        Type::builtin(RecordId::INT)
    }

    pub fn function(params: Vec<Type>, return_type: Type) -> Type {
        Type::Function(FunctionType {
            type_params: Vec::new(),
            params,
            return_type: Box::new(return_type),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_record(&self, id: RecordId) -> bool {
        matches!(self, Type::Record(record) if record.id == id)
    }

    pub fn is_nothing(&self) -> bool {
        self.is_record(RecordId::NOTHING)
    }

    pub fn is_generic_function(&self) -> bool {
        matches!(self, Type::Function(function) if !function.type_params.is_empty())
    }

    /// Whether a value of type `self` may be used where `target` is expected.
    ///
    /// `Error` and placeholders are compatible with everything so a single
    /// failure does not cascade, and `Nothing` is the bottom type.
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        if self.is_error() || target.is_error() || self.is_nothing() {
            return true;
        }
        if matches!(self, Type::Placeholder(_)) || matches!(target, Type::Placeholder(_)) {
            return true;
        }

        match (self, target) {
            (Type::Record(source), Type::Record(target)) => source.name == target.name,
            (Type::Function(source), Type::Function(target)) => {
                source.params.len() == target.params.len()
                    && target
                        .params
                        .iter()
                        .zip(&source.params)
                        .all(|(expected, accepted)| expected.is_assignable_to(accepted))
                    && source.return_type.is_assignable_to(&target.return_type)
            }
            (Type::Param(source), Type::Param(target)) => source == target,
            _ => false,
        }
    }

    pub fn has_placeholders(&self) -> bool {
        match self {
            Type::Placeholder(_) => true,
            Type::Record(record) => record.arguments.iter().any(Type::has_placeholders),
            Type::Function(function) => function.has_placeholders(),
            Type::Param(_) | Type::Error => false,
        }
    }

    /// Replaces every bound placeholder with its binding. Unbound placeholders
    /// are left in place.
    pub fn substitute(&self, bindings: &HashMap<TypeParam, Type>) -> Type {
        match self {
            Type::Placeholder(param) => match bindings.get(param) {
                Some(bound) => bound.clone(),
                None => self.clone(),
            },
            Type::Record(record) => Type::Record(RecordType {
                id: record.id,
                name: record.name.clone(),
                arguments: record
                    .arguments
                    .iter()
                    .map(|argument| argument.substitute(bindings))
                    .collect(),
            }),
            Type::Function(function) => Type::Function(function.substitute(bindings)),
            Type::Param(_) | Type::Error => self.clone(),
        }
    }

    /// Replaces occurrences of the given parameters, bare or already wrapped
    /// in a placeholder, with `replacement(param)`.
    fn map_params(&self, params: &[TypeParam], replacement: &dyn Fn(&TypeParam) -> Type) -> Type {
        match self {
            Type::Param(param) | Type::Placeholder(param) if params.contains(param) => {
                replacement(param)
            }
            Type::Record(record) => Type::Record(RecordType {
                id: record.id,
                name: record.name.clone(),
                arguments: record
                    .arguments
                    .iter()
                    .map(|argument| argument.map_params(params, replacement))
                    .collect(),
            }),
            Type::Function(function) => Type::Function(FunctionType {
                type_params: function.type_params.clone(),
                params: function
                    .params
                    .iter()
                    .map(|param| param.map_params(params, replacement))
                    .collect(),
                return_type: Box::new(function.return_type.map_params(params, replacement)),
            }),
            _ => self.clone(),
        }
    }

    /// Substitutes declared parameters with concrete types, as when reading a
    /// field of an applied generic record.
    pub fn instantiate(&self, params: &[TypeParam], arguments: &[Type]) -> Type {
        self.map_params(params, &|param| {
            params
                .iter()
                .position(|candidate| candidate == param)
                .and_then(|index| arguments.get(index))
                .cloned()
                .unwrap_or(Type::Error)
        })
    }

    /// Turns the placeholders of `params` that survived inference into `Error`.
    pub fn erase_placeholders_of(&self, params: &[TypeParam]) -> Type {
        match self {
            Type::Placeholder(param) if params.contains(param) => Type::Error,
            Type::Placeholder(_) | Type::Param(_) | Type::Error => self.clone(),
            Type::Record(record) => Type::Record(RecordType {
                id: record.id,
                name: record.name.clone(),
                arguments: record
                    .arguments
                    .iter()
                    .map(|argument| argument.erase_placeholders_of(params))
                    .collect(),
            }),
            Type::Function(function) => Type::Function(FunctionType {
                type_params: function.type_params.clone(),
                params: function
                    .params
                    .iter()
                    .map(|param| param.erase_placeholders_of(params))
                    .collect(),
                return_type: Box::new(function.return_type.erase_placeholders_of(params)),
            }),
        }
    }
}

impl FunctionType {
    /// A working copy of this signature in which each of its own type
    /// parameters is replaced by a placeholder. Non-generic signatures are
    /// returned unchanged.
    pub fn with_placeholders(&self) -> FunctionType {
        if self.type_params.is_empty() {
            return self.clone();
        }
        let own = &self.type_params;
        let placeholder = |param: &TypeParam| Type::Placeholder(param.clone());
        FunctionType {
            type_params: own.clone(),
            params: self
                .params
                .iter()
                .map(|param| param.map_params(own, &placeholder))
                .collect(),
            return_type: Box::new(self.return_type.map_params(own, &placeholder)),
        }
    }

    pub fn substitute(&self, bindings: &HashMap<TypeParam, Type>) -> FunctionType {
        FunctionType {
            type_params: self.type_params.clone(),
            params: self
                .params
                .iter()
                .map(|param| param.substitute(bindings))
                .collect(),
            return_type: Box::new(self.return_type.substitute(bindings)),
        }
    }

    pub fn has_placeholders(&self) -> bool {
        self.params.iter().any(Type::has_placeholders) || self.return_type.has_placeholders()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Record(record) => {
                f.write_str(&record.name)?;
                if !record.arguments.is_empty() {
                    let arguments = record
                        .arguments
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, "[{arguments}]")?;
                }
                Ok(())
            }
            Type::Function(function) => {
                let params = function
                    .params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({params}) -> {}", function.return_type)
            }
            Type::Param(param) => write!(f, "{param}"),
            Type::Placeholder(_) | Type::Error => f.write_str("???"),
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Type::Function(self.clone()), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(id: usize, name: &str) -> TypeParam {
        TypeParam {
            id,
            name: Rc::from(name),
        }
    }

    #[test]
    fn type_params_compare_by_identity() {
        assert_eq!(param(1, "T"), param(1, "U"));
        assert_ne!(param(1, "T"), param(2, "T"));
    }

    #[test]
    fn placeholders_only_replace_own_parameters() {
        let own = param(1, "T");
        let outer = param(2, "U");
        let function = FunctionType {
            type_params: vec![own.clone()],
            params: vec![Type::Param(own.clone()), Type::Param(outer.clone())],
            return_type: Box::new(Type::Param(own.clone())),
        };

        let working = function.with_placeholders();
        assert_eq!(working.params[0], Type::Placeholder(own.clone()));
        assert_eq!(working.params[1], Type::Param(outer));
        assert_eq!(*working.return_type, Type::Placeholder(own.clone()));

        let mut bindings = HashMap::new();
        bindings.insert(own, Type::int());
        let settled = working.substitute(&bindings);
        assert_eq!(*settled.return_type, Type::int());
        assert!(!settled.has_placeholders());
    }

    #[test]
    fn display_matches_source_syntax() {
        let boxed = Type::Record(RecordType {
            id: RecordId(6),
            name: Rc::from("Box"),
            arguments: vec![Type::int()],
        });
        let function = Type::function(vec![boxed, Type::string()], Type::unit());
        assert_eq!(function.to_string(), "(Box[Int], String) -> Unit");
        assert_eq!(Type::Placeholder(param(0, "T")).to_string(), "???");
        assert_eq!(Type::Param(param(0, "T")).to_string(), "T");
    }
}
