use crate::ast::{self, UnaryOperator};
use crate::typed::{BinaryOperator, LogicalOperator};

use super::types::{RecordId, Type};

/// An operator from the syntax tree, split by how it is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedOperator {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

pub(crate) fn resolve_operator(operator: ast::BinaryOperator) -> ResolvedOperator {
    use ast::BinaryOperator as Syntax;
    match operator {
        Syntax::Add => ResolvedOperator::Binary(BinaryOperator::Addition),
        Syntax::Subtract => ResolvedOperator::Binary(BinaryOperator::Subtraction),
        Syntax::Multiply => ResolvedOperator::Binary(BinaryOperator::Multiplication),
        Syntax::Divide => ResolvedOperator::Binary(BinaryOperator::Division),
        Syntax::Modulo => ResolvedOperator::Binary(BinaryOperator::Modulo),
        Syntax::Equal => ResolvedOperator::Binary(BinaryOperator::Equal),
        Syntax::NotEqual => ResolvedOperator::Binary(BinaryOperator::NotEqual),
        Syntax::Less => ResolvedOperator::Binary(BinaryOperator::LessThan),
        Syntax::LessEqual => ResolvedOperator::Binary(BinaryOperator::LessThanOrEqual),
        Syntax::Greater => ResolvedOperator::Binary(BinaryOperator::GreaterThan),
        Syntax::GreaterEqual => ResolvedOperator::Binary(BinaryOperator::GreaterThanOrEqual),
        Syntax::And => ResolvedOperator::Logical(LogicalOperator::Conjunction),
        Syntax::Or => ResolvedOperator::Logical(LogicalOperator::Disjunction),
    }
}

fn both(left: &Type, right: &Type, id: RecordId) -> bool {
    left.is_record(id) && right.is_record(id)
}

pub(crate) fn binary_operation_type(left: &Type, operator: BinaryOperator, right: &Type) -> Option<Type> {
    use BinaryOperator::*;
    match operator {
        Equal | NotEqual => (left == right).then(Type::boolean),
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            (both(left, right, RecordId::INT) || both(left, right, RecordId::FLOAT))
                .then(Type::boolean)
        }
        Subtraction | Multiplication | Division | Modulo => {
            if both(left, right, RecordId::INT) {
                Some(Type::int())
            } else if both(left, right, RecordId::FLOAT) {
                Some(Type::float())
            } else {
                None
            }
        }
        Addition => {
            if both(left, right, RecordId::INT) {
                Some(Type::int())
            } else if both(left, right, RecordId::FLOAT) {
                Some(Type::float())
            } else if both(left, right, RecordId::STRING) {
                Some(Type::string())
            } else {
                None
            }
        }
    }
}

pub(crate) fn logical_operation_type(left: &Type, right: &Type) -> Option<Type> {
    both(left, right, RecordId::BOOLEAN).then(Type::boolean)
}

pub(crate) fn unary_operation_type(operator: UnaryOperator, operand: &Type) -> Option<Type> {
    match operator {
        UnaryOperator::Positive | UnaryOperator::Negative => {
            if operand.is_record(RecordId::INT) {
                Some(Type::int())
            } else if operand.is_record(RecordId::FLOAT) {
                Some(Type::float())
            } else {
                None
            }
        }
        UnaryOperator::Not => operand.is_record(RecordId::BOOLEAN).then(Type::boolean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_does_not_widen() {
        let add = BinaryOperator::Addition;
        assert_eq!(binary_operation_type(&Type::int(), add, &Type::int()), Some(Type::int()));
        assert_eq!(binary_operation_type(&Type::int(), add, &Type::float()), None);
        assert_eq!(
            binary_operation_type(&Type::string(), add, &Type::string()),
            Some(Type::string())
        );
        assert_eq!(
            binary_operation_type(&Type::string(), BinaryOperator::Subtraction, &Type::string()),
            None
        );
    }

    #[test]
    fn equality_needs_identical_types() {
        let eq = BinaryOperator::Equal;
        assert_eq!(
            binary_operation_type(&Type::boolean(), eq, &Type::boolean()),
            Some(Type::boolean())
        );
        assert_eq!(binary_operation_type(&Type::int(), eq, &Type::string()), None);
    }

    #[test]
    fn comparisons_are_numeric_only() {
        let less = BinaryOperator::LessThan;
        assert_eq!(
            binary_operation_type(&Type::float(), less, &Type::float()),
            Some(Type::boolean())
        );
        assert_eq!(binary_operation_type(&Type::string(), less, &Type::string()), None);
    }

    #[test]
    fn unary_operators() {
        assert_eq!(unary_operation_type(UnaryOperator::Negative, &Type::float()), Some(Type::float()));
        assert_eq!(unary_operation_type(UnaryOperator::Not, &Type::int()), None);
        assert_eq!(logical_operation_type(&Type::boolean(), &Type::int()), None);
    }
}
