//! Constructors for predicate trees, mirroring the vocabulary of the query builder that produces them.

use crate::ast::{ComparisonOperator, LogicalOperator, NullOperator, Operand, Predicate};
use crate::value::Value;

pub fn compare(column: impl Into<String>, operator: ComparisonOperator, value: impl Into<Value>) -> Predicate {
    Predicate::Comparison { column: column.into(), operator, operand: Operand::Value(value.into()) }
}

/// Compare two columns. The right side is rendered as an identifier, never bound.
pub fn compare_columns(column: impl Into<String>, operator: ComparisonOperator, other: impl Into<String>) -> Predicate {
    Predicate::Comparison { column: column.into(), operator, operand: Operand::Column(other.into()) }
}

pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Predicate { compare(column, ComparisonOperator::Eq, value) }

pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Predicate { compare(column, ComparisonOperator::Ne, value) }

pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Predicate { compare(column, ComparisonOperator::Gt, value) }

pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Predicate { compare(column, ComparisonOperator::Gte, value) }

pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Predicate { compare(column, ComparisonOperator::Lt, value) }

pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Predicate { compare(column, ComparisonOperator::Lte, value) }

pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Predicate {
    compare(column, ComparisonOperator::Like, Value::String(pattern.into()))
}

pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Predicate {
    compare(column, ComparisonOperator::ILike, Value::String(pattern.into()))
}

pub fn eq_column(column: impl Into<String>, other: impl Into<String>) -> Predicate {
    compare_columns(column, ComparisonOperator::Eq, other)
}

pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Predicate::Comparison {
        column: column.into(),
        operator: ComparisonOperator::In,
        operand: Operand::List(values.into_iter().map(Into::into).collect()),
    }
}

pub fn not_in<I, V>(column: impl Into<String>, values: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Predicate::Comparison {
        column: column.into(),
        operator: ComparisonOperator::NotIn,
        operand: Operand::List(values.into_iter().map(Into::into).collect()),
    }
}

pub fn between(column: impl Into<String>, lower: impl Into<Value>, upper: impl Into<Value>) -> Predicate {
    Predicate::Between { column: column.into(), lower: lower.into(), upper: upper.into() }
}

pub fn is_null(column: impl Into<String>) -> Predicate { Predicate::Null { column: column.into(), operator: NullOperator::IsNull } }

pub fn is_not_null(column: impl Into<String>) -> Predicate { Predicate::Null { column: column.into(), operator: NullOperator::IsNotNull } }

pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::Logical { operator: LogicalOperator::And, predicates: predicates.into_iter().collect() }
}

pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::Logical { operator: LogicalOperator::Or, predicates: predicates.into_iter().collect() }
}
