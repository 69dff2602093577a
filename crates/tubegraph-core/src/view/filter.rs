//! Row predicates for the filter stage and for bulk store operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::view::path::lookup;

/// Predicate over a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Matches every row
    All,
    /// Field equals the value; an array field matches when it contains the value
    Eq(String, Value),
    /// Field equals one of the values
    In(String, Vec<Value>),
    /// Case-insensitive substring match over any of the fields
    Contains {
        /// Text fields searched
        fields: Vec<String>,
        /// Needle, compared lowercase
        needle: String,
    },
    /// All of the predicates hold
    And(Vec<Filter>),
    /// Any of the predicates holds
    Or(Vec<Filter>),
}

impl Filter {
    /// Equality on a field
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// Membership on a field
    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Free-text filter: case-insensitive substring over the given fields
    pub fn text(needle: &str, fields: &[&str]) -> Self {
        Filter::Contains {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            needle: needle.to_lowercase(),
        }
    }

    /// Conjunction that flattens nested `And` and drops `All`
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Disjunction that flattens nested `Or`; `All` absorbs the other side
    pub fn or(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, _) | (_, Filter::All) => Filter::All,
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), f) => {
                left.push(f);
                Filter::Or(left)
            }
            (f, Filter::Or(mut right)) => {
                right.insert(0, f);
                Filter::Or(right)
            }
            (a, b) => Filter::Or(vec![a, b]),
        }
    }

    /// Evaluate against a row
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, expected) => match lookup(row, field) {
                Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
                Some(actual) => actual == expected,
                None => expected.is_null(),
            },
            Filter::In(field, values) => lookup(row, field).is_some_and(|actual| values.contains(actual)),
            Filter::Contains { fields, needle } => fields.iter().any(|field| {
                lookup(row, field)
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.to_lowercase().contains(needle.as_str()))
            }),
            Filter::And(filters) => filters.iter().all(|f| f.matches(row)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}
