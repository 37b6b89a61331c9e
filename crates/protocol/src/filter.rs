//! Server-side filter expressions for list endpoints.
//!
//! Rendered as `field:operator:value` with the value percent-encoded, so
//! the expression can be appended to a query string verbatim.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left as-is in filter values (RFC 3986 unreserved set).
const FILTER_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Filter query operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Equals.
    Eq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Contains the specified string.
    Has,
    /// Any of a list (tags).
    In,
}

impl FilterOperator {
    /// Operator token used inside an expression.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Has => "has",
            Self::In => "in",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable `field:operator:value` filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterExpression {
    field: String,
    operator: FilterOperator,
    value: String,
}

impl FilterExpression {
    pub fn new(field: &str, operator: FilterOperator, value: &str) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value: value.to_string(),
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: &str, value: &str) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// URL-safe expression for the `filter` query parameter.
    pub fn expression(&self) -> String {
        format!(
            "{}:{}:{}",
            self.field,
            self.operator,
            utf8_percent_encode(&self.value, FILTER_VALUE)
        )
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression())
    }
}
