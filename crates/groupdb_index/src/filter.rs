//! Query filters handed to the range iterator.

use groupdb_codec::Value;

/// Reserved property name that filters on the entity key itself.
pub const KEY_PROPERTY: &str = "__key__";

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// `property == value`
    Equal,
    /// `property < value`
    LessThan,
    /// `property <= value`
    LessThanOrEqual,
    /// `property > value`
    GreaterThan,
    /// `property >= value`
    GreaterThanOrEqual,
}

/// One `property op value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Property name.
    pub property: String,
    /// Operator.
    pub op: FilterOp,
    /// Operand.
    pub value: Value,
}

impl Condition {
    /// Creates a condition.
    pub fn new(property: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            op,
            value: value.into(),
        }
    }
}

/// A conjunction of conditions over one kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyFilter {
    /// Conditions, all of which must hold.
    pub conditions: Vec<Condition>,
}

impl PropertyFilter {
    /// Creates a filter from its conditions.
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Creates a single equality filter.
    pub fn equal(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(vec![Condition::new(property, FilterOp::Equal, value)])
    }

    /// Adds a condition.
    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Returns the only condition if this filter is a single equality on a
    /// regular property.
    pub fn as_single_equality(&self) -> Option<&Condition> {
        match self.conditions.as_slice() {
            [only] if only.op == FilterOp::Equal && only.property != KEY_PROPERTY => Some(only),
            _ => None,
        }
    }
}
