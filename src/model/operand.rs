use crate::error::EditError;
use crate::registry::{Arity, Operator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal a condition compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
}

impl ConditionValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConditionValue::Number(n) => Some(*n),
            ConditionValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConditionValue::Text(s) => Some(s),
            ConditionValue::Number(_) => None,
        }
    }
}

impl From<f64> for ConditionValue {
    fn from(n: f64) -> Self {
        ConditionValue::Number(n)
    }
}

impl From<i32> for ConditionValue {
    fn from(n: i32) -> Self {
        ConditionValue::Number(f64::from(n))
    }
}

impl From<&str> for ConditionValue {
    fn from(s: &str) -> Self {
        ConditionValue::Text(s.to_string())
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            ConditionValue::Number(n) => write!(f, "{}", n),
            ConditionValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// The values a leaf carries, shaped by its operator's arity.
///
/// A single value may still be unset while the author is typing; the compiler rejects it.
/// A range always carries both bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Single(Option<ConditionValue>),
    Range(ConditionValue, ConditionValue),
}

impl Operand {
    pub fn single(value: impl Into<ConditionValue>) -> Self {
        Operand::Single(Some(value.into()))
    }

    pub fn range(low: impl Into<ConditionValue>, high: impl Into<ConditionValue>) -> Self {
        Operand::Range(low.into(), high.into())
    }

    /// Builds the operand for `operator` from loose `value`/`value2` parts, rejecting any
    /// combination that does not fit the operator's arity.
    pub fn from_parts(
        operator: Operator,
        value: Option<ConditionValue>,
        value2: Option<ConditionValue>,
    ) -> Result<Self, EditError> {
        let invalid = |reason: &str| EditError::InvalidArity {
            operator,
            expected: operator.arity(),
            reason: reason.to_string(),
        };
        match (operator.arity(), value, value2) {
            (Arity::None, None, None) => Ok(Operand::None),
            (Arity::None, _, _) => Err(invalid("this operator takes no value")),
            (Arity::One, _, Some(_)) => Err(invalid("value2 is only allowed for range operators")),
            (Arity::One, value, None) => Ok(Operand::Single(value)),
            (Arity::Two, Some(low), Some(high)) => Ok(Operand::Range(low, high)),
            (Arity::Two, _, _) => Err(invalid("range operators require both value and value2")),
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operand::None => Arity::None,
            Operand::Single(_) => Arity::One,
            Operand::Range(..) => Arity::Two,
        }
    }

    pub fn value(&self) -> Option<&ConditionValue> {
        match self {
            Operand::None => None,
            Operand::Single(value) => value.as_ref(),
            Operand::Range(low, _) => Some(low),
        }
    }

    pub fn value2(&self) -> Option<&ConditionValue> {
        match self {
            Operand::Range(_, high) => Some(high),
            _ => None,
        }
    }

    /// Every value the operator needs is present.
    pub fn is_complete(&self) -> bool {
        !matches!(self, Operand::Single(None))
    }

    pub fn values(&self) -> impl Iterator<Item = &ConditionValue> {
        self.value().into_iter().chain(self.value2())
    }
}
