use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    None,
    One,
    Two,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::None => write!(f, "no"),
            Arity::One => write!(f, "one"),
            Arity::Two => write!(f, "two"),
        }
    }
}

/// Master macro defining every condition operator with its wire name, arity and label.
macro_rules! define_operators {
    ( $( ($variant:ident, $name:literal, $arity:ident, $label:literal) ),* $(,)? ) => {
        /// A condition operator. The wire name is the `snake_case` string used in compiled hooks.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Operator {
            $( #[serde(rename = $name)] $variant, )*
        }

        impl Operator {
            pub const ALL: &'static [Operator] = &[ $( Operator::$variant, )* ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Operator::$variant => $name, )*
                }
            }

            pub fn arity(&self) -> Arity {
                match self {
                    $( Operator::$variant => Arity::$arity, )*
                }
            }

            /// Human-readable label shown in the editor.
            pub fn label(&self) -> &'static str {
                match self {
                    $( Operator::$variant => $label, )*
                }
            }
        }

        impl FromStr for Operator {
            type Err = RegistryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(Operator::$variant), )*
                    _ => Err(RegistryError::UnknownOperator(s.to_string())),
                }
            }
        }
    };
}

define_operators! {
    // Numeric comparison
    (Gt, "gt", One, "greater than"),
    (Gte, "gte", One, "greater than or equal to"),
    (Lt, "lt", One, "less than"),
    (Lte, "lte", One, "less than or equal to"),
    (Eq, "eq", One, "equal to"),
    (Neq, "neq", One, "not equal to"),
    (Between, "between", Two, "between"),
    (NotBetween, "not_between", Two, "not between"),

    // Threshold and data-presence checks
    (Abnormal, "abnormal", None, "is abnormal"),
    (Critical, "critical", None, "is critical"),
    (CriticalHigh, "critical_high", None, "is critically high"),
    (CriticalLow, "critical_low", None, "is critically low"),
    (TrendingUp, "trending_up", None, "is trending up"),
    (TrendingDown, "trending_down", None, "is trending down"),
    (Missing, "missing", None, "has no recent result"),
    (Exists, "exists", None, "has a recent result"),

    // Medical conditions
    (Has, "has", None, "has"),
    (NotHas, "not_has", None, "does not have"),
    (Active, "active", None, "is active"),
    (Resolved, "resolved", None, "is resolved"),
    (Inactive, "inactive", None, "is inactive"),
    (NewDiagnosis, "new_diagnosis", None, "was newly diagnosed"),
    (Chronic, "chronic", None, "is chronic"),
    (Acute, "acute", None, "is acute"),

    // Medications
    (Taking, "taking", None, "is taking"),
    (NotTaking, "not_taking", None, "is not taking"),
    (NewStart, "new_start", None, "recently started"),
    (Discontinued, "discontinued", None, "discontinued"),
}

impl Operator {
    pub fn is_trend(&self) -> bool {
        matches!(self, Operator::TrendingUp | Operator::TrendingDown)
    }

    /// Operators that are meaningless without a lookback window.
    pub fn requires_timeframe(&self) -> bool {
        matches!(self, Operator::NewDiagnosis | Operator::NewStart)
    }

    pub fn is_range(&self) -> bool {
        self.arity() == Arity::Two
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the value count consumed by `operator`.
pub fn arity_of(operator: Operator) -> Arity {
    operator.arity()
}

pub(crate) const NUMERIC_COMPARISON: &[Operator] = &[
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::Eq,
    Operator::Between,
    Operator::NotBetween,
];

pub(crate) const TEXT_COMPARISON: &[Operator] = &[Operator::Eq, Operator::Neq];

pub(crate) const CONDITION_OPERATORS: &[Operator] = &[
    Operator::Has,
    Operator::NotHas,
    Operator::Active,
    Operator::Resolved,
    Operator::Inactive,
    Operator::NewDiagnosis,
    Operator::Chronic,
    Operator::Acute,
];

pub(crate) const MEDICATION_OPERATORS: &[Operator] = &[
    Operator::Taking,
    Operator::NotTaking,
    Operator::NewStart,
    Operator::Discontinued,
];
