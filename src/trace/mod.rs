use crate::model::LogicalOperator;

mod formatter;

pub use formatter::TraceFormatter;

/// A record of how a condition tree was evaluated against a patient.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationTrace {
    Group {
        operator: LogicalOperator,
        children: Vec<EvaluationTrace>,
        outcome: bool,
    },
    Leaf {
        description: String,
        /// What the patient record showed, e.g. `8.2` or `no data`.
        observed: String,
        outcome: bool,
    },
    /// Skipped by short-circuiting.
    NotEvaluated,
    /// A group with nothing to evaluate; ignored by its parent.
    Vacuous,
}

impl EvaluationTrace {
    /// `None` for skipped or vacuous nodes.
    pub fn outcome(&self) -> Option<bool> {
        match self {
            EvaluationTrace::Group { outcome, .. } | EvaluationTrace::Leaf { outcome, .. } => {
                Some(*outcome)
            }
            EvaluationTrace::NotEvaluated | EvaluationTrace::Vacuous => None,
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            EvaluationTrace::Group { operator, .. } => match operator {
                LogicalOperator::Or => 1,
                LogicalOperator::And => 2,
            },
            EvaluationTrace::Leaf { .. }
            | EvaluationTrace::NotEvaluated
            | EvaluationTrace::Vacuous => 9,
        }
    }
}
