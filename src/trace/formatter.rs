use super::EvaluationTrace;
use itertools::Itertools;

/// Formats evaluation traces into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format an evaluation trace into a human-readable explanation.
    pub fn format_trace(trace: &EvaluationTrace) -> String {
        match trace {
            EvaluationTrace::Vacuous => "no conditions (always matches)".to_string(),
            _ => Self::format_recursive(trace, 0),
        }
    }

    /// Recursively formats the trace, adding parentheses only when necessary.
    fn format_recursive(trace: &EvaluationTrace, parent_precedence: u8) -> String {
        let current_precedence = trace.precedence();
        let needs_parens = current_precedence < parent_precedence;

        let body = match trace {
            EvaluationTrace::Group { operator, children, .. } => {
                // Short-circuited and vacuous children have nothing to report.
                let parts = children
                    .iter()
                    .filter(|c| c.outcome().is_some())
                    .map(|c| Self::format_recursive(c, current_precedence))
                    .collect::<Vec<_>>();
                if parts.len() == 1 {
                    // A single reported child needs no grouping of its own.
                    return parts.into_iter().next().unwrap_or_default();
                }
                parts.into_iter().join(&format!(" {} ", operator))
            }
            EvaluationTrace::Leaf {
                description,
                observed,
                outcome,
            } => format!(
                "{} (was {}) -> {}",
                description,
                observed,
                if *outcome { "true" } else { "false" }
            ),
            EvaluationTrace::NotEvaluated | EvaluationTrace::Vacuous => String::new(),
        };

        if needs_parens {
            format!("({})", body)
        } else {
            body
        }
    }
}
