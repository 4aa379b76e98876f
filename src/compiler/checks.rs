use crate::error::CompileError;
use crate::model::{Leaf, Operand};
use crate::registry::OperatorRegistry;

/// Re-validates a leaf against the registry before it is emitted.
pub(crate) fn check_leaf(leaf: &Leaf, registry: &OperatorRegistry) -> Result<(), CompileError> {
    let inconsistency = |message: String| CompileError::Inconsistency {
        node_id: leaf.id.to_string(),
        message,
    };

    let field = match leaf.field.as_deref().map(str::trim) {
        Some(field) if !field.is_empty() => field,
        _ => {
            return Err(CompileError::MissingField {
                node_id: leaf.id.clone(),
            });
        }
    };
    if !registry.is_known_field(leaf.domain, field) {
        return Err(CompileError::InvalidField {
            node_id: leaf.id.clone(),
            domain: leaf.domain,
            field: field.to_string(),
        });
    }
    if !registry.is_valid_operator(leaf.domain, Some(field), leaf.operator) {
        return Err(inconsistency(format!(
            "operator '{}' is not valid for field '{}'",
            leaf.operator, field
        )));
    }

    if leaf.operand.arity() != leaf.operator.arity() || !leaf.operand.is_complete() {
        let message = match leaf.operand {
            Operand::Single(None) => "a value is required".to_string(),
            _ => format!("expected {} value(s)", leaf.operator.arity()),
        };
        return Err(CompileError::InvalidArity {
            node_id: leaf.id.to_string(),
            operator: leaf.operator,
            message,
        });
    }
    let kind = registry.value_kind(leaf.domain, Some(field));
    if let Some(value) = leaf.operand.values().find(|v| !kind.accepts(v)) {
        return Err(inconsistency(format!("expected {}, got {}", kind.expected(), value)));
    }
    if let Operand::Range(low, high) = &leaf.operand {
        if low.as_number() > high.as_number() {
            return Err(inconsistency(format!("range {}..{} is inverted", low, high)));
        }
    }

    match leaf.timeframe {
        Some(timeframe) if timeframe.value == 0 => {
            return Err(inconsistency("timeframe must be at least 1".to_string()));
        }
        None if leaf.operator.requires_timeframe() => {
            return Err(inconsistency(format!(
                "operator '{}' requires a timeframe",
                leaf.operator
            )));
        }
        _ => {}
    }

    if let Some(component) = leaf.component.as_deref() {
        registry
            .check_component(leaf.domain, field, Some(component))
            .map_err(|err| inconsistency(err.to_string()))?;
    }

    match (&leaf.trend, leaf.operator.is_trend()) {
        (None, true) => Err(inconsistency("trend operator without trend settings".to_string())),
        (Some(_), false) => Err(inconsistency(format!(
            "trend settings on non-trend operator '{}'",
            leaf.operator
        ))),
        (Some(trend), true) if trend.min_readings < 2 => {
            Err(inconsistency("a trend needs at least 2 readings".to_string()))
        }
        (Some(trend), true)
            if trend.threshold_percent.is_some() && !leaf.domain.supports_trend_threshold() =>
        {
            Err(inconsistency(format!(
                "trend thresholds are not supported for {}",
                leaf.domain
            )))
        }
        _ => Ok(()),
    }
}
