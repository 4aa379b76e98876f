use crate::error::EditError;
use crate::model::{ConditionValue, Leaf, LogicalOperator, Operand, Timeframe, TrendSettings};
use crate::registry::{Arity, Domain, Operator, OperatorRegistry};

/// A partial update for one node. The variant must match the node kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePatch {
    Leaf(LeafPatch),
    Group(GroupPatch),
}

impl From<LeafPatch> for NodePatch {
    fn from(patch: LeafPatch) -> Self {
        NodePatch::Leaf(patch)
    }
}

impl From<GroupPatch> for NodePatch {
    fn from(patch: GroupPatch) -> Self {
        NodePatch::Group(patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupPatch {
    pub operator: Option<LogicalOperator>,
}

impl GroupPatch {
    pub fn operator(operator: LogicalOperator) -> Self {
        Self {
            operator: Some(operator),
        }
    }
}

/// A partial update of a leaf. `None` leaves a property untouched; the nested options of
/// `value`, `value2`, `timeframe`, `component` and `trend_threshold` allow clearing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeafPatch {
    pub domain: Option<Domain>,
    pub field: Option<String>,
    pub operator: Option<Operator>,
    pub value: Option<Option<ConditionValue>>,
    pub value2: Option<Option<ConditionValue>>,
    pub timeframe: Option<Option<Timeframe>>,
    pub component: Option<Option<String>>,
    pub trend_min_readings: Option<u32>,
    pub trend_threshold: Option<Option<f64>>,
}

impl LeafPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn value(mut self, value: impl Into<ConditionValue>) -> Self {
        self.value = Some(Some(value.into()));
        self
    }

    pub fn value2(mut self, value: impl Into<ConditionValue>) -> Self {
        self.value2 = Some(Some(value.into()));
        self
    }

    pub fn clear_value2(mut self) -> Self {
        self.value2 = Some(None);
        self
    }

    pub fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(Some(timeframe));
        self
    }

    pub fn clear_timeframe(mut self) -> Self {
        self.timeframe = Some(None);
        self
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(Some(component.into()));
        self
    }

    pub fn trend_min_readings(mut self, readings: u32) -> Self {
        self.trend_min_readings = Some(readings);
        self
    }

    pub fn trend_threshold(mut self, percent: f64) -> Self {
        self.trend_threshold = Some(Some(percent));
        self
    }
}

/// The operand a leaf starts with under `operator`: nothing, or one unset value.
pub(crate) fn blank_operand(operator: Operator) -> Result<Operand, EditError> {
    Operand::from_parts(operator, None, None)
}

/// Applies `patch` to a copy of `leaf`, enforcing the registry rules:
///
/// * a new field (or domain) resets operator, values, component and trend settings;
/// * a new operator keeps the values its arity still accepts;
/// * values must fit the operator arity and the field's value kind.
pub(crate) fn apply_leaf_patch(
    leaf: &Leaf,
    patch: &LeafPatch,
    registry: &OperatorRegistry,
) -> Result<Leaf, EditError> {
    let mut next = leaf.clone();

    let domain_changed = patch.domain.is_some_and(|d| d != leaf.domain);
    let field_changed = match &patch.field {
        Some(field) => leaf.field.as_deref() != Some(field.trim()),
        None => false,
    };

    if domain_changed || field_changed {
        if let Some(domain) = patch.domain {
            next.domain = domain;
        }
        if domain_changed {
            next.timeframe = None;
        }
        next.field = match &patch.field {
            Some(field) => {
                let field = field.trim();
                if !registry.is_known_field(next.domain, field) {
                    return Err(EditError::InvalidField {
                        domain: next.domain,
                        field: field.to_string(),
                    });
                }
                Some(field.to_string())
            }
            None => None,
        };
        next.operator = registry.default_operator(next.domain, next.field.as_deref())?;
        next.operand = blank_operand(next.operator)?;
        next.component = next
            .field
            .as_deref()
            .and_then(|field| registry.default_component(next.domain, field));
        next.trend = None;
    }

    let operator = patch.operator.unwrap_or(next.operator);
    if !registry.is_valid_operator(next.domain, next.field.as_deref(), operator) {
        return Err(EditError::InvalidOperator {
            domain: next.domain,
            field: next.field.clone().unwrap_or_default(),
            operator,
        });
    }

    // Carry over what the new arity can hold, then apply explicit value edits.
    let (mut value, mut value2) = match operator.arity() {
        Arity::None => (None, None),
        Arity::One => (next.operand.value().cloned(), None),
        Arity::Two => (
            next.operand.value().cloned(),
            next.operand.value2().cloned(),
        ),
    };
    if let Some(v) = &patch.value {
        value = v.clone();
    }
    if let Some(v) = &patch.value2 {
        value2 = v.clone();
    }
    next.operand = Operand::from_parts(operator, value, value2)?;
    check_values(&next, operator, registry)?;

    if operator.is_trend() {
        if !next.operator.is_trend() || next.trend.is_none() {
            next.trend = Some(TrendSettings::default_for(next.domain));
        }
    } else {
        next.trend = None;
    }
    next.operator = operator;

    if let Some(timeframe) = patch.timeframe {
        if let Some(tf) = timeframe {
            if tf.value == 0 {
                return Err(EditError::InvalidParameter(
                    "timeframe must be at least 1".to_string(),
                ));
            }
        }
        next.timeframe = timeframe;
    }
    if operator.requires_timeframe() && next.timeframe.is_none() {
        if patch.timeframe == Some(None) {
            return Err(EditError::InvalidParameter(format!(
                "operator '{}' requires a timeframe",
                operator
            )));
        }
        next.timeframe = next.domain.default_timeframe();
    }

    if let Some(component) = &patch.component {
        match (component, next.field.as_deref()) {
            (Some(_), None) => {
                return Err(EditError::InvalidParameter(
                    "select a field before choosing a component".to_string(),
                ));
            }
            (Some(name), Some(field)) => {
                registry.check_component(next.domain, field, Some(name))?;
            }
            (None, _) => {}
        }
        next.component = component.clone();
    }

    apply_trend_patch(&mut next, patch)?;
    Ok(next)
}

fn check_values(leaf: &Leaf, operator: Operator, registry: &OperatorRegistry) -> Result<(), EditError> {
    let kind = registry.value_kind(leaf.domain, leaf.field.as_deref());
    if let Some(value) = leaf.operand.values().find(|v| !kind.accepts(v)) {
        return Err(EditError::InvalidParameter(format!(
            "operator '{}' on this field expects {}, got {}",
            operator,
            kind.expected(),
            value
        )));
    }
    if let Operand::Range(low, high) = &leaf.operand {
        if let (Some(low), Some(high)) = (low.as_number(), high.as_number()) {
            if low > high {
                return Err(EditError::InvalidParameter(format!(
                    "range lower bound {} is greater than upper bound {}",
                    low, high
                )));
            }
        }
    }
    Ok(())
}

fn apply_trend_patch(leaf: &mut Leaf, patch: &LeafPatch) -> Result<(), EditError> {
    if patch.trend_min_readings.is_none() && patch.trend_threshold.is_none() {
        return Ok(());
    }
    let domain = leaf.domain;
    let Some(trend) = leaf.trend.as_mut() else {
        return Err(EditError::InvalidParameter(format!(
            "trend settings require a trend operator, not '{}'",
            leaf.operator
        )));
    };
    if let Some(readings) = patch.trend_min_readings {
        if readings < 2 {
            return Err(EditError::InvalidParameter(
                "a trend needs at least 2 readings".to_string(),
            ));
        }
        trend.min_readings = readings;
    }
    if let Some(threshold) = patch.trend_threshold {
        if let Some(percent) = threshold {
            if !domain.supports_trend_threshold() {
                return Err(EditError::InvalidParameter(format!(
                    "trend thresholds are not supported for {}",
                    domain
                )));
            }
            if !percent.is_finite() || percent <= 0.0 {
                return Err(EditError::InvalidParameter(
                    "trend threshold must be a positive percentage".to_string(),
                ));
            }
        }
        trend.threshold_percent = threshold;
    }
    Ok(())
}
