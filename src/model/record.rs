use super::ids::NodeId;
use super::node::{Leaf, Timeframe, TrendSettings};
use super::operand::{ConditionValue, Operand};
use crate::error::CompileError;
use crate::registry::{Domain, Operator};
use serde::{Deserialize, Serialize};

/// The flat wire shape of a condition leaf, shared by drafts and compiled definitions.
///
/// ```json
/// { "id": "a1c", "type": "lab-value", "field": "HbA1c", "operator": "gt", "value": 7,
///   "timeframe": { "value": 90, "unit": "days" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(rename = "type")]
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConditionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<ConditionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_min_readings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_threshold: Option<f64>,
}

impl From<Leaf> for LeafRecord {
    fn from(leaf: Leaf) -> Self {
        let (value, value2) = match leaf.operand {
            Operand::None => (None, None),
            Operand::Single(value) => (value, None),
            Operand::Range(low, high) => (Some(low), Some(high)),
        };
        Self {
            id: Some(leaf.id),
            domain: leaf.domain,
            field: leaf.field,
            operator: leaf.operator,
            value,
            value2,
            timeframe: leaf.timeframe,
            component: leaf.component,
            trend_min_readings: leaf.trend.map(|t| t.min_readings),
            trend_threshold: leaf.trend.and_then(|t| match t.threshold_percent {
                Some(percent) => Some(percent),
                // Absent means "domain default", so a cleared vital threshold is written as 0.
                None if leaf.domain.supports_trend_threshold() => Some(0.0),
                None => None,
            }),
        }
    }
}

impl TryFrom<LeafRecord> for Leaf {
    type Error = CompileError;

    /// Rebuilds a leaf from its wire shape. A missing id is replaced with a fresh one.
    fn try_from(record: LeafRecord) -> Result<Self, Self::Error> {
        let id = record.id.unwrap_or_else(NodeId::generate);
        let operator = record.operator;

        let operand = Operand::from_parts(operator, record.value, record.value2).map_err(|err| {
            CompileError::InvalidArity {
                node_id: id.to_string(),
                operator,
                message: err.to_string(),
            }
        })?;

        let trend = if operator.is_trend() {
            let defaults = TrendSettings::default_for(record.domain);
            let min_readings = record.trend_min_readings.unwrap_or(defaults.min_readings);
            if min_readings < 2 {
                return Err(CompileError::Inconsistency {
                    node_id: id.to_string(),
                    message: format!("a trend needs at least 2 readings, got {}", min_readings),
                });
            }
            if record.trend_threshold.is_some() && !record.domain.supports_trend_threshold() {
                return Err(CompileError::Inconsistency {
                    node_id: id.to_string(),
                    message: format!("trend thresholds are not supported for {}", record.domain),
                });
            }
            let threshold_percent = match record.trend_threshold {
                None => defaults.threshold_percent,
                Some(percent) if percent == 0.0 => None,
                Some(percent) if percent.is_finite() && percent > 0.0 => Some(percent),
                Some(percent) => {
                    return Err(CompileError::Inconsistency {
                        node_id: id.to_string(),
                        message: format!("trend threshold must be a positive percentage, got {}", percent),
                    });
                }
            };
            Some(TrendSettings {
                min_readings,
                threshold_percent,
            })
        } else {
            if record.trend_min_readings.is_some() || record.trend_threshold.is_some() {
                return Err(CompileError::Inconsistency {
                    node_id: id.to_string(),
                    message: format!("trend settings given for non-trend operator '{}'", operator),
                });
            }
            None
        };

        Ok(Leaf {
            id,
            domain: record.domain,
            field: record.field,
            operator,
            operand,
            timeframe: record.timeframe,
            component: record.component,
            trend,
        })
    }
}
