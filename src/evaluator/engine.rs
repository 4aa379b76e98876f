use crate::data::{ClinicalStatus, MedicationStatus, Observation, PatientContext};
use crate::error::EvaluationError;
use crate::model::{ConditionNode, ConditionValue, Leaf, LogicalOperator, Operand, TrendSettings};
use crate::registry::{AgeBand, DemographicField, Domain, Operator, OperatorRegistry};
use crate::trace::EvaluationTrace;
use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;

const EPSILON: f64 = 1e-9;

/// The core recursive engine evaluating one condition tree against one patient.
pub(super) struct TreeEngine<'a> {
    registry: &'a OperatorRegistry,
    patient: &'a PatientContext,
}

impl<'a> TreeEngine<'a> {
    pub(super) fn new(registry: &'a OperatorRegistry, patient: &'a PatientContext) -> Self {
        Self { registry, patient }
    }

    pub(super) fn evaluate(&self, node: &ConditionNode) -> Result<EvaluationTrace, EvaluationError> {
        match node {
            ConditionNode::Leaf(leaf) => self.evaluate_leaf(leaf),
            ConditionNode::Group(group) => {
                let short_circuit_on = group.operator == LogicalOperator::Or;
                let mut children = Vec::with_capacity(group.children.len());
                let mut decided = false;
                for child in &group.children {
                    if decided {
                        children.push(EvaluationTrace::NotEvaluated);
                        continue;
                    }
                    let trace = self.evaluate(child)?;
                    if trace.outcome() == Some(short_circuit_on) {
                        decided = true;
                    }
                    children.push(trace);
                }
                if children.iter().all(|c| c.outcome().is_none()) {
                    return Ok(EvaluationTrace::Vacuous);
                }
                let outcome = if decided {
                    short_circuit_on
                } else {
                    !short_circuit_on
                };
                Ok(EvaluationTrace::Group {
                    operator: group.operator,
                    children,
                    outcome,
                })
            }
        }
    }

    fn evaluate_leaf(&self, leaf: &Leaf) -> Result<EvaluationTrace, EvaluationError> {
        let field = leaf
            .field
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| EvaluationError::IncompleteLeaf(leaf.id.clone()))?;
        if !leaf.operand.is_complete() {
            return Err(EvaluationError::IncompleteLeaf(leaf.id.clone()));
        }

        let (observed, outcome) = match leaf.domain {
            Domain::Demographic => self.demographic(leaf, field)?,
            Domain::LabValue | Domain::VitalSign => self.measurement(leaf, field)?,
            Domain::MedicalCondition => self.condition(leaf, field),
            Domain::Medication => self.medication(leaf, field),
        };
        Ok(EvaluationTrace::Leaf {
            description: leaf.describe(),
            observed,
            outcome,
        })
    }

    fn demographic(&self, leaf: &Leaf, field: &str) -> Result<(String, bool), EvaluationError> {
        match DemographicField::from_id(field) {
            Some(DemographicField::Age) => match self.patient.age_years() {
                Some(age) => {
                    let age = f64::from(age);
                    Ok((format!("{} years", age), compare(leaf, age)?))
                }
                None => Ok(("no birth date".to_string(), false)),
            },
            Some(DemographicField::Gender) => {
                let Some(gender) = self.patient.gender.as_deref() else {
                    return Ok(("no gender".to_string(), false));
                };
                let expected = leaf
                    .value()
                    .and_then(ConditionValue::as_text)
                    .ok_or_else(|| type_mismatch(leaf, "text"))?;
                let equal = gender.eq_ignore_ascii_case(expected.trim());
                let outcome = match leaf.operator {
                    Operator::Eq => equal,
                    Operator::Neq => !equal,
                    _ => false,
                };
                Ok((gender.to_string(), outcome))
            }
            None => Ok((format!("unknown attribute '{}'", field), false)),
        }
    }

    fn observation_key(&self, leaf: &Leaf, field: &str) -> String {
        let component = leaf
            .component
            .clone()
            .or_else(|| self.registry.default_component(leaf.domain, field));
        match component {
            Some(component) => format!("{}.{}", field, component),
            None => field.to_string(),
        }
    }

    fn measurement(&self, leaf: &Leaf, field: &str) -> Result<(String, bool), EvaluationError> {
        let key = self.observation_key(leaf, field);
        let window = leaf.timeframe.map(|t| t.as_delta());

        match leaf.operator {
            Operator::Missing | Operator::Exists => {
                let window = window.or_else(|| leaf.domain.default_timeframe().map(|t| t.as_delta()));
                let count = self.patient.readings(&key, window).len();
                let present = count > 0;
                let outcome = if leaf.operator == Operator::Exists {
                    present
                } else {
                    !present
                };
                return Ok((format!("{} reading(s)", count), outcome));
            }
            Operator::TrendingUp | Operator::TrendingDown => {
                let readings = self.patient.readings(&key, window);
                return Ok(self.trend(leaf, &readings));
            }
            _ => {}
        }

        let Some(latest) = self.patient.readings(&key, window).last().copied() else {
            return Ok(("no data".to_string(), false));
        };
        let observed = format_number(latest.value);

        let outcome = match leaf.operator {
            Operator::Abnormal
            | Operator::Critical
            | Operator::CriticalHigh
            | Operator::CriticalLow => {
                let band = self.patient.age_years().map(|age| AgeBand::from_age(f64::from(age)));
                let range = self.registry.reference_range_for(
                    leaf.domain,
                    field,
                    leaf.component.as_deref(),
                    band,
                );
                match (leaf.operator, range) {
                    (_, None) => false,
                    (Operator::Abnormal, Some(r)) => r.is_abnormal(latest.value),
                    (Operator::Critical, Some(r)) => r.is_critical(latest.value),
                    (Operator::CriticalHigh, Some(r)) => r.is_critical_high(latest.value),
                    (Operator::CriticalLow, Some(r)) => r.is_critical_low(latest.value),
                    _ => false,
                }
            }
            _ => compare(leaf, latest.value)?,
        };
        Ok((observed, outcome))
    }

    /// The last `min_readings` values must move strictly in one direction and, when a
    /// threshold is set, change by at least that percentage first to last.
    fn trend(&self, leaf: &Leaf, readings: &[Observation]) -> (String, bool) {
        let settings = leaf.trend.unwrap_or_else(|| TrendSettings::default_for(leaf.domain));
        let needed = settings.min_readings.max(2) as usize;
        if readings.len() < needed {
            return (
                format!("{} of {} readings", readings.len(), needed),
                false,
            );
        }
        let recent: Vec<f64> = readings[readings.len() - needed..]
            .iter()
            .map(|o| o.value)
            .collect();
        let observed = recent.iter().map(|v| format_number(*v)).join(" → ");

        let rising = leaf.operator == Operator::TrendingUp;
        let monotonic = recent
            .iter()
            .tuple_windows()
            .all(|(a, b)| if rising { b > a } else { b < a });
        if !monotonic {
            return (observed, false);
        }

        let outcome = match settings.threshold_percent {
            None => true,
            Some(threshold) => {
                let (first, last) = (recent[0], recent[needed - 1]);
                if first.abs() < EPSILON {
                    false
                } else {
                    let change = (last - first) / first.abs() * 100.0;
                    let change = if rising { change } else { -change };
                    change + EPSILON >= threshold
                }
            }
        };
        (observed, outcome)
    }

    fn within(&self, leaf: &Leaf, instant: Option<DateTime<Utc>>) -> bool {
        let window = leaf
            .timeframe
            .or_else(|| leaf.domain.default_timeframe())
            .map(|t| t.as_delta())
            .unwrap_or(TimeDelta::zero());
        instant.is_some_and(|at| at <= self.patient.as_of && at >= self.patient.as_of - window)
    }

    fn condition(&self, leaf: &Leaf, code: &str) -> (String, bool) {
        let records: Vec<_> = self.patient.conditions_for(code).collect();
        let status = |wanted: ClinicalStatus| records.iter().any(|r| r.status == wanted);
        let present = records.iter().any(|r| r.status != ClinicalStatus::Resolved);

        let outcome = match leaf.operator {
            Operator::Has => present,
            Operator::NotHas => !present,
            Operator::Active => status(ClinicalStatus::Active),
            Operator::Resolved => status(ClinicalStatus::Resolved) && !present,
            Operator::Inactive => status(ClinicalStatus::Inactive),
            Operator::NewDiagnosis => records
                .iter()
                .any(|r| r.status != ClinicalStatus::Resolved && self.within(leaf, r.onset)),
            Operator::Chronic => records
                .iter()
                .any(|r| r.chronic && r.status != ClinicalStatus::Resolved),
            Operator::Acute => records
                .iter()
                .any(|r| !r.chronic && r.status == ClinicalStatus::Active),
            _ => false,
        };
        let observed = if records.is_empty() {
            "not on problem list".to_string()
        } else {
            records
                .iter()
                .map(|r| format!("{:?}", r.status).to_lowercase())
                .join(", ")
        };
        (observed, outcome)
    }

    fn medication(&self, leaf: &Leaf, code: &str) -> (String, bool) {
        let records: Vec<_> = self.patient.medications_for(code).collect();
        let taking = records.iter().any(|m| m.status == MedicationStatus::Active);

        let outcome = match leaf.operator {
            Operator::Taking => taking,
            Operator::NotTaking => !taking,
            Operator::NewStart => records
                .iter()
                .any(|m| m.status == MedicationStatus::Active && self.within(leaf, m.started)),
            Operator::Discontinued => {
                !taking
                    && records.iter().any(|m| {
                        m.status == MedicationStatus::Stopped
                            && (leaf.timeframe.is_none() || self.within(leaf, m.stopped))
                    })
            }
            _ => false,
        };
        let observed = if records.is_empty() {
            "no prescriptions".to_string()
        } else if taking {
            "active".to_string()
        } else {
            "stopped".to_string()
        };
        (observed, outcome)
    }
}

fn type_mismatch(leaf: &Leaf, expected: &str) -> EvaluationError {
    EvaluationError::TypeMismatch {
        node_id: leaf.id.clone(),
        expected: expected.to_string(),
    }
}

/// Numeric comparison of `actual` against the leaf operand.
fn compare(leaf: &Leaf, actual: f64) -> Result<bool, EvaluationError> {
    let number = |value: &ConditionValue| value.as_number().ok_or_else(|| type_mismatch(leaf, "numeric"));
    let outcome = match (&leaf.operand, leaf.operator) {
        (Operand::Single(Some(value)), op) => {
            let expected = number(value)?;
            match op {
                Operator::Gt => actual > expected,
                Operator::Gte => actual >= expected,
                Operator::Lt => actual < expected,
                Operator::Lte => actual <= expected,
                Operator::Eq => (actual - expected).abs() < EPSILON,
                Operator::Neq => (actual - expected).abs() >= EPSILON,
                _ => false,
            }
        }
        (Operand::Range(low, high), op) => {
            let inside = actual >= number(low)? && actual <= number(high)?;
            match op {
                Operator::Between => inside,
                Operator::NotBetween => !inside,
                _ => false,
            }
        }
        _ => false,
    };
    Ok(outcome)
}

fn format_number(value: f64) -> String {
    ConditionValue::Number(value).to_string()
}
