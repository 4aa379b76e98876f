//! Common test utilities for building condition trees, hooks and patients.
use cds_rulebuilder::data::{ClinicalStatus, MedicationStatus};
use cds_rulebuilder::model::Operand;
use cds_rulebuilder::prelude::*;
use chrono::DateTime;

/// A registry with only the built-in catalogs.
#[allow(dead_code)]
pub fn registry() -> OperatorRegistry {
    OperatorRegistry::new()
}

/// A complete lab leaf with a fixed id.
#[allow(dead_code)]
pub fn lab(id: &str, field: &str, operator: Operator, value: f64) -> Leaf {
    Leaf::new(Domain::LabValue, field, operator, Operand::single(value)).with_id(id)
}

/// A no-value leaf with a fixed id.
#[allow(dead_code)]
pub fn flag(id: &str, domain: Domain, field: &str, operator: Operator) -> Leaf {
    Leaf::new(domain, field, operator, Operand::None).with_id(id)
}

/// An AND root holding `children`.
#[allow(dead_code)]
pub fn root(children: Vec<ConditionNode>) -> ConditionNode {
    Group::new(LogicalOperator::And)
        .with_id("root")
        .with_children(children)
        .into()
}

/// Diabetic patients with HbA1c above 7 or glucose above 180:
///
/// `diabetes has AND (HbA1c gt 7 OR glucose gt 180)`
#[allow(dead_code)]
pub fn diabetes_tree() -> ConditionNode {
    root(vec![
        flag("dm", Domain::MedicalCondition, "diabetes", Operator::Has).into(),
        Group::new(LogicalOperator::Or)
            .with_id("labs")
            .with_child(lab("a1c", "HbA1c", Operator::Gt, 7.0).with_timeframe(Timeframe::days(90)))
            .with_child(lab("glu", "glucose", Operator::Gt, 180.0))
            .into(),
    ])
}

#[allow(dead_code)]
pub fn diabetes_draft() -> HookDraft {
    HookDraft::new("Diabetes follow-up", HookTrigger::PatientView)
        .with_description("HbA1c or glucose above target")
        .with_tree(diabetes_tree())
        .with_card(
            Card::new("Glycemic control above target", Indicator::Warning)
                .with_detail("Consider intensifying therapy."),
        )
}

/// A healthy 30-year-old man with a single normal HbA1c.
#[allow(dead_code)]
pub fn healthy_patient() -> PatientContext {
    let as_of = DateTime::from_timestamp(1_717_243_200, 0).unwrap();
    let mut patient = PatientContext::new("healthy-1", as_of)
        .with_observation("HbA1c", 5.2, 30)
        .with_observation("glucose", 88.0, 30)
        .with_observation("blood-pressure.systolic", 118.0, 2)
        .with_observation("blood-pressure.diastolic", 76.0, 2)
        .with_condition("asthma", ClinicalStatus::Resolved, false)
        .with_medication("ibuprofen", MedicationStatus::Stopped);
    patient.birth_date = chrono::NaiveDate::from_ymd_opt(1994, 1, 10);
    patient.gender = Some("male".to_string());
    patient
}
