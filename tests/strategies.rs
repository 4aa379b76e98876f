use cds_rulebuilder::data::{ClinicalStatus, MedicationStatus, PatientContext};
use cds_rulebuilder::model::{ConditionNode, Group, Leaf, LogicalOperator, Operand, Timeframe};
use cds_rulebuilder::registry::{Domain, Operator};
use chrono::{DateTime, NaiveDate};
use proptest::prelude::*;

// --- Fixed patient schema ---
// age                      : 20..=90
// HbA1c, glucose           : 0..=4 readings within the last 200 days
// blood-pressure.systolic  : 0..=4 readings within the last 10 days
// diabetes                 : absent, active, inactive or resolved
// metformin                : absent, active or stopped

const COMPARISONS: &[Operator] = &[
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::Eq,
];

const CONDITION_OPS: &[Operator] = &[
    Operator::Has,
    Operator::NotHas,
    Operator::Active,
    Operator::Resolved,
    Operator::Inactive,
    Operator::Chronic,
    Operator::Acute,
];

pub const LABS: &[&str] = &["HbA1c", "glucose", "potassium", "creatinine"];

fn arb_readings(low: f64, high: f64, max_days: i64) -> impl Strategy<Value = Vec<(f64, i64)>> {
    prop::collection::vec(((low..high).prop_map(|v| (v * 10.0).round() / 10.0), 0..max_days), 0..=4)
}

/// Generate a patient record that aligns with the fixed schema.
pub fn arb_patient() -> impl Strategy<Value = PatientContext> {
    (
        20_i32..=90,
        arb_readings(4.5, 11.0, 200),
        arb_readings(60.0, 260.0, 200),
        arb_readings(100.0, 180.0, 10),
        0_u8..4,
        0_u8..3,
    )
        .prop_map(|(age, a1c, glucose, systolic, diabetes, metformin)| {
            let as_of = DateTime::from_timestamp(1_717_243_200, 0).unwrap();
            let mut patient = PatientContext::new("prop-patient", as_of);
            patient.birth_date = NaiveDate::from_ymd_opt(2024 - age, 1, 1);
            for (key, readings) in [
                ("HbA1c", a1c),
                ("glucose", glucose),
                ("blood-pressure.systolic", systolic),
            ] {
                for (value, days_ago) in readings {
                    patient = patient.with_observation(key, value, days_ago);
                }
            }
            patient = match diabetes {
                1 => patient.with_condition("diabetes", ClinicalStatus::Active, true),
                2 => patient.with_condition("diabetes", ClinicalStatus::Inactive, false),
                3 => patient.with_condition("diabetes", ClinicalStatus::Resolved, false),
                _ => patient,
            };
            match metformin {
                1 => patient.with_medication("metformin", MedicationStatus::Active),
                2 => patient.with_medication("metformin", MedicationStatus::Stopped),
                _ => patient,
            }
        })
}

fn arb_timeframe() -> impl Strategy<Value = Option<Timeframe>> {
    prop::option::of((1_u32..=365).prop_map(Timeframe::days))
}

/// Generate a complete, compilable leaf with a fresh id.
pub fn arb_leaf() -> impl Strategy<Value = Leaf> {
    prop_oneof![
        // lab comparisons
        (prop::sample::select(LABS), prop::sample::select(COMPARISONS), 0.0_f64..300.0, arb_timeframe())
            .prop_map(|(field, op, value, timeframe)| {
                let leaf = Leaf::new(Domain::LabValue, field, op, Operand::single(value.round()));
                match timeframe {
                    Some(tf) => leaf.with_timeframe(tf),
                    None => leaf,
                }
            }),
        // lab ranges
        (prop::sample::select(LABS), 0_i32..150, 0_i32..150, any::<bool>()).prop_map(|(field, a, b, inside)| {
            let op = if inside { Operator::Between } else { Operator::NotBetween };
            Leaf::new(Domain::LabValue, field, op, Operand::range(a.min(b), a.max(b)))
        }),
        // lab flags
        (
            prop::sample::select(&["HbA1c", "glucose"][..]),
            prop::sample::select(&[Operator::Abnormal, Operator::TrendingUp, Operator::TrendingDown, Operator::Missing, Operator::Exists][..]),
        )
            .prop_map(|(field, op)| Leaf::new(Domain::LabValue, field, op, Operand::None)),
        // systolic pressure
        (prop::sample::select(COMPARISONS), 90_i32..190, any::<bool>()).prop_map(|(op, value, explicit)| {
            let leaf = Leaf::new(Domain::VitalSign, "blood-pressure", op, Operand::single(value));
            if explicit { leaf.with_component("systolic") } else { leaf }
        }),
        // age
        (prop::sample::select(COMPARISONS), 18_i32..95)
            .prop_map(|(op, value)| Leaf::new(Domain::Demographic, "age", op, Operand::single(value))),
        // diabetes
        prop::sample::select(CONDITION_OPS)
            .prop_map(|op| Leaf::new(Domain::MedicalCondition, "diabetes", op, Operand::None)),
        // metformin
        prop::sample::select(&[Operator::Taking, Operator::NotTaking, Operator::Discontinued][..])
            .prop_map(|op| Leaf::new(Domain::Medication, "metformin", op, Operand::None)),
    ]
}

fn arb_operator() -> impl Strategy<Value = LogicalOperator> {
    prop_oneof![Just(LogicalOperator::And), Just(LogicalOperator::Or)]
}

/// Generate a subtree of leaves and groups, empty and single-child groups included.
pub fn arb_node(max_depth: u32) -> impl Strategy<Value = ConditionNode> {
    arb_leaf()
        .prop_map(ConditionNode::from)
        .prop_recursive(max_depth, 24, 4, |inner| {
            (arb_operator(), prop::collection::vec(inner, 0..=4)).prop_map(|(op, children)| {
                Group::new(op).with_children(children).into()
            })
        })
}

/// Generate a full condition tree: always a group at the root.
pub fn arb_tree() -> impl Strategy<Value = ConditionNode> {
    (arb_operator(), prop::collection::vec(arb_node(2), 0..=5))
        .prop_map(|(op, children)| Group::new(op).with_children(children).into())
}
