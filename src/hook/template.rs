//! Built-in starting points for common alerts.

use super::{HookDraft, HookTrigger};
use crate::cards::{Card, CardDraft, Indicator, Suggestion};
use crate::model::{ConditionNode, Group, Leaf, LogicalOperator, Operand, Timeframe};
use crate::registry::{Domain, Operator};
use serde_json::json;

pub struct HookTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub trigger: HookTrigger,
    build: fn() -> (ConditionNode, Vec<Card>),
}

impl HookTemplate {
    /// A fresh tree and card list with new ids on every call.
    pub fn instantiate(&self) -> (ConditionNode, Vec<Card>) {
        (self.build)()
    }

    /// Replaces the draft's tree and cards wholesale. Title and description are only
    /// filled in when the draft has none.
    pub fn apply(&self, draft: &HookDraft) -> HookDraft {
        let (tree, cards) = self.instantiate();
        let mut next = draft.clone();
        next.tree = tree;
        next.cards = cards.into_iter().map(CardDraft::from).collect();
        next.trigger = self.trigger;
        if next.title.trim().is_empty() {
            next.title = self.name.to_string();
        }
        if next.description.trim().is_empty() {
            next.description = self.description.to_string();
        }
        next
    }
}

pub const TEMPLATES: &[HookTemplate] = &[
    HookTemplate {
        id: "diabetes-monitoring",
        name: "Diabetes monitoring",
        description: "Diabetic patients whose HbA1c is above 7% in the last 90 days.",
        trigger: HookTrigger::PatientView,
        build: diabetes_monitoring,
    },
    HookTemplate {
        id: "hypertension-control",
        name: "Uncontrolled hypertension",
        description: "Hypertensive patients with an elevated blood pressure this week.",
        trigger: HookTrigger::PatientView,
        build: hypertension_control,
    },
    HookTemplate {
        id: "sepsis-screen",
        name: "Sepsis screen",
        description: "SIRS criteria together with an elevated lactate.",
        trigger: HookTrigger::EncounterStart,
        build: sepsis_screen,
    },
    HookTemplate {
        id: "warfarin-inr",
        name: "Anticoagulation INR check",
        description: "Patients on warfarin with a high or missing INR.",
        trigger: HookTrigger::MedicationPrescribe,
        build: warfarin_inr,
    },
];

pub fn find(id: &str) -> Option<&'static HookTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

fn diabetes_monitoring() -> (ConditionNode, Vec<Card>) {
    let tree = Group::new(LogicalOperator::And)
        .with_child(Leaf::new(Domain::MedicalCondition, "diabetes", Operator::Has, Operand::None))
        .with_child(
            Leaf::new(Domain::LabValue, "HbA1c", Operator::Gt, Operand::single(7))
                .with_timeframe(Timeframe::days(90)),
        );
    let card = Card::new("HbA1c above target", Indicator::Warning)
        .with_detail("Most recent HbA1c exceeds 7%. Consider intensifying therapy.")
        .with_source("ADA Standards of Care", None)
        .with_suggestion(
            Suggestion::new(
                "Order repeat HbA1c",
                "ServiceRequest",
                json!({ "resourceType": "ServiceRequest", "code": { "text": "HbA1c" } }),
            )
            .recommended(),
        );
    (tree.into(), vec![card])
}

fn hypertension_control() -> (ConditionNode, Vec<Card>) {
    let tree = Group::new(LogicalOperator::And)
        .with_child(Leaf::new(Domain::MedicalCondition, "hypertension", Operator::Has, Operand::None))
        .with_child(
            Group::new(LogicalOperator::Or)
                .with_child(
                    Leaf::new(Domain::VitalSign, "blood-pressure", Operator::Gte, Operand::single(140))
                        .with_component("systolic")
                        .with_timeframe(Timeframe::days(7)),
                )
                .with_child(
                    Leaf::new(Domain::VitalSign, "blood-pressure", Operator::Gte, Operand::single(90))
                        .with_component("diastolic")
                        .with_timeframe(Timeframe::days(7)),
                ),
        );
    let card = Card::new("Blood pressure not at goal", Indicator::Warning)
        .with_detail("Recent blood pressure is at or above 140/90 mmHg.");
    (tree.into(), vec![card])
}

fn sepsis_screen() -> (ConditionNode, Vec<Card>) {
    let vital = |field: &str, value: f64| {
        Leaf::new(Domain::VitalSign, field, Operator::Gt, Operand::single(value))
            .with_timeframe(Timeframe::hours(24))
    };
    let tree = Group::new(LogicalOperator::And)
        .with_child(
            Group::new(LogicalOperator::Or)
                .with_child(vital("temperature", 38.3))
                .with_child(vital("heart-rate", 90.0))
                .with_child(vital("respiratory-rate", 20.0))
                .with_child(
                    Leaf::new(Domain::LabValue, "wbc", Operator::Gt, Operand::single(12))
                        .with_timeframe(Timeframe::hours(24)),
                ),
        )
        .with_child(
            Leaf::new(Domain::LabValue, "lactate", Operator::Gte, Operand::single(2))
                .with_timeframe(Timeframe::hours(24)),
        );
    let card = Card::new("Possible sepsis", Indicator::Critical)
        .with_detail("SIRS criteria met with lactate at or above 2 mmol/L.")
        .with_link("Surviving Sepsis Campaign", "https://www.sccm.org/survivingsepsiscampaign")
        .with_suggestion(Suggestion::new(
            "Order blood cultures",
            "ServiceRequest",
            json!({ "resourceType": "ServiceRequest", "code": { "text": "Blood culture" } }),
        ));
    (tree.into(), vec![card])
}

fn warfarin_inr() -> (ConditionNode, Vec<Card>) {
    let tree = Group::new(LogicalOperator::And)
        .with_child(Leaf::new(Domain::Medication, "warfarin", Operator::Taking, Operand::None))
        .with_child(
            Group::new(LogicalOperator::Or)
                .with_child(
                    Leaf::new(Domain::LabValue, "inr", Operator::Gt, Operand::single(3.5))
                        .with_timeframe(Timeframe::days(30)),
                )
                .with_child(
                    Leaf::new(Domain::LabValue, "inr", Operator::Missing, Operand::None)
                        .with_timeframe(Timeframe::days(30)),
                ),
        );
    let card = Card::new("Review INR before prescribing", Indicator::Warning)
        .with_detail("INR is above 3.5 or has not been measured in 30 days.");
    (tree.into(), vec![card])
}
