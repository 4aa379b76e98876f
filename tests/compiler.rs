//! Tests for compilation into the canonical hook grammar and parsing back.
mod common;
use cds_rulebuilder::compiler::{self, CompiledGroup};
use cds_rulebuilder::error::CompileError;
use cds_rulebuilder::hook::prefetch;
use cds_rulebuilder::model::{LeafRecord, NodeId, Operand};
use cds_rulebuilder::prelude::*;
use chrono::{DateTime, TimeDelta};
use common::*;
use serde_json::json;

#[test]
fn test_single_leaf_compiles_to_bare_leaf() {
    let leaf = lab("a1c", "HbA1c", Operator::Gt, 7.0);
    let tree = root(vec![leaf.clone().into()]);
    let compiled = compiler::compile(&tree, &registry()).unwrap();
    assert_eq!(compiled, vec![CompiledCondition::Leaf(leaf)]);

    let json = serde_json::to_value(&compiled).unwrap();
    assert_eq!(
        json,
        json!([{ "id": "a1c", "type": "lab-value", "field": "HbA1c", "operator": "gt", "value": 7.0 }])
    );
}

#[test]
fn test_and_root_compiles_to_flat_list() {
    let age = Leaf::new(Domain::Demographic, "age", Operator::Gte, Operand::single(50)).with_id("age");
    let dm = flag("dm", Domain::MedicalCondition, "diabetes", Operator::Has);
    let tree = root(vec![age.clone().into(), dm.clone().into()]);

    let compiled = compiler::compile(&tree, &registry()).unwrap();
    assert_eq!(
        compiled,
        vec![CompiledCondition::Leaf(age), CompiledCondition::Leaf(dm)]
    );
}

#[test]
fn test_or_group_is_emitted_explicitly() {
    let compiled = compiler::compile(&diabetes_tree(), &registry()).unwrap();
    assert_eq!(compiled.len(), 2);
    match &compiled[1] {
        CompiledCondition::Group(CompiledGroup { operator, conditions }) => {
            assert_eq!(*operator, LogicalOperator::Or);
            assert_eq!(conditions.len(), 2);
        }
        other => panic!("expected an OR group, got {:?}", other),
    }
}

#[test]
fn test_nested_and_inside_and_is_spliced() {
    let tree = root(vec![
        lab("a", "HbA1c", Operator::Gt, 7.0).into(),
        Group::new(LogicalOperator::And)
            .with_child(lab("b", "glucose", Operator::Gt, 180.0))
            .with_child(lab("c", "ldl", Operator::Gt, 160.0))
            .into(),
    ]);
    let compiled = compiler::compile(&tree, &registry()).unwrap();
    let ids: Vec<&str> = compiled
        .iter()
        .map(|c| c.as_leaf().unwrap().id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn test_empty_groups_vanish() {
    let tree = root(vec![
        Group::new(LogicalOperator::Or).into(),
        lab("a", "HbA1c", Operator::Gt, 7.0).into(),
    ]);
    let compiled = compiler::compile(&tree, &registry()).unwrap();
    assert_eq!(compiled.len(), 1);
    assert!(compiled[0].as_leaf().is_some());
}

#[test]
fn test_range_leaf_requires_both_values() {
    let registry = registry();
    let leaf = Leaf::new(
        Domain::VitalSign,
        "blood-pressure-systolic",
        Operator::Between,
        Operand::range(90, 120),
    );
    assert!(compiler::compile(&root(vec![leaf.into()]), &registry).is_ok());

    let record: LeafRecord = serde_json::from_value(json!({
        "id": "bp", "type": "vital-sign", "field": "blood-pressure-systolic",
        "operator": "between", "value": 90
    }))
    .unwrap();
    let err = Leaf::try_from(record).unwrap_err();
    assert!(matches!(err, CompileError::InvalidArity { operator: Operator::Between, .. }), "{:?}", err);
}

#[test]
fn test_incomplete_leaf_fails_compilation() {
    let registry = registry();
    let tree = ConditionNode::empty_root();
    let (tree, id) = editor::add_leaf(&tree, tree.id(), Domain::LabValue, &registry).unwrap();
    assert_eq!(
        compiler::compile(&tree, &registry),
        Err(CompileError::MissingField { node_id: id.clone() })
    );

    let patch = LeafPatch::new().field("HbA1c");
    let tree = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap();
    assert!(matches!(
        compiler::compile(&tree, &registry),
        Err(CompileError::InvalidArity { .. })
    ));
}

#[test]
fn test_operator_mismatch_is_an_inconsistency() {
    // Built by hand; the editor would never allow it.
    let leaf = flag("x", Domain::LabValue, "HbA1c", Operator::Taking);
    let err = compiler::compile(&root(vec![leaf.into()]), &registry()).unwrap_err();
    assert!(matches!(err, CompileError::Inconsistency { .. }), "{:?}", err);
}

#[test]
fn test_compilation_is_all_or_nothing() {
    let tree = root(vec![
        lab("ok", "HbA1c", Operator::Gt, 7.0).into(),
        lab("bad", "unobtainium", Operator::Gt, 1.0).into(),
    ]);
    let err = compiler::compile(&tree, &registry()).unwrap_err();
    assert!(matches!(err, CompileError::InvalidField { .. }));
}

#[test]
fn test_compile_is_idempotent() {
    let registry = registry();
    let first = compiler::compile(&diabetes_tree(), &registry).unwrap();
    let second = compiler::compile(&compiler::parse(&first), &registry).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parse_builds_and_root_with_fresh_group_ids() {
    let compiled = compiler::compile(&diabetes_tree(), &registry()).unwrap();
    let tree = compiler::parse(&compiled);
    let group = tree.as_group().unwrap();
    assert_eq!(group.operator, LogicalOperator::And);
    assert_ne!(tree.id(), &NodeId::from("root"));
    assert!(tree.find(&NodeId::from("labs")).is_none());
    // Leaf ids survive the round trip.
    assert!(tree.find(&NodeId::from("a1c")).is_some());
}

#[test]
fn test_parse_json_reports_bad_input() {
    assert!(matches!(
        compiler::parse_json("{ not json"),
        Err(CompileError::JsonParseError(_))
    ));
}

fn fixed_now() -> DateTime<chrono::Utc> {
    DateTime::from_timestamp(1_717_243_200, 0).unwrap()
}

#[test]
fn test_compile_hook_fills_metadata_and_prefetch() {
    let compiler = HookCompiler::builder().with_default_author("cds-team").build();
    let definition = compiler.compile_hook_at(&diabetes_draft(), fixed_now()).unwrap();

    assert_eq!(definition.id, "diabetes-follow-up");
    assert_eq!(definition.hook, HookTrigger::PatientView);
    assert_eq!(definition.meta.version, 1);
    assert_eq!(definition.meta.created, fixed_now());
    assert_eq!(definition.meta.author.as_deref(), Some("cds-team"));
    assert!(definition.prefetch.contains_key(prefetch::PATIENT_KEY));
    assert!(definition.prefetch.contains_key("labResults"));
    assert!(definition.prefetch.contains_key("conditions"));
    assert!(!definition.prefetch.contains_key("medications"));

    let json = serde_json::to_value(&definition).unwrap();
    for key in ["id", "title", "description", "hook", "prefetch", "conditions", "cards", "_meta"] {
        assert!(json.get(key).is_some(), "missing key {}", key);
    }
    assert_eq!(json["hook"], "patient-view");
}

#[test]
fn test_recompiling_a_loaded_hook_bumps_version() {
    let compiler = HookCompiler::new();
    let first = compiler.compile_hook_at(&diabetes_draft(), fixed_now()).unwrap();
    let json = first.to_json_pretty().unwrap();

    let draft = compiler.parse_hook_json(&json).unwrap();
    let later = fixed_now() + TimeDelta::days(1);
    let second = compiler.compile_hook_at(&draft, later).unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.meta.version, 2);
    assert_eq!(second.meta.created, first.meta.created);
    assert_eq!(second.meta.modified, later);
    assert_eq!(second.conditions, first.conditions);
    assert_eq!(second.cards, first.cards);
    assert_eq!(second.prefetch, first.prefetch);
}

#[test]
fn test_authored_prefetch_survives_round_trip() {
    let compiler = HookCompiler::new();
    let mut draft = diabetes_draft();
    draft
        .prefetch
        .insert("labResults".to_string(), "Observation?patient={{context.patientId}}&code=4548-4".to_string());
    draft
        .prefetch
        .insert("encounters".to_string(), "Encounter?patient={{context.patientId}}".to_string());

    let definition = compiler.compile_hook_at(&draft, fixed_now()).unwrap();
    assert_eq!(
        definition.prefetch["labResults"],
        "Observation?patient={{context.patientId}}&code=4548-4"
    );

    let reloaded = compiler.parse_hook(&definition);
    assert_eq!(reloaded.prefetch, draft.prefetch);
}

#[test]
fn test_ensure_compiled_rejects_non_normal_form() {
    let compiler = HookCompiler::new();
    let mut definition = compiler.compile_hook_at(&diabetes_draft(), fixed_now()).unwrap();
    assert!(compiler.ensure_compiled(&definition).is_ok());

    definition.conditions = vec![CompiledCondition::Group(CompiledGroup {
        operator: LogicalOperator::Or,
        conditions: vec![lab("a", "HbA1c", Operator::Gt, 7.0).into()],
    })];
    assert!(matches!(
        compiler.ensure_compiled(&definition),
        Err(CompileError::MalformedGrammar(_))
    ));

    definition.conditions = vec![
        lab("a", "HbA1c", Operator::Gt, 7.0).into(),
        lab("a", "glucose", Operator::Gt, 180.0).into(),
    ];
    assert!(matches!(
        compiler.ensure_compiled(&definition),
        Err(CompileError::Inconsistency { .. })
    ));
}

#[test]
fn test_compiled_cards_drop_editor_state() {
    let compiler = HookCompiler::new();
    let mut draft = diabetes_draft();
    draft.cards[0].expanded = true;
    let definition = compiler.compile_hook_at(&draft, fixed_now()).unwrap();
    let card = serde_json::to_value(&definition.cards[0]).unwrap();
    assert!(card.get("expanded").is_none());
    assert_eq!(card["indicator"], "warning");
    assert_eq!(card["selectionBehavior"], "any");
}
