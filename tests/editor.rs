//! Tests for the pure tree-editing operations.
mod common;
use cds_rulebuilder::config::EditorConfig;
use cds_rulebuilder::error::EditError;
use cds_rulebuilder::model::{NodeId, Operand};
use cds_rulebuilder::prelude::*;
use common::*;

fn config() -> EditorConfig {
    EditorConfig::default()
}

#[test]
fn test_add_leaf_starts_with_first_operator() {
    let registry = registry();
    let tree = ConditionNode::empty_root();
    let (tree, id) = editor::add_leaf(&tree, tree.id(), Domain::LabValue, &registry).unwrap();

    let leaf = tree.find(&id).and_then(ConditionNode::as_leaf).unwrap();
    assert_eq!(leaf.field, None);
    assert_eq!(leaf.operator, Operator::Gt);
    assert_eq!(leaf.operand, Operand::Single(None));
    assert_eq!(tree.children().len(), 1);
}

#[test]
fn test_add_leaf_to_leaf_fails() {
    let registry = registry();
    let tree = diabetes_tree();
    let result = editor::add_leaf(&tree, &NodeId::from("dm"), Domain::Medication, &registry);
    assert_eq!(result.unwrap_err(), EditError::NotAGroup(NodeId::from("dm")));
}

#[test]
fn test_add_group_respects_depth_cap() {
    let tree = ConditionNode::empty_root();
    let (tree, level2) = editor::add_group(&tree, tree.id(), LogicalOperator::Or, &config()).unwrap();
    let (tree, level3) = editor::add_group(&tree, &level2, LogicalOperator::And, &config()).unwrap();
    let err = editor::add_group(&tree, &level3, LogicalOperator::Or, &config()).unwrap_err();
    assert!(matches!(err, EditError::DepthExceeded { max_depth: 3, .. }), "{:?}", err);
}

#[test]
fn test_update_unknown_node_is_not_found() {
    let registry = registry();
    let tree = diabetes_tree();
    let missing = NodeId::from("nope");
    let patch = LeafPatch::new().value(8);
    assert_eq!(
        editor::update_node(&tree, &missing, &patch.into(), &registry),
        Err(EditError::NotFound(missing.clone()))
    );
    assert_eq!(
        editor::remove_node(&tree, &missing),
        Err(EditError::NotFound(missing.clone()))
    );
    assert_eq!(
        editor::reorder(&tree, &missing, 0, 1),
        Err(EditError::NotFound(missing))
    );
}

#[test]
fn test_update_with_wrong_patch_kind() {
    let registry = registry();
    let tree = diabetes_tree();
    let patch = GroupPatch::operator(LogicalOperator::Or);
    let err = editor::update_node(&tree, &NodeId::from("a1c"), &patch.into(), &registry).unwrap_err();
    assert_eq!(err, EditError::KindMismatch(NodeId::from("a1c")));
}

#[test]
fn test_group_operator_change() {
    let registry = registry();
    let tree = diabetes_tree();
    let patch = GroupPatch::operator(LogicalOperator::And);
    let tree = editor::update_node(&tree, &NodeId::from("labs"), &patch.into(), &registry).unwrap();
    let group = tree.find(&NodeId::from("labs")).and_then(ConditionNode::as_group).unwrap();
    assert_eq!(group.operator, LogicalOperator::And);
}

#[test]
fn test_value2_on_single_operator_is_rejected() {
    let registry = registry();
    let tree = diabetes_tree();
    let patch = LeafPatch::new().value(7).value2(9);
    let err = editor::update_node(&tree, &NodeId::from("a1c"), &patch.into(), &registry).unwrap_err();
    assert!(matches!(err, EditError::InvalidArity { operator: Operator::Gt, .. }), "{:?}", err);
}

#[test]
fn test_switch_to_range_needs_both_bounds() {
    let registry = registry();
    let tree = diabetes_tree();
    let id = NodeId::from("a1c");

    // The old value carries over as the lower bound, but the upper one is missing.
    let patch = LeafPatch::new().operator(Operator::Between);
    let err = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap_err();
    assert!(matches!(err, EditError::InvalidArity { .. }));

    let patch = LeafPatch::new().operator(Operator::Between).value2(9);
    let tree = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap();
    let leaf = tree.find(&id).and_then(ConditionNode::as_leaf).unwrap();
    assert_eq!(leaf.operand, Operand::range(7.0, 9.0));

    // Back to a single-value operator keeps the lower bound only.
    let patch = LeafPatch::new().operator(Operator::Lt);
    let tree = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap();
    let leaf = tree.find(&id).and_then(ConditionNode::as_leaf).unwrap();
    assert_eq!(leaf.operand, Operand::single(7.0));
    assert_eq!(leaf.value2(), None);
}

#[test]
fn test_inverted_range_is_rejected() {
    let registry = registry();
    let tree = diabetes_tree();
    let patch = LeafPatch::new().operator(Operator::Between).value(9).value2(7);
    let err = editor::update_node(&tree, &NodeId::from("a1c"), &patch.into(), &registry).unwrap_err();
    assert!(matches!(err, EditError::InvalidParameter(_)));
}

#[test]
fn test_field_change_resets_operator_and_values() {
    let registry = registry();
    let tree = diabetes_tree();
    let id = NodeId::from("a1c");
    let patch = LeafPatch::new().operator(Operator::Between).value(6).value2(8);
    let tree = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap();

    let patch = LeafPatch::new().field("potassium");
    let tree = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap();
    let leaf = tree.find(&id).and_then(ConditionNode::as_leaf).unwrap();
    assert_eq!(leaf.field.as_deref(), Some("potassium"));
    assert_eq!(leaf.operator, registry.default_operator(Domain::LabValue, Some("potassium")).unwrap());
    assert_eq!(leaf.value(), None);
    assert_eq!(leaf.value2(), None);
    // Timeframe survives a field change within the same domain.
    assert_eq!(leaf.timeframe, Some(Timeframe::days(90)));
}

#[test]
fn test_unknown_field_is_rejected() {
    let registry = registry();
    let tree = diabetes_tree();
    let patch = LeafPatch::new().field("unobtainium");
    let err = editor::update_node(&tree, &NodeId::from("a1c"), &patch.into(), &registry).unwrap_err();
    assert_eq!(
        err,
        EditError::InvalidField {
            domain: Domain::LabValue,
            field: "unobtainium".to_string()
        }
    );
}

#[test]
fn test_operator_not_valid_for_field() {
    let registry = registry();
    let tree = diabetes_tree();
    // `critical_high` belongs to vital signs only.
    let patch = LeafPatch::new().operator(Operator::CriticalHigh);
    let err = editor::update_node(&tree, &NodeId::from("a1c"), &patch.into(), &registry).unwrap_err();
    assert!(matches!(err, EditError::InvalidOperator { operator: Operator::CriticalHigh, .. }));
}

#[test]
fn test_vital_component_defaults_and_validates() {
    let registry = registry();
    let tree = ConditionNode::empty_root();
    let (tree, id) = editor::add_leaf(&tree, tree.id(), Domain::VitalSign, &registry).unwrap();
    let patch = LeafPatch::new().field("blood-pressure").value(140);
    let tree = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap();
    let leaf = tree.find(&id).and_then(ConditionNode::as_leaf).unwrap();
    assert_eq!(leaf.component.as_deref(), Some("systolic"));

    let patch = LeafPatch::new().component("mean");
    assert!(editor::update_node(&tree, &id, &patch.into(), &registry).is_err());
}

#[test]
fn test_trend_settings_follow_operator() {
    let registry = registry();
    let tree = ConditionNode::empty_root();
    let (tree, id) = editor::add_leaf(&tree, tree.id(), Domain::VitalSign, &registry).unwrap();
    let patch = LeafPatch::new().field("heart-rate").operator(Operator::TrendingUp).trend_threshold(15.0);
    let tree = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap();
    let trend = tree.find(&id).and_then(ConditionNode::as_leaf).and_then(|l| l.trend).unwrap();
    assert_eq!(trend.min_readings, 3);
    assert_eq!(trend.threshold_percent, Some(15.0));

    let patch = LeafPatch::new().operator(Operator::Gt).value(100);
    let tree = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap();
    assert_eq!(tree.find(&id).and_then(ConditionNode::as_leaf).unwrap().trend, None);
}

#[test]
fn test_lab_trend_rejects_threshold() {
    let registry = registry();
    let tree = diabetes_tree();
    let patch = LeafPatch::new().operator(Operator::TrendingUp).trend_threshold(10.0);
    let err = editor::update_node(&tree, &NodeId::from("a1c"), &patch.into(), &registry).unwrap_err();
    assert!(matches!(err, EditError::InvalidParameter(_)));
}

#[test]
fn test_new_diagnosis_gets_default_timeframe() {
    let registry = registry();
    let tree = diabetes_tree();
    let patch = LeafPatch::new().operator(Operator::NewDiagnosis);
    let tree = editor::update_node(&tree, &NodeId::from("dm"), &patch.into(), &registry).unwrap();
    let leaf = tree.find(&NodeId::from("dm")).and_then(ConditionNode::as_leaf).unwrap();
    assert_eq!(leaf.timeframe, Some(Timeframe::days(30)));

    let patch = LeafPatch::new().clear_timeframe();
    let err = editor::update_node(&tree, &NodeId::from("dm"), &patch.into(), &registry).unwrap_err();
    assert!(matches!(err, EditError::InvalidParameter(_)));
}

#[test]
fn test_remove_last_child_keeps_group() {
    let tree = diabetes_tree();
    let tree = editor::remove_node(&tree, &NodeId::from("a1c")).unwrap();
    let tree = editor::remove_node(&tree, &NodeId::from("glu")).unwrap();
    let group = tree.find(&NodeId::from("labs")).and_then(ConditionNode::as_group).unwrap();
    assert!(group.children.is_empty());
}

#[test]
fn test_remove_root_fails() {
    let tree = diabetes_tree();
    assert_eq!(
        editor::remove_node(&tree, &NodeId::from("root")),
        Err(EditError::CannotRemoveRoot)
    );
}

#[test]
fn test_duplicate_group_gets_fresh_ids() {
    let tree = diabetes_tree();
    let before = tree.ids();
    let (tree, copy) = editor::duplicate_node(&tree, &NodeId::from("labs")).unwrap();

    assert!(tree.has_unique_ids());
    let new_ids: Vec<NodeId> = tree.ids().into_iter().filter(|id| !before.contains(id)).collect();
    assert_eq!(new_ids.len(), 3);
    // The copy sits right after the original.
    assert_eq!(tree.children()[2].id(), &copy);
    assert_eq!(tree.children()[1].id(), &NodeId::from("labs"));
}

#[test]
fn test_duplicate_root_fails() {
    let tree = diabetes_tree();
    assert_eq!(
        editor::duplicate_node(&tree, &NodeId::from("root")).unwrap_err(),
        EditError::RootImmutable
    );
}

#[test]
fn test_reorder_within_group() {
    let tree = diabetes_tree();
    let tree = editor::reorder(&tree, &NodeId::from("labs"), 0, 1).unwrap();
    let ids: Vec<&str> = tree
        .find(&NodeId::from("labs"))
        .unwrap()
        .children()
        .iter()
        .map(|c| c.id().as_str())
        .collect();
    assert_eq!(ids, vec!["glu", "a1c"]);

    let err = editor::reorder(&tree, &NodeId::from("labs"), 0, 5).unwrap_err();
    assert_eq!(err, EditError::IndexOutOfBounds { index: 5, len: 2 });
}

#[test]
fn test_move_across_parents() {
    let tree = diabetes_tree();
    let tree = editor::move_node(&tree, &NodeId::from("a1c"), &NodeId::from("root"), Some(0), &config()).unwrap();
    assert_eq!(tree.children()[0].id(), &NodeId::from("a1c"));
    assert_eq!(tree.find(&NodeId::from("labs")).unwrap().children().len(), 1);
}

#[test]
fn test_move_into_own_subtree_fails() {
    let tree = diabetes_tree();
    let (tree, inner) = editor::add_group(&tree, &NodeId::from("labs"), LogicalOperator::And, &config()).unwrap();
    let err = editor::move_node(&tree, &NodeId::from("labs"), &inner, None, &config()).unwrap_err();
    assert_eq!(err, EditError::InvalidMove { node_id: NodeId::from("labs") });
}

#[test]
fn test_wrap_and_unwrap_are_inverse() {
    let tree = diabetes_tree();
    let (wrapped, group) = editor::wrap_in_group(&tree, &NodeId::from("dm"), LogicalOperator::Or, &config()).unwrap();
    assert_eq!(wrapped.children()[0].id(), &group);
    assert_eq!(wrapped.children()[0].children()[0].id(), &NodeId::from("dm"));

    let unwrapped = editor::unwrap_group(&wrapped, &group).unwrap();
    assert_eq!(unwrapped, tree);
}

#[test]
fn test_wrap_respects_depth_cap() {
    let tree = diabetes_tree();
    // labs is at level 2; wrapping it would push it to level 3, still fine.
    let (tree, _) = editor::wrap_in_group(&tree, &NodeId::from("labs"), LogicalOperator::And, &config()).unwrap();
    // a1c now sits at level 3; wrapping it would create a fourth level.
    let err = editor::wrap_in_group(&tree, &NodeId::from("a1c"), LogicalOperator::And, &config()).unwrap_err();
    assert!(matches!(err, EditError::DepthExceeded { .. }));
}

#[test]
fn test_failed_edit_leaves_tree_untouched() {
    let registry = registry();
    let tree = diabetes_tree();
    let snapshot = tree.clone();
    let patch = LeafPatch::new().operator(Operator::Between).value(9).value2(1);
    assert!(editor::update_node(&tree, &NodeId::from("a1c"), &patch.into(), &registry).is_err());
    assert_eq!(tree, snapshot);
}
