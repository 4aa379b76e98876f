mod strategies;

use cds_rulebuilder::compiler::{self, CompiledCondition};
use cds_rulebuilder::editor::{self, LeafPatch};
use cds_rulebuilder::model::{ConditionNode, DisplayTree, Group, LogicalOperator, NodeId, Operand};
use cds_rulebuilder::prelude::{Domain, Evaluator, Operator, OperatorRegistry};
use proptest::prelude::*;
use proptest::sample::Index;
use strategies::{LABS, arb_leaf, arb_patient, arb_tree};

/// Helper: checks compiled normal form below a group with operator `ambient`.
fn assert_normal_form(conditions: &[CompiledCondition], ambient: LogicalOperator) -> Result<(), TestCaseError> {
    for condition in conditions {
        if let CompiledCondition::Group(group) = condition {
            prop_assert!(group.conditions.len() >= 2, "group with fewer than two conditions");
            prop_assert_ne!(group.operator, ambient, "group repeats its parent operator");
            assert_normal_form(&group.conditions, group.operator)?;
        }
    }
    Ok(())
}

fn leaf_ids(tree: &ConditionNode) -> Vec<NodeId> {
    tree.leaves().into_iter().map(|l| l.id.clone()).collect()
}

// ---------------------------------------------------------------------------
// Invariant 1: Compile normal form
//
// Compiling is idempotent, keeps every leaf in order, and never emits a
// redundant group.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn compile_is_idempotent(tree in arb_tree()) {
        let registry = OperatorRegistry::new();
        let first = compiler::compile(&tree, &registry).unwrap();
        let second = compiler::compile(&compiler::parse(&first), &registry).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn compile_keeps_every_leaf(tree in arb_tree()) {
        let registry = OperatorRegistry::new();
        let compiled = compiler::compile(&tree, &registry).unwrap();
        let reparsed = compiler::parse(&compiled);
        prop_assert_eq!(leaf_ids(&reparsed), leaf_ids(&tree));
        prop_assert!(reparsed.has_unique_ids());
    }

    #[test]
    fn compile_emits_normal_form(tree in arb_tree()) {
        let registry = OperatorRegistry::new();
        let compiled = compiler::compile(&tree, &registry).unwrap();
        assert_normal_form(&compiled, LogicalOperator::And)?;
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Semantic round trip
//
// A tree and its compiled form agree on every patient.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn compiled_form_evaluates_like_the_tree(tree in arb_tree(), patient in arb_patient()) {
        let registry = OperatorRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let compiled = compiler::compile(&tree, &registry).unwrap();
        let direct = evaluator.evaluate(&tree, &patient).unwrap();
        let via_compiled = evaluator.evaluate_compiled(&compiled, &patient).unwrap();
        prop_assert_eq!(direct.matched, via_compiled.matched, "tree: {}", DisplayTree::new(&tree));
    }

    #[test]
    fn evaluation_is_deterministic(tree in arb_tree(), patient in arb_patient()) {
        let registry = OperatorRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let first = evaluator.evaluate(&tree, &patient).unwrap();
        let again = evaluator.evaluate(&tree, &patient).unwrap();
        prop_assert_eq!(first.matched, again.matched);
        prop_assert_eq!(first.reason, again.reason);
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Editor consistency
//
// Whatever edits are attempted, every leaf keeps a registry-valid operator
// with exactly the values its arity asks for.
// ---------------------------------------------------------------------------

fn arb_edit() -> impl Strategy<Value = (Index, Operator, Option<i32>, Option<i32>)> {
    (
        any::<Index>(),
        prop::sample::select(Operator::ALL),
        prop::option::of(0_i32..300),
        prop::option::of(0_i32..300),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn edits_preserve_arity(tree in arb_tree(), edits in prop::collection::vec(arb_edit(), 1..12)) {
        let registry = OperatorRegistry::new();
        let mut tree = tree;
        for (index, operator, value, value2) in edits {
            let ids = leaf_ids(&tree);
            if ids.is_empty() {
                break;
            }
            let target = &ids[index.index(ids.len())];
            let mut patch = LeafPatch::new().operator(operator);
            if let Some(v) = value {
                patch = patch.value(v);
            }
            if let Some(v) = value2 {
                patch = patch.value2(v);
            }
            if let Ok(next) = editor::update_node(&tree, target, &patch.into(), &registry) {
                tree = next;
            }
            for leaf in tree.leaves() {
                prop_assert_eq!(leaf.operand.arity(), leaf.operator.arity());
                prop_assert!(registry.is_valid_operator(leaf.domain, leaf.field.as_deref(), leaf.operator));
                prop_assert_eq!(leaf.trend.is_some(), leaf.operator.is_trend());
            }
        }
    }

    #[test]
    fn duplicate_copies_structure_with_fresh_ids(tree in arb_tree(), pick in any::<Index>()) {
        let ids = tree.ids();
        prop_assume!(ids.len() > 1);
        let target = &ids[1 + pick.index(ids.len() - 1)];
        let original = tree.find(target).unwrap().clone();

        let (next, copy_id) = editor::duplicate_node(&tree, target).unwrap();
        let copy = next.find(&copy_id).unwrap();

        prop_assert!(next.has_unique_ids());
        prop_assert_eq!(next.node_count(), tree.node_count() + original.node_count());
        prop_assert_eq!(
            DisplayTree::new(copy).without_ids().to_string(),
            DisplayTree::new(&original).without_ids().to_string()
        );
        prop_assert!(copy.ids().iter().all(|id| !tree.contains(id)));
    }

    #[test]
    fn field_change_resets_the_leaf(
        leaf in arb_leaf().prop_filter("lab leaves only", |l| l.domain == Domain::LabValue),
        new_field in prop::sample::select(LABS),
    ) {
        prop_assume!(leaf.field.as_deref() != Some(new_field));
        let registry = OperatorRegistry::new();
        let id = leaf.id.clone();
        let tree: ConditionNode = Group::new(LogicalOperator::And).with_child(leaf).into();

        let patch = LeafPatch::new().field(new_field);
        let next = editor::update_node(&tree, &id, &patch.into(), &registry).unwrap();
        let reset = next.find(&id).and_then(ConditionNode::as_leaf).unwrap();

        let default = registry.default_operator(Domain::LabValue, Some(new_field)).unwrap();
        prop_assert_eq!(reset.operator, default);
        prop_assert_eq!(&reset.operand, &Operand::Single(None));
        prop_assert_eq!(reset.trend, None);
        prop_assert_eq!(reset.field.as_deref(), Some(new_field));
    }
}
